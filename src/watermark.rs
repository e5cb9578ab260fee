use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tracing::{error, info, warn};

use crate::dates;
use crate::error::WatermarkError;

/// A date to persist, either already parsed or as free text.
#[derive(Debug, Clone)]
pub enum DateInput {
    Date(NaiveDate),
    Text(String),
}

impl From<NaiveDate> for DateInput {
    fn from(d: NaiveDate) -> Self {
        DateInput::Date(d)
    }
}

impl From<&str> for DateInput {
    fn from(s: &str) -> Self {
        DateInput::Text(s.to_string())
    }
}

impl From<String> for DateInput {
    fn from(s: String) -> Self {
        DateInput::Text(s)
    }
}

/// Release date of the newest ingested document, kept in a one-line text file.
pub struct WatermarkStore {
    path: PathBuf,
}

impl WatermarkStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Never fails: a missing or unreadable file yields 1900-01-01.
    pub fn read(&self) -> NaiveDate {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!(
                    "File {} not found. Defaulting to earliest possible date.",
                    self.path.display()
                );
                return dates::sentinel();
            }
            Err(e) => {
                error!("Error reading most recent date file {}: {}", self.path.display(), e);
                return dates::sentinel();
            }
        };

        match dates::parse_date(&raw) {
            Ok(date) => date,
            Err(e) => {
                error!("Error reading most recent date file {}: {}", self.path.display(), e);
                dates::sentinel()
            }
        }
    }

    /// Persist as `YYYY-MM-DD`. Failures are logged, never returned.
    pub fn write(&self, date: impl Into<DateInput>) {
        match self.try_write(date.into()) {
            Ok(date) => info!("Watermark advanced to {}", dates::format_date(date)),
            Err(e) => error!("Error writing to {}: {}", self.path.display(), e),
        }
    }

    fn try_write(&self, input: DateInput) -> Result<NaiveDate, WatermarkError> {
        let date = match input {
            DateInput::Date(d) => d,
            DateInput::Text(s) => dates::parse_date(&s)?,
        };
        fs::write(&self.path, dates::format_date(date)).map_err(|source| WatermarkError::Io {
            path: self.path.display().to_string(),
            source,
        })?;
        Ok(date)
    }
}
