use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use config::{Config, Environment};
use serde::Deserialize;

const BASE_URL: &str = "https://www.federalreserve.gov";
const CALENDAR_PATH: &str = "/monetarypolicy/fomccalendars.htm";
const DATASET_PATH: &str = "communications.csv";
const WATERMARK_PATH: &str = "most-recent-communication-date.txt";
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
(KHTML, like Gecko) Chrome/100.0.4896.127 Safari/537.36";
const TIMEOUT_SECS: i64 = 10;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub base_url: String,
    pub calendar_path: String,
    pub dataset_path: PathBuf,
    pub watermark_path: PathBuf,
    pub user_agent: String,
    pub timeout_secs: u64,
}

impl Settings {
    /// Built-in defaults, overridden by `FOMC_*` environment variables
    /// (e.g. `FOMC_DATASET_PATH=data/communications.csv`).
    pub fn load() -> Result<Self> {
        Config::builder()
            .set_default("base_url", BASE_URL)?
            .set_default("calendar_path", CALENDAR_PATH)?
            .set_default("dataset_path", DATASET_PATH)?
            .set_default("watermark_path", WATERMARK_PATH)?
            .set_default("user_agent", USER_AGENT)?
            .set_default("timeout_secs", TIMEOUT_SECS)?
            .add_source(Environment::with_prefix("FOMC"))
            .build()
            .context("Failed to read settings")?
            .try_deserialize()
            .context("Invalid settings")
    }

    pub fn calendar_url(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), self.calendar_path)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
