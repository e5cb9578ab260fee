use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{info, warn};

use crate::dates;
use crate::error::DatasetError;
use crate::merge::batch_watermark;
use crate::model::{CommunicationRecord, DocType};
use crate::watermark::WatermarkStore;

/// On-disk shape of one row. Field order is the column order:
/// `Date,Release Date,Type,Text`.
#[derive(Debug, Serialize, Deserialize)]
struct CsvRow {
    #[serde(rename = "Date")]
    date: String,
    #[serde(rename = "Release Date")]
    release_date: String,
    #[serde(rename = "Type")]
    doc_type: String,
    #[serde(rename = "Text")]
    text: String,
}

impl From<&CommunicationRecord> for CsvRow {
    fn from(r: &CommunicationRecord) -> Self {
        CsvRow {
            date: dates::format_date(r.meeting_date),
            release_date: r.release_date.map(dates::format_date).unwrap_or_default(),
            doc_type: r.doc_type.to_string(),
            text: r.text.clone(),
        }
    }
}

impl CsvRow {
    /// `row` is the 1-based data row, for error messages.
    fn into_record(self, row: usize) -> Result<CommunicationRecord, DatasetError> {
        let meeting_date = dates::parse_date(&self.date).map_err(|_| DatasetError::MeetingDate {
            row,
            value: self.date.clone(),
        })?;
        let doc_type = self.doc_type.parse::<DocType>().map_err(|value| DatasetError::DocType { row, value })?;
        // Unreadable release dates become missing rather than failing the load.
        let release_date = dates::parse_date(&self.release_date).ok();
        Ok(CommunicationRecord {
            meeting_date,
            release_date,
            doc_type,
            text: self.text,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeReport {
    pub added: usize,
    pub total: usize,
    pub watermark: Option<chrono::NaiveDate>,
}

/// The full table of ingested communications, kept as one CSV file.
pub struct DatasetStore {
    path: PathBuf,
}

impl DatasetStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Every persisted record; an absent file is an empty dataset.
    pub fn load(&self) -> Result<Vec<CommunicationRecord>, DatasetError> {
        let file = match fs::File::open(&self.path) {
            Ok(f) => f,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => return Err(self.io_err(source)),
        };

        let mut reader = csv::Reader::from_reader(file);
        reader
            .deserialize::<CsvRow>()
            .enumerate()
            .map(|(i, row)| row?.into_record(i + 1))
            .collect()
    }

    /// Put `new` ahead of the stored rows, sort by meeting date (newest first),
    /// drop exact duplicates and rewrite the file. The watermark is then moved to
    /// the latest release date in `new`.
    ///
    /// An empty batch touches nothing and returns `None`.
    pub fn merge_and_persist(
        &self,
        new: &[CommunicationRecord],
        watermark: &WatermarkStore,
    ) -> Result<Option<MergeReport>, DatasetError> {
        if new.is_empty() {
            info!("No new communications; {} left untouched", self.path.display());
            return Ok(None);
        }

        let existing = self.load()?;
        let merged = merge(new, existing);
        self.save(&merged)?;
        info!(
            "Saved {} communications ({} new) to {}",
            merged.len(),
            new.len(),
            self.path.display()
        );

        let latest = batch_watermark(new);
        match latest {
            Some(date) => watermark.write(date),
            None => warn!("New batch has no release dates; watermark unchanged"),
        }

        Ok(Some(MergeReport {
            added: new.len(),
            total: merged.len(),
            watermark: latest,
        }))
    }

    fn save(&self, records: &[CommunicationRecord]) -> Result<(), DatasetError> {
        replace_file(&self.path, |tmp| {
            let mut writer = csv::Writer::from_writer(tmp);
            for record in records {
                writer.serialize(CsvRow::from(record))?;
            }
            writer.flush().map_err(|e| io_err(&self.path, e))
        })
    }

    fn io_err(&self, source: std::io::Error) -> DatasetError {
        io_err(&self.path, source)
    }
}

fn io_err(path: &Path, source: std::io::Error) -> DatasetError {
    DatasetError::Io {
        path: path.display().to_string(),
        source,
    }
}

/// Write through a temp file in the same directory and rename it over `path`.
/// If `write` fails the temp file is removed and `path` keeps its old contents.
fn replace_file<F>(path: &Path, write: F) -> Result<(), DatasetError>
where
    F: FnOnce(&mut NamedTempFile) -> Result<(), DatasetError>,
{
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).map_err(|e| io_err(path, e))?;

    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| io_err(path, e))?;
    write(&mut tmp)?;
    tmp.as_file().sync_all().map_err(|e| io_err(path, e))?;
    tmp.persist(path).map_err(|e| io_err(path, e.error))?;
    Ok(())
}

/// New rows first, then stable sort newest-meeting-first and keep the first of
/// each identical row.
fn merge(new: &[CommunicationRecord], existing: Vec<CommunicationRecord>) -> Vec<CommunicationRecord> {
    let mut all: Vec<CommunicationRecord> = new.iter().cloned().chain(existing).collect();
    all.sort_by(|a, b| b.meeting_date.cmp(&a.meeting_date));
    all.into_iter().unique().collect()
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use chrono::NaiveDate;

    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn rec(meeting: NaiveDate, release: NaiveDate, kind: DocType, text: &str) -> CommunicationRecord {
        CommunicationRecord {
            meeting_date: meeting,
            release_date: Some(release),
            doc_type: kind,
            text: text.to_string(),
        }
    }

    struct Stores {
        _dir: tempfile::TempDir,
        dataset: DatasetStore,
        watermark: WatermarkStore,
    }

    fn stores() -> Stores {
        let dir = tempfile::tempdir().unwrap();
        Stores {
            dataset: DatasetStore::new(dir.path().join("communications.csv")),
            watermark: WatermarkStore::new(dir.path().join("most-recent-communication-date.txt")),
            _dir: dir,
        }
    }

    #[test]
    fn empty_batch_writes_nothing() {
        let s = stores();
        let report = s.dataset.merge_and_persist(&[], &s.watermark).unwrap();
        assert!(report.is_none());
        assert!(!s.dataset.path().exists());
        assert!(!s.watermark.path().exists());
    }

    #[test]
    fn first_run_creates_file_with_fixed_columns() {
        let s = stores();
        let batch = vec![rec(d(2024, 12, 18), d(2024, 12, 18), DocType::Statement, "text A")];
        s.dataset.merge_and_persist(&batch, &s.watermark).unwrap();

        let raw = fs::read_to_string(s.dataset.path()).unwrap();
        assert_eq!(raw.lines().next(), Some("Date,Release Date,Type,Text"));
        assert_eq!(raw.lines().nth(1), Some("2024-12-18,2024-12-18,Statement,text A"));
        assert_eq!(s.dataset.load().unwrap(), batch);
    }

    #[test]
    fn identical_row_is_kept_once() {
        let s = stores();
        let row = rec(d(2024, 12, 18), d(2024, 12, 18), DocType::Statement, "text A");
        s.dataset.merge_and_persist(&[row.clone()], &s.watermark).unwrap();
        let report = s.dataset.merge_and_persist(&[row.clone()], &s.watermark).unwrap().unwrap();

        assert_eq!(report.total, 1);
        assert_eq!(s.dataset.load().unwrap(), vec![row]);
    }

    #[test]
    fn sorted_newest_meeting_first() {
        let s = stores();
        s.dataset
            .merge_and_persist(
                &[rec(d(2024, 11, 7), d(2024, 11, 7), DocType::Statement, "nov")],
                &s.watermark,
            )
            .unwrap();
        s.dataset
            .merge_and_persist(
                &[
                    rec(d(2024, 9, 18), d(2024, 10, 9), DocType::Minute, "sep minutes"),
                    rec(d(2025, 1, 29), d(2025, 1, 29), DocType::Statement, "jan"),
                ],
                &s.watermark,
            )
            .unwrap();

        let dates: Vec<NaiveDate> = s.dataset.load().unwrap().iter().map(|r| r.meeting_date).collect();
        assert_eq!(dates, vec![d(2025, 1, 29), d(2024, 11, 7), d(2024, 9, 18)]);
    }

    #[test]
    fn watermark_is_batch_max_not_dataset_max() {
        let s = stores();
        s.dataset
            .merge_and_persist(
                &[rec(d(2025, 1, 29), d(2025, 1, 29), DocType::Statement, "jan")],
                &s.watermark,
            )
            .unwrap();

        let batch = vec![
            rec(d(2024, 11, 7), d(2024, 11, 7), DocType::Statement, "nov"),
            rec(d(2024, 12, 18), d(2024, 12, 18), DocType::Statement, "dec"),
        ];
        let report = s.dataset.merge_and_persist(&batch, &s.watermark).unwrap().unwrap();

        assert_eq!(report.watermark, Some(d(2024, 12, 18)));
        assert_eq!(fs::read_to_string(s.watermark.path()).unwrap(), "2024-12-18");
        assert_eq!(report.total, 3);
    }

    #[test]
    fn unreadable_release_date_becomes_missing() {
        let s = stores();
        fs::write(
            s.dataset.path(),
            "Date,Release Date,Type,Text\n2024-09-18,soon,Minute,\"multi\nline, quoted\"\n",
        )
        .unwrap();

        let loaded = s.dataset.load().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].release_date, None);
        assert_eq!(loaded[0].text, "multi\nline, quoted");

        s.dataset
            .merge_and_persist(
                &[rec(d(2024, 11, 7), d(2024, 11, 7), DocType::Statement, "nov")],
                &s.watermark,
            )
            .unwrap();
        let raw = fs::read_to_string(s.dataset.path()).unwrap();
        assert!(raw.contains("2024-09-18,,Minute,"));
    }

    #[test]
    fn bad_meeting_date_fails_the_load() {
        let s = stores();
        fs::write(s.dataset.path(), "Date,Release Date,Type,Text\nsomeday,,Minute,x\n").unwrap();
        assert!(matches!(
            s.dataset.load(),
            Err(DatasetError::MeetingDate { row: 1, .. })
        ));
    }

    #[test]
    fn failed_write_leaves_watermark_alone() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "not a directory").unwrap();
        let dataset = DatasetStore::new(blocker.join("communications.csv"));
        let watermark = WatermarkStore::new(dir.path().join("date.txt"));

        let batch = vec![rec(d(2024, 12, 18), d(2024, 12, 18), DocType::Statement, "dec")];
        assert!(dataset.merge_and_persist(&batch, &watermark).is_err());
        assert!(!watermark.path().exists());
    }

    #[test]
    fn interrupted_rewrite_keeps_previous_file() {
        let s = stores();
        s.dataset
            .merge_and_persist(
                &[rec(d(2024, 12, 18), d(2024, 12, 18), DocType::Statement, "dec")],
                &s.watermark,
            )
            .unwrap();
        let before = fs::read(s.dataset.path()).unwrap();

        let path = s.dataset.path();
        let result = replace_file(path, |tmp| {
            tmp.write_all(b"Date,Release Date,Type,Text\n2025-01-29,")
                .map_err(|e| io_err(path, e))?;
            Err(io_err(path, std::io::Error::other("disk full")))
        });

        assert!(matches!(result, Err(DatasetError::Io { .. })));
        assert_eq!(fs::read(path).unwrap(), before);
        // Only the dataset and the watermark; the partial temp file is gone.
        let dir = path.parent().unwrap();
        assert_eq!(fs::read_dir(dir).unwrap().count(), 2);
    }

    #[test]
    fn rewrite_leaves_no_temp_files() {
        let s = stores();
        for text in ["one", "two"] {
            s.dataset
                .merge_and_persist(
                    &[rec(d(2024, 12, 18), d(2024, 12, 18), DocType::Statement, text)],
                    &s.watermark,
                )
                .unwrap();
        }

        let names: Vec<String> = fs::read_dir(s.dataset.path().parent().unwrap())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .sorted()
            .collect();
        assert_eq!(names, ["communications.csv", "most-recent-communication-date.txt"]);
        assert_eq!(s.dataset.load().unwrap().len(), 2);
    }
}
