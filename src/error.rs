use chrono::NaiveDate;
use thiserror::Error;

use crate::model::DocType;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DateParseError {
    #[error("unrecognised date {0:?}")]
    Unrecognised(String),
    #[error("unknown month {0:?}")]
    Month(String),
    #[error("no such calendar day {0:?}")]
    OutOfRange(String),
}

#[derive(Debug, Error)]
pub enum WatermarkError {
    #[error("watermark file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Date(#[from] DateParseError),
}

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("dataset file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("dataset csv: {0}")]
    Csv(#[from] csv::Error),
    #[error("row {row}: bad meeting date {value:?}")]
    MeetingDate { row: usize, value: String },
    #[error("row {row}: unknown document type {value:?}")]
    DocType { row: usize, value: String },
}

/// Why one unit of work (a row or a document slot) produced no record.
#[derive(Debug, Error)]
pub enum SkipReason {
    #[error("meeting row has no usable date: {0}")]
    MeetingDate(String),
    #[error("{kind} for {meeting} is not newer than {cursor}")]
    NotNewer {
        kind: DocType,
        meeting: NaiveDate,
        cursor: NaiveDate,
    },
    #[error("{kind} for {meeting} has no HTML link")]
    NoHtmlLink { kind: DocType, meeting: NaiveDate },
    #[error("{kind} for {meeting}: {source}")]
    Fetch {
        kind: DocType,
        meeting: NaiveDate,
        #[source]
        source: FetchError,
    },
    #[error("{kind} page has no article container")]
    MissingArticle { kind: DocType },
    #[error("minutes for {meeting} carry no release date")]
    MissingReleaseDate { meeting: NaiveDate },
}
