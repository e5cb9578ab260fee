use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocType {
    Statement,
    Minute,
}

impl DocType {
    pub const ALL: [DocType; 2] = [DocType::Statement, DocType::Minute];

    pub fn label(self) -> &'static str {
        match self {
            DocType::Statement => "Statement",
            DocType::Minute => "Minute",
        }
    }

    /// Text that marks this document's slot inside a calendar row.
    pub fn marker(self) -> &'static str {
        match self {
            DocType::Statement => "Statement:",
            DocType::Minute => "Minutes:",
        }
    }
}

impl fmt::Display for DocType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for DocType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Statement" => Ok(DocType::Statement),
            "Minute" => Ok(DocType::Minute),
            other => Err(other.to_string()),
        }
    }
}

/// One document slot of a calendar row, as found on the calendar page.
#[derive(Debug, Clone)]
pub struct DocumentSlot {
    pub kind: DocType,
    /// Absolute URL of the slot's "HTML" link, if it has one.
    pub html_url: Option<String>,
    /// Slot text, one line per text node.
    pub text: String,
}

#[derive(Debug, Clone)]
pub struct Meeting {
    pub date: NaiveDate,
    pub slots: Vec<DocumentSlot>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CommunicationRecord {
    pub meeting_date: NaiveDate,
    /// Always set on freshly scraped records; may be missing on rows loaded from disk.
    pub release_date: Option<NaiveDate>,
    pub doc_type: DocType,
    pub text: String,
}
