use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

use crate::error::DateParseError;

static ISO_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{4})-(\d{1,2})-(\d{1,2})(?:[T ].*)?$").unwrap());
static MONTH_FIRST_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z]+)\.?\s+(\d{1,2})(?:st|nd|rd|th)?,?\s+(\d{4})$").unwrap()
});
static DAY_FIRST_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{1,2})\s+([A-Za-z]+)\.?,?\s+(\d{4})$").unwrap());
static YEAR_FIRST_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{4})\s+([A-Za-z]+)\.?\s+(\d{1,2})$").unwrap());
static SLASH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{1,2})/(\d{1,2})/(\d{4})$").unwrap());
static DIGITS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+").unwrap());

const MONTHS: [&str; 12] = [
    "january", "february", "march", "april", "may", "june",
    "july", "august", "september", "october", "november", "december",
];

/// Cursor value used when nothing has been ingested yet.
pub fn sentinel() -> NaiveDate {
    NaiveDate::from_ymd_opt(1900, 1, 1).unwrap_or(NaiveDate::MIN)
}

pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Month number from a full or abbreviated English name ("Sep", "Sept", "September").
pub fn month_from_name(name: &str) -> Option<u32> {
    let lower = name.trim().trim_end_matches('.').to_lowercase();
    if lower.len() < 3 {
        return None;
    }
    MONTHS
        .iter()
        .position(|m| m.starts_with(&lower))
        .map(|i| i as u32 + 1)
}

/// Parse the handful of human date shapes that show up in the calendar, the
/// document pages and our own persisted files.
pub fn parse_date(raw: &str) -> Result<NaiveDate, DateParseError> {
    let s = raw.trim();

    if let Some(c) = ISO_RE.captures(s) {
        return ymd(s, &c[1], &c[2], &c[3]);
    }
    if let Some(c) = MONTH_FIRST_RE.captures(s) {
        return named(s, &c[3], &c[1], &c[2]);
    }
    if let Some(c) = DAY_FIRST_RE.captures(s) {
        return named(s, &c[3], &c[2], &c[1]);
    }
    if let Some(c) = YEAR_FIRST_RE.captures(s) {
        return named(s, &c[1], &c[2], &c[3]);
    }
    if let Some(c) = SLASH_RE.captures(s) {
        return ymd(s, &c[3], &c[1], &c[2]);
    }

    Err(DateParseError::Unrecognised(s.to_string()))
}

/// Combine a panel year with a row's month and day cells.
///
/// The month cell can span two months ("Jan/Feb"); the meeting date belongs to the
/// last one. The day cell can span days ("31-1*"); the last number wins.
pub fn meeting_date(year: &str, month_text: &str, day_text: &str) -> Result<NaiveDate, DateParseError> {
    let month = month_text.rsplit('/').next().unwrap_or(month_text).trim();
    let day = DIGITS_RE
        .find_iter(day_text)
        .last()
        .map(|m| m.as_str())
        .ok_or_else(|| DateParseError::Unrecognised(day_text.trim().to_string()))?;
    let raw = format!("{} {} {}", year.trim(), month, day);
    match YEAR_FIRST_RE.captures(&raw) {
        Some(c) => named(&raw, &c[1], &c[2], &c[3]),
        None => Err(DateParseError::Unrecognised(raw)),
    }
}

fn named(raw: &str, year: &str, month: &str, day: &str) -> Result<NaiveDate, DateParseError> {
    let m = month_from_name(month).ok_or_else(|| DateParseError::Month(month.to_string()))?;
    ymd(raw, year, &m.to_string(), day)
}

fn ymd(raw: &str, year: &str, month: &str, day: &str) -> Result<NaiveDate, DateParseError> {
    let parsed = (year.parse::<i32>(), month.parse::<u32>(), day.parse::<u32>());
    match parsed {
        (Ok(y), Ok(m), Ok(d)) => NaiveDate::from_ymd_opt(y, m, d)
            .ok_or_else(|| DateParseError::OutOfRange(raw.to_string())),
        _ => Err(DateParseError::Unrecognised(raw.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn iso_with_and_without_time() {
        assert_eq!(parse_date("2024-12-18").unwrap(), d(2024, 12, 18));
        assert_eq!(parse_date(" 2024-12-18 00:00:00\n").unwrap(), d(2024, 12, 18));
    }

    #[test]
    fn release_line_shapes() {
        assert_eq!(parse_date("January 3, 2025").unwrap(), d(2025, 1, 3));
        assert_eq!(parse_date("Sept. 20, 2023").unwrap(), d(2023, 9, 20));
        assert_eq!(parse_date("3 January 2025").unwrap(), d(2025, 1, 3));
        assert_eq!(parse_date("1/29/2025").unwrap(), d(2025, 1, 29));
    }

    #[test]
    fn rejects_garbage_and_impossible_days() {
        assert!(matches!(parse_date("not a date"), Err(DateParseError::Unrecognised(_))));
        assert!(matches!(parse_date("2025-02-30"), Err(DateParseError::OutOfRange(_))));
        assert!(matches!(parse_date("Smarch 3, 2025"), Err(DateParseError::Month(_))));
    }

    #[test]
    fn month_names() {
        assert_eq!(month_from_name("Jan"), Some(1));
        assert_eq!(month_from_name("sept"), Some(9));
        assert_eq!(month_from_name("December"), Some(12));
        assert_eq!(month_from_name("Ju"), None);
    }

    #[test]
    fn meeting_date_spanning_months() {
        assert_eq!(meeting_date("2025", "Jan/Feb", "31-1*").unwrap(), d(2025, 2, 1));
        assert_eq!(meeting_date("2024", "December", "17-18").unwrap(), d(2024, 12, 18));
        assert_eq!(meeting_date("2020", "March", "15 (unscheduled)").unwrap(), d(2020, 3, 15));
    }

    #[test]
    fn meeting_date_without_year_fails() {
        assert!(meeting_date("", "Jan", "28-29").is_err());
        assert!(meeting_date("2024", "Jan", "tbd").is_err());
    }

    #[test]
    fn sentinel_is_1900() {
        assert_eq!(format_date(sentinel()), "1900-01-01");
    }
}
