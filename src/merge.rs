use chrono::NaiveDate;
use indicatif::ProgressBar;
use tracing::{debug, warn};

use crate::error::SkipReason;
use crate::fetch::Fetcher;
use crate::model::{CommunicationRecord, DocType, DocumentSlot, Meeting};
use crate::parser::PageLayout;

/// Outcome of one pass over the calendar.
#[derive(Debug, Default)]
pub struct Harvest {
    pub records: Vec<CommunicationRecord>,
    pub skipped: Vec<SkipReason>,
}

impl Harvest {
    /// Cursor after this batch: the latest release date among its records,
    /// or `cursor` unchanged when nothing was ingested.
    pub fn advance(&self, cursor: NaiveDate) -> NaiveDate {
        batch_watermark(&self.records).unwrap_or(cursor)
    }

    /// Slots rejected by the cursor, as opposed to ones that failed.
    pub fn not_newer(&self) -> usize {
        self.skipped
            .iter()
            .filter(|s| matches!(s, SkipReason::NotNewer { .. }))
            .count()
    }
}

/// Latest release date among `records`.
pub fn batch_watermark(records: &[CommunicationRecord]) -> Option<NaiveDate> {
    records.iter().filter_map(|r| r.release_date).max()
}

/// Turn calendar candidates into new records.
///
/// Only slots whose meeting is strictly after `cursor` are fetched. Every other
/// failure is confined to its row or slot and recorded in `Harvest::skipped`.
pub fn harvest<F, L>(
    candidates: Vec<Result<Meeting, SkipReason>>,
    cursor: NaiveDate,
    fetcher: &F,
    layout: &L,
    pb: &ProgressBar,
) -> Harvest
where
    F: Fetcher + ?Sized,
    L: PageLayout + ?Sized,
{
    let mut out = Harvest::default();

    for candidate in candidates {
        pb.inc(1);
        let meeting = match candidate {
            Ok(m) => m,
            Err(reason) => {
                warn!("Skipping calendar row: {}", reason);
                out.skipped.push(reason);
                continue;
            }
        };

        for slot in &meeting.slots {
            if meeting.date <= cursor {
                let reason = SkipReason::NotNewer {
                    kind: slot.kind,
                    meeting: meeting.date,
                    cursor,
                };
                debug!("{}", reason);
                out.skipped.push(reason);
                continue;
            }

            pb.set_message(format!("{} {}", slot.kind, meeting.date));
            match ingest(&meeting, slot, fetcher, layout) {
                Ok(record) => out.records.push(record),
                Err(reason) => {
                    warn!("Skipping document: {}", reason);
                    out.skipped.push(reason);
                }
            }
        }
    }

    out
}

fn ingest<F, L>(
    meeting: &Meeting,
    slot: &DocumentSlot,
    fetcher: &F,
    layout: &L,
) -> Result<CommunicationRecord, SkipReason>
where
    F: Fetcher + ?Sized,
    L: PageLayout + ?Sized,
{
    let url = slot.html_url.as_deref().ok_or(SkipReason::NoHtmlLink {
        kind: slot.kind,
        meeting: meeting.date,
    })?;

    let page = fetcher.fetch(url).map_err(|source| SkipReason::Fetch {
        kind: slot.kind,
        meeting: meeting.date,
        source,
    })?;

    let text = layout.document_text(&page, slot.kind)?;

    let release_date = match slot.kind {
        DocType::Statement => meeting.date,
        DocType::Minute => layout
            .minutes_release_date(&slot.text, &page)
            .ok_or(SkipReason::MissingReleaseDate {
                meeting: meeting.date,
            })?,
    };

    Ok(CommunicationRecord {
        meeting_date: meeting.date,
        release_date: Some(release_date),
        doc_type: slot.kind,
        text,
    })
}
