use anyhow::Result;
use chrono::NaiveDate;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, error, info};

use crate::config::Settings;
use crate::dataset::DatasetStore;
use crate::dates;
use crate::fetch::{Fetcher, HttpFetcher};
use crate::merge;
use crate::parser::{FomcLayout, PageLayout};
use crate::watermark::WatermarkStore;

/// What one run did, for the closing log line.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub candidates: usize,
    pub new_records: usize,
    pub skipped: usize,
    pub not_newer: usize,
    pub persisted: bool,
    pub watermark_before: Option<NaiveDate>,
    pub watermark_after: Option<NaiveDate>,
}

/// Wire the real HTTP fetcher and file stores from `settings` and run once.
pub fn run(settings: &Settings) -> Result<RunSummary> {
    let fetcher = HttpFetcher::new(settings)?;
    let layout = FomcLayout::new(&settings.base_url)?;
    let watermark = WatermarkStore::new(&settings.watermark_path);
    let dataset = DatasetStore::new(&settings.dataset_path);

    Ok(run_with(
        &settings.calendar_url(),
        &fetcher,
        &layout,
        &watermark,
        &dataset,
        progress_bar(),
    ))
}

/// One fetch → parse → filter → append → persist cycle. Failures are logged and
/// end the cycle early; nothing here is fatal.
pub fn run_with<F, L>(
    calendar_url: &str,
    fetcher: &F,
    layout: &L,
    watermark: &WatermarkStore,
    dataset: &DatasetStore,
    pb: ProgressBar,
) -> RunSummary
where
    F: Fetcher + ?Sized,
    L: PageLayout + ?Sized,
{
    let cursor = watermark.read();
    info!(
        "Most recent ingested release: {} ({})",
        dates::format_date(cursor),
        watermark.path().display()
    );
    let mut summary = RunSummary {
        watermark_before: Some(cursor),
        ..Default::default()
    };

    info!("Fetching FOMC calendar: {}", calendar_url);
    let html = match fetcher.fetch(calendar_url) {
        Ok(html) => html,
        Err(e) => {
            error!("Error fetching calendar: {}", e);
            return summary;
        }
    };

    let candidates = layout.meetings(&html);
    summary.candidates = candidates.len();
    info!("Calendar rows found: {}", candidates.len());

    pb.set_length(candidates.len() as u64);
    let harvest = merge::harvest(candidates, cursor, fetcher, layout, &pb);
    pb.finish_and_clear();

    summary.new_records = harvest.records.len();
    summary.skipped = harvest.skipped.len();
    summary.not_newer = harvest.not_newer();
    debug!("Cursor after this batch: {}", dates::format_date(harvest.advance(cursor)));

    match dataset.merge_and_persist(&harvest.records, watermark) {
        Ok(Some(report)) => {
            info!("Dataset now holds {} rows ({} from this run)", report.total, report.added);
            summary.persisted = true;
            summary.watermark_after = report.watermark;
        }
        Ok(None) => {}
        Err(e) => error!("Error updating {}: {}", dataset.path().display(), e),
    }

    info!(
        candidates = summary.candidates,
        new = summary.new_records,
        skipped = summary.skipped - summary.not_newer,
        already_ingested = summary.not_newer,
        "Run complete"
    );
    summary
}

fn progress_bar() -> ProgressBar {
    let pb = ProgressBar::new(0);
    if let Ok(style) =
        ProgressStyle::default_bar().template("[{elapsed_precise}] {bar:40} {pos}/{len} {msg}")
    {
        pb.set_style(style.progress_chars("=> "));
    }
    pb
}
