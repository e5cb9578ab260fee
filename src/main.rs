mod config;
mod dataset;
mod dates;
mod error;
mod fetch;
mod merge;
mod model;
mod parser;
mod pipeline;
mod watermark;

use std::time::Instant;

use clap::Parser;

/// Fetch new FOMC statements and minutes and append them to the local dataset.
///
/// Paths and endpoints come from `FOMC_*` environment variables
/// (`FOMC_DATASET_PATH`, `FOMC_WATERMARK_PATH`, `FOMC_BASE_URL`, ...).
#[derive(Parser)]
#[command(name = "fomc_scraper", version, about)]
struct Cli {}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let _cli = Cli::parse();

    let settings = config::Settings::load()?;
    let summary = pipeline::run(&settings)?;

    match summary.watermark_after {
        _ if summary.new_records > 0 && !summary.persisted => println!(
            "Fetched {} communications but could not save them; see the log.",
            summary.new_records
        ),
        Some(date) => println!(
            "Added {} communications; newest release {}.",
            summary.new_records,
            dates::format_date(date)
        ),
        None => println!(
            "No new communications since {}.",
            summary
                .watermark_before
                .map(dates::format_date)
                .unwrap_or_else(|| "the last run".into())
        ),
    }

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("Done in {}", format_duration(elapsed));
    }

    Ok(())
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else {
        format!("{}m {}s", secs / 60, secs % 60)
    }
}
