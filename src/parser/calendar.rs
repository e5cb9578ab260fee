use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::warn;

use super::{lines_of, text_of};
use crate::dates;
use crate::error::SkipReason;
use crate::model::{DocType, DocumentSlot, Meeting};

static PANEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("div.panel.panel-default").unwrap());
static PANEL_HEADING: LazyLock<Selector> = LazyLock::new(|| Selector::parse("div.panel-heading").unwrap());
static ROW: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"div[class*="row fomc-meeting"]"#).unwrap());
static MONTH: LazyLock<Selector> = LazyLock::new(|| Selector::parse("div.fomc-meeting__month").unwrap());
static DAY: LazyLock<Selector> = LazyLock::new(|| Selector::parse("div.fomc-meeting__date").unwrap());
static DIV: LazyLock<Selector> = LazyLock::new(|| Selector::parse("div").unwrap());
static ANCHOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a").unwrap());

static YEAR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d{4}").unwrap());

/// Walk every year panel and meeting row of the calendar page.
///
/// `resolve` turns a link's `href` into an absolute URL.
pub fn meetings<F>(html: &str, resolve: F) -> Vec<Result<Meeting, SkipReason>>
where
    F: Fn(&str) -> Option<String>,
{
    let doc = Html::parse_document(html);
    let mut out = Vec::new();

    for panel in doc.select(&PANEL) {
        let year = panel_year(panel);
        if year.is_none() {
            warn!("Calendar panel without a year heading");
        }
        for row in panel.select(&ROW) {
            out.push(meeting(row, year.as_deref().unwrap_or(""), &resolve));
        }
    }

    out
}

fn panel_year(panel: ElementRef) -> Option<String> {
    let heading = panel.select(&PANEL_HEADING).next()?;
    let text = text_of(heading);
    YEAR_RE.find_iter(&text).last().map(|m| m.as_str().to_string())
}

fn meeting<F>(row: ElementRef, year: &str, resolve: &F) -> Result<Meeting, SkipReason>
where
    F: Fn(&str) -> Option<String>,
{
    let month = cell(row, &MONTH, "month")?;
    let day = cell(row, &DAY, "date")?;
    let date = dates::meeting_date(year, &month, &day)
        .map_err(|e| SkipReason::MeetingDate(e.to_string()))?;

    let slots = DocType::ALL
        .iter()
        .filter_map(|&kind| slot(row, kind, resolve))
        .collect();

    Ok(Meeting { date, slots })
}

fn cell(row: ElementRef, sel: &Selector, what: &str) -> Result<String, SkipReason> {
    row.select(sel)
        .next()
        .map(text_of)
        .ok_or_else(|| SkipReason::MeetingDate(format!("row has no {} cell", what)))
}

fn slot<F>(row: ElementRef, kind: DocType, resolve: &F) -> Option<DocumentSlot>
where
    F: Fn(&str) -> Option<String>,
{
    let container = slot_container(row, kind.marker())?;
    let html_url = container
        .select(&ANCHOR)
        .find(|a| text_of(*a) == "HTML")
        .and_then(|a| a.value().attr("href"))
        .and_then(resolve);

    Some(DocumentSlot {
        kind,
        html_url,
        text: lines_of(container),
    })
}

/// Innermost `div` under `row` whose text carries `marker`.
fn slot_container<'a>(row: ElementRef<'a>, marker: &str) -> Option<ElementRef<'a>> {
    row.select(&DIV)
        .filter(|div| text_of(*div).contains(marker))
        .find(|div| !div.select(&DIV).any(|inner| text_of(inner).contains(marker)))
}
