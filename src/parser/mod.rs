pub mod calendar;
pub mod document;

use anyhow::Context;
use chrono::NaiveDate;
use reqwest::Url;
use scraper::ElementRef;

use crate::error::SkipReason;
use crate::model::{DocType, Meeting};

/// Site-specific knowledge of where things live on the calendar and document pages.
/// The merge engine only sees the structured values this returns.
pub trait PageLayout {
    /// Every meeting row on the calendar page, or why a row could not be read.
    fn meetings(&self, calendar_html: &str) -> Vec<Result<Meeting, SkipReason>>;

    /// Body text of a statement or minutes page.
    fn document_text(&self, document_html: &str, kind: DocType) -> Result<String, SkipReason>;

    /// Release date of a minutes document, from its calendar slot or its own page.
    fn minutes_release_date(&self, slot_text: &str, document_html: &str) -> Option<NaiveDate>;
}

/// Layout of federalreserve.gov's FOMC calendar and its linked documents.
pub struct FomcLayout {
    base: Url,
}

impl FomcLayout {
    pub fn new(base_url: &str) -> anyhow::Result<Self> {
        let base = Url::parse(base_url)
            .with_context(|| format!("Invalid base URL {:?}", base_url))?;
        Ok(Self { base })
    }

    fn resolve(&self, href: &str) -> Option<String> {
        self.base.join(href).ok().map(String::from)
    }
}

impl PageLayout for FomcLayout {
    fn meetings(&self, calendar_html: &str) -> Vec<Result<Meeting, SkipReason>> {
        calendar::meetings(calendar_html, |href| self.resolve(href))
    }

    fn document_text(&self, document_html: &str, kind: DocType) -> Result<String, SkipReason> {
        document::body_text(document_html, kind)
    }

    fn minutes_release_date(&self, slot_text: &str, document_html: &str) -> Option<NaiveDate> {
        document::release_date(slot_text)
            .or_else(|| document::release_date(&document::line_text(document_html)))
    }
}

/// Concatenated text of an element, as a browser would show it unstyled.
fn text_of(el: ElementRef) -> String {
    el.text().collect()
}

/// Text of an element with each text node on its own line.
fn lines_of(el: ElementRef) -> String {
    el.text().collect::<Vec<_>>().join("\n")
}
