use std::sync::LazyLock;

use chrono::NaiveDate;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use super::{lines_of, text_of};
use crate::dates;
use crate::error::SkipReason;
use crate::model::DocType;

static ARTICLE: LazyLock<Selector> = LazyLock::new(|| Selector::parse("div#article").unwrap());

const RELEASED: &str = "(Released";

/// Statements keep their text in the third `div` directly under the article;
/// minutes use the whole article.
pub fn body_text(html: &str, kind: DocType) -> Result<String, SkipReason> {
    let doc = Html::parse_document(html);
    let article = doc
        .select(&ARTICLE)
        .next()
        .ok_or(SkipReason::MissingArticle { kind })?;

    let container = match kind {
        DocType::Statement => article
            .children()
            .filter_map(ElementRef::wrap)
            .filter(|el| el.value().name() == "div")
            .nth(2)
            .ok_or(SkipReason::MissingArticle { kind })?,
        DocType::Minute => article,
    };

    Ok(text_of(container).trim().to_string())
}

/// Page text with one line per text node, for line-oriented marker searches.
pub fn line_text(html: &str) -> String {
    let doc = Html::parse_document(html);
    match doc.select(&ARTICLE).next() {
        Some(article) => lines_of(article),
        None => lines_of(doc.root_element()),
    }
}

/// Date from the first line starting with "(Released", e.g. "(Released January 3, 2025)".
pub fn release_date(text: &str) -> Option<NaiveDate> {
    let line = text
        .lines()
        .map(str::trim)
        .find(|l| l.starts_with(RELEASED))?;
    let raw = line[RELEASED.len()..].replace(')', "");
    match dates::parse_date(&raw) {
        Ok(date) => Some(date),
        Err(e) => {
            debug!("Release marker {:?} did not parse: {}", line, e);
            None
        }
    }
}
