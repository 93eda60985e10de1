//! Race list parser for the daily schedule (index) page.
//!
//! Selects same-day race links. The site has changed its date encoding
//! before, so an exact date match that finds nothing degrades to a
//! keyword match that ignores the date entirely.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::scraper::compact_date;

static ANCHOR_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("a").unwrap());

/// Schedule, meeting and race-number markers (出馬表, 開催, レース, "11R").
static RACE_KEYWORD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"出馬表|開催|レース|\d{1,2}\s*R(?:[^A-Za-z0-9]|$)").unwrap());

/// Candidate race link from the index page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RaceListItem {
    /// Visible anchor label
    pub text: String,
    /// Raw href attribute, relative or absolute, possibly empty
    pub href: String,
}

/// Parser for the index page
pub struct RaceListParser;

impl RaceListParser {
    /// Parse the index page and return candidate race links for `date`
    /// (`YYYY-MM-DD`) in document order, at most `limit` of them.
    pub fn parse(html: &str, date: &str, limit: usize) -> Vec<RaceListItem> {
        let document = Html::parse_document(html);

        let mut items = Self::match_by_date(&document, date);
        if items.is_empty() {
            debug!("No anchors matched date {}, falling back to keywords", date);
            items = Self::match_by_keyword(&document);
        }

        items.truncate(limit);
        items
    }

    /// Anchors whose href carries `YYYYMMDD` or whose text carries the
    /// literal date.
    fn match_by_date(document: &Html, date: &str) -> Vec<RaceListItem> {
        let compact = compact_date(date);

        Self::collect(document, |item| {
            (!compact.is_empty() && item.href.contains(&compact))
                || (!date.is_empty() && item.text.contains(date))
        })
    }

    fn match_by_keyword(document: &Html) -> Vec<RaceListItem> {
        Self::collect(document, |item| RACE_KEYWORD_RE.is_match(&item.text))
    }

    fn collect<F>(document: &Html, mut keep: F) -> Vec<RaceListItem>
    where
        F: FnMut(&RaceListItem) -> bool,
    {
        document
            .select(&ANCHOR_SELECTOR)
            .map(Self::to_item)
            .filter(|item| !item.text.is_empty() || !item.href.is_empty())
            .filter(|item| keep(item))
            .collect()
    }

    fn to_item(anchor: ElementRef) -> RaceListItem {
        RaceListItem {
            text: normalize_text(&anchor.text().collect::<String>()),
            href: anchor.value().attr("href").unwrap_or_default().trim().to_string(),
        }
    }
}

/// Collapse runs of whitespace, as a browser does for rendered text.
pub(crate) fn normalize_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
