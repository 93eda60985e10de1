//! Web scraper module for the race authority site.
//!
//! Provides browser automation, HTML parsing, and the list/detail fetch
//! operations built on top of them.

pub mod browser;
pub mod discovery;
pub mod parsers;

#[cfg(test)]
pub(crate) mod test_support;

pub use browser::{ChromeLauncher, SessionLauncher};
pub use discovery::{discover_races, fetch_race_detail};

use url::Url;

use crate::error::ScrapeError;

/// Strip separators from a `YYYY-MM-DD` date, giving the `YYYYMMDD` form
/// the site uses inside race URLs.
pub fn compact_date(date: &str) -> String {
    date.chars().filter(|c| *c != '-').collect()
}

/// Resolve a possibly site-relative href against the index page URL.
///
/// Absolute hrefs are returned unchanged (after normalisation); relative
/// ones are joined onto `base`, so `/race/1.html` picks up the site origin.
pub fn resolve_href(base: &str, href: &str) -> Result<String, ScrapeError> {
    let base = Url::parse(base)
        .map_err(|e| ScrapeError::navigation(format!("invalid base url {}: {}", base, e)))?;
    let resolved = base
        .join(href.trim())
        .map_err(|e| ScrapeError::navigation(format!("invalid href {}: {}", href, e)))?;
    Ok(resolved.to_string())
}
