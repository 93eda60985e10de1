//! Browser-driven race list discovery and detail extraction.
//!
//! Each call opens its own session and closes it on every path before
//! returning, including navigation failures.

use tracing::{debug, info, warn};

use super::browser::{PageSession, SessionLauncher};
use super::parsers::{RaceDetail, RaceDetailParser, RaceListItem, RaceListParser};
use super::resolve_href;
use crate::config::ScraperConfig;
use crate::error::ScrapeError;

/// Load the index page and return candidate race links for `date`.
///
/// Any failure here is fatal to the caller's request.
pub async fn discover_races(
    launcher: &dyn SessionLauncher,
    config: &ScraperConfig,
    date: &str,
) -> Result<Vec<RaceListItem>, ScrapeError> {
    info!("Discovering races for {} from {}", date, config.index_url);

    let mut session = launcher.open().await?;
    let html = load_index(session.as_mut(), &config.index_url).await;
    session.close().await;
    let html = html?;

    let items = RaceListParser::parse(&html, date, config.list_limit);
    info!("Found {} candidate races for {}", items.len(), date);
    Ok(items)
}

async fn load_index(session: &mut dyn PageSession, url: &str) -> Result<String, ScrapeError> {
    session.navigate(url).await?;
    session.content().await
}

/// Load one race page and extract its name and entrants.
///
/// A failed navigation is tolerated and whatever DOM exists is parsed.
/// Only a launch failure or an unreadable page is an error.
pub async fn fetch_race_detail(
    launcher: &dyn SessionLauncher,
    config: &ScraperConfig,
    href: &str,
) -> Result<RaceDetail, ScrapeError> {
    let url = resolve_href(&config.index_url, href)?;
    debug!("Fetching race detail: {}", url);

    let mut session = launcher.open().await?;
    let html = load_detail(session.as_mut(), &url).await;
    session.close().await;
    let html = html?;

    let detail = RaceDetailParser::parse(&html, &url);
    debug!(
        "Parsed {}: {} ({} horses)",
        url,
        detail.race_name,
        detail.horses.len()
    );
    Ok(detail)
}

async fn load_detail(session: &mut dyn PageSession, url: &str) -> Result<String, ScrapeError> {
    if let Err(e) = session.navigate(url).await {
        warn!("{}; parsing whatever has loaded", e);
    }
    session.content().await
}
