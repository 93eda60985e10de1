//! Builds the per-date response: one list discovery, then a bounded,
//! sequential run of detail fetches.

use chrono::Utc;
use tracing::{info, warn};

use crate::config::ScraperConfig;
use crate::error::ScrapeError;
use crate::scraper::parsers::RaceListItem;
use crate::scraper::{discover_races, fetch_race_detail, resolve_href, SessionLauncher};
use crate::types::{AggregatedResponse, ResultEntry};

/// Discover races for `date` and fetch details for the first
/// `detail_limit` candidates.
///
/// Only list discovery can fail the whole call. Detail failures are
/// recorded on their own entry, so `list` always holds one entry per
/// candidate considered.
pub async fn aggregate(
    launcher: &dyn SessionLauncher,
    config: &ScraperConfig,
    date: &str,
) -> Result<AggregatedResponse, ScrapeError> {
    let candidates = discover_races(launcher, config, date).await?;
    let considered = candidates.len().min(config.detail_limit);

    let mut list = Vec::with_capacity(considered);
    for item in candidates.iter().take(considered) {
        list.push(fetch_entry(launcher, config, item).await);
    }

    let failed = list
        .iter()
        .filter(|entry| matches!(entry, ResultEntry::Failed { .. }))
        .count();
    info!(
        "Aggregated {} of {} candidates for {} ({} failed)",
        list.len(),
        candidates.len(),
        date,
        failed
    );

    Ok(AggregatedResponse {
        date: date.to_string(),
        fetched_at: Utc::now(),
        list,
    })
}

async fn fetch_entry(
    launcher: &dyn SessionLauncher,
    config: &ScraperConfig,
    item: &RaceListItem,
) -> ResultEntry {
    if item.href.is_empty() {
        return ResultEntry::skipped(&item.text);
    }

    let link = match resolve_href(&config.index_url, &item.href) {
        Ok(link) => link,
        Err(e) => {
            warn!("Skipping unresolvable href {}: {}", item.href, e);
            return ResultEntry::Failed {
                link: item.href.clone(),
                source_text: item.text.clone(),
                error: e.to_string(),
            };
        }
    };

    match fetch_race_detail(launcher, config, &link).await {
        Ok(detail) => ResultEntry::Detail {
            link,
            source_text: item.text.clone(),
            detail,
        },
        Err(e) => {
            warn!("Detail fetch failed for {}: {}", link, e);
            ResultEntry::Failed {
                link,
                source_text: item.text.clone(),
                error: e.to_string(),
            }
        }
    }
}
