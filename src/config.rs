//! Configuration for the race scraper.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Scraper configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScraperConfig {
    /// Daily schedule page listing same-day race links
    #[serde(default = "default_index_url")]
    pub index_url: String,
    /// Upper bound for a single navigation, including the network-idle wait
    #[serde(default = "default_navigation_timeout_secs")]
    pub navigation_timeout_secs: u64,
    /// Network counts as idle at or below this many in-flight requests
    #[serde(default = "default_max_inflight_requests")]
    pub max_inflight_requests: usize,
    /// How long the network must stay idle before navigation returns
    #[serde(default = "default_idle_window_ms")]
    pub idle_window_ms: u64,
    /// Maximum candidates returned by list discovery
    #[serde(default = "default_list_limit")]
    pub list_limit: usize,
    /// Maximum detail pages fetched per request
    #[serde(default = "default_detail_limit")]
    pub detail_limit: usize,
    /// Explicit browser executable, skips discovery when set
    #[serde(default)]
    pub chrome_path: Option<String>,
    /// Puppeteer-style cache holding versioned Chrome builds
    #[serde(default = "default_chrome_cache_dir")]
    pub chrome_cache_dir: String,
}

fn default_index_url() -> String {
    "https://www.jra.go.jp/keiba/".to_string()
}

fn default_navigation_timeout_secs() -> u64 {
    30
}

fn default_max_inflight_requests() -> usize {
    2
}

fn default_idle_window_ms() -> u64 {
    500
}

fn default_list_limit() -> usize {
    200
}

fn default_detail_limit() -> usize {
    6
}

fn default_chrome_cache_dir() -> String {
    "/opt/render/.cache/puppeteer/chrome".to_string()
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            index_url: default_index_url(),
            navigation_timeout_secs: default_navigation_timeout_secs(),
            max_inflight_requests: default_max_inflight_requests(),
            idle_window_ms: default_idle_window_ms(),
            list_limit: default_list_limit(),
            detail_limit: default_detail_limit(),
            chrome_path: None,
            chrome_cache_dir: default_chrome_cache_dir(),
        }
    }
}

impl ScraperConfig {
    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_secs(self.navigation_timeout_secs)
    }

    pub fn idle_window(&self) -> Duration {
        Duration::from_millis(self.idle_window_ms)
    }
}

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub scraper: ScraperConfig,
}

impl AppConfig {
    /// Load configuration from environment and config file
    pub fn load() -> anyhow::Result<Self> {
        let config = config::Config::builder()
            // Start with defaults
            .add_source(config::Config::try_from(&AppConfig::default())?)
            // Add config file if exists
            .add_source(config::File::with_name("config").required(false))
            // Override with environment variables (KEIBA_SERVER__PORT, KEIBA_SCRAPER__INDEX_URL, etc.)
            .add_source(
                config::Environment::with_prefix("KEIBA")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(config.try_deserialize()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scraper_defaults() {
        let config = ScraperConfig::default();
        assert_eq!(config.navigation_timeout(), Duration::from_secs(30));
        assert_eq!(config.max_inflight_requests, 2);
        assert_eq!(config.list_limit, 200);
        assert_eq!(config.detail_limit, 6);
        assert!(config.chrome_path.is_none());
    }

    #[test]
    fn test_partial_deserialize_fills_defaults() {
        let config: AppConfig =
            serde_json::from_str(r#"{"scraper": {"detail_limit": 3}}"#).unwrap();
        assert_eq!(config.scraper.detail_limit, 3);
        assert_eq!(config.scraper.list_limit, 200);
        assert_eq!(config.server.port, 8080);
    }
}
