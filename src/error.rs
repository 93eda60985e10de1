//! Error types for the scraping pipeline.

use thiserror::Error;

/// Failures raised while driving the headless browser.
///
/// Both kinds carry a descriptive message only; callers never branch on a
/// code, they either abort the request or record the message on an entry.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ScrapeError {
    /// The browser process could not be found or started.
    #[error("failed to launch browser: {0}")]
    Launch(String),

    /// Navigation timed out or the page could not be loaded or read.
    #[error("navigation failed: {0}")]
    Navigation(String),
}

impl ScrapeError {
    pub fn launch(msg: impl Into<String>) -> Self {
        Self::Launch(msg.into())
    }

    pub fn navigation(msg: impl Into<String>) -> Self {
        Self::Navigation(msg.into())
    }
}
