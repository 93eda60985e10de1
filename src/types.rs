//! Request and response types for the race API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::scraper::parsers::RaceDetail;

/// One candidate race in the aggregated response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResultEntry {
    /// Detail page fetched and parsed
    Detail {
        link: String,
        #[serde(rename = "sourceText")]
        source_text: String,
        detail: RaceDetail,
    },
    /// Detail fetch failed; siblings are unaffected
    Failed {
        link: String,
        #[serde(rename = "sourceText")]
        source_text: String,
        error: String,
    },
    /// Candidate had no href, nothing was fetched
    Skipped {
        #[serde(rename = "sourceText")]
        source_text: String,
        note: String,
    },
}

impl ResultEntry {
    pub const NO_HREF_NOTE: &'static str = "no href found";

    pub fn skipped(source_text: impl Into<String>) -> Self {
        Self::Skipped {
            source_text: source_text.into(),
            note: Self::NO_HREF_NOTE.to_string(),
        }
    }

    pub fn source_text(&self) -> &str {
        match self {
            Self::Detail { source_text, .. }
            | Self::Failed { source_text, .. }
            | Self::Skipped { source_text, .. } => source_text,
        }
    }
}

/// Response for `GET /race`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedResponse {
    pub date: String,
    pub fetched_at: DateTime<Utc>,
    pub list: Vec<ResultEntry>,
}

/// Query string for `GET /race`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RaceQuery {
    pub date: Option<String>,
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Usage descriptor served at `/`
#[derive(Debug, Serialize, Deserialize)]
pub struct UsageResponse {
    pub name: String,
    pub version: String,
    pub endpoints: Vec<EndpointInfo>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EndpointInfo {
    pub method: String,
    pub path: String,
    pub description: String,
}

/// Error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
