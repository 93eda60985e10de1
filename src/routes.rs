//! API route handlers.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::aggregator::aggregate;
use crate::config::AppConfig;
use crate::scraper::SessionLauncher;
use crate::types::{
    AggregatedResponse, EndpointInfo, ErrorResponse, HealthResponse, RaceQuery, UsageResponse,
};

/// Application state shared across handlers.
pub struct AppState {
    pub launcher: Arc<dyn SessionLauncher>,
    pub config: AppConfig,
}

/// Error type for API handlers.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: msg.into(),
        }
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: msg.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorResponse {
            error: self.message,
        });
        (self.status, body).into_response()
    }
}

/// Build the application router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/race", get(race))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Usage descriptor.
pub async fn index() -> Json<UsageResponse> {
    let endpoint = |path: &str, description: &str| EndpointInfo {
        method: "GET".to_string(),
        path: path.to_string(),
        description: description.to_string(),
    };

    Json(UsageResponse {
        name: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        endpoints: vec![
            endpoint("/race?date=YYYY-MM-DD", "Race names and entrants for a date"),
            endpoint("/health", "Liveness check"),
        ],
    })
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Races for a date.
pub async fn race(
    State(state): State<Arc<AppState>>,
    Query(query): Query<RaceQuery>,
) -> Result<Json<AggregatedResponse>, ApiError> {
    let date = match query.date.as_deref().map(str::trim) {
        Some(date) if !date.is_empty() => date.to_string(),
        _ => return Err(ApiError::bad_request("date query parameter is required (YYYY-MM-DD)")),
    };

    let response = aggregate(state.launcher.as_ref(), &state.config.scraper, &date)
        .await
        .map_err(|e| {
            tracing::error!("Race lookup for {} failed: {}", date, e);
            ApiError::internal(e.to_string())
        })?;

    Ok(Json(response))
}
