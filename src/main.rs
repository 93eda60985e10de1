//! Keiba race scraper API
//!
//! Scrapes same-day race names and entrants from the race authority site
//! with a headless browser and serves them as JSON keyed by date.

mod aggregator;
mod cli;
mod config;
mod error;
mod routes;
mod scraper;
mod types;

use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;

use crate::cli::{Cli, Commands};
use crate::config::AppConfig;
use crate::routes::AppState;
use crate::scraper::ChromeLauncher;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { host, port } => run_server(host, port).await,
        Commands::Fetch { date, format } => cli::run_fetch(date, format).await,
    }
}

/// Run the API server.
async fn run_server(host: Option<String>, port: Option<u16>) -> anyhow::Result<()> {
    // Initialize logging
    cli::init_tracing(cli::SERVE_LOG_FILTER);

    // Load configuration
    let mut config = AppConfig::load()?;

    // Override with CLI args
    if let Some(h) = host {
        config.server.host = h;
    }
    if let Some(p) = port {
        config.server.port = p;
    }

    tracing::info!("Configuration loaded");
    tracing::info!("Index page: {}", config.scraper.index_url);
    tracing::info!(
        "Limits: {} candidates, {} detail fetches, {}s navigation timeout",
        config.scraper.list_limit,
        config.scraper.detail_limit,
        config.scraper.navigation_timeout_secs
    );

    // Browsers are launched per operation, never shared
    let launcher = ChromeLauncher::new(config.scraper.clone());

    let state = Arc::new(AppState {
        launcher: Arc::new(launcher),
        config: config.clone(),
    });

    let app = routes::router(state);

    // Start server
    let addr = SocketAddr::new(config.server.host.parse()?, config.server.port);
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
