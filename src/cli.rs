//! CLI commands for keiba-scraper.
//!
//! Supports API server mode and one-shot fetches from the terminal.

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::aggregator::aggregate;
use crate::config::AppConfig;
use crate::scraper::ChromeLauncher;
use crate::types::{AggregatedResponse, ResultEntry};

#[derive(Parser)]
#[command(name = "keiba-scraper")]
#[command(version, about = "Same-day race names and entrants as JSON", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the API server
    Serve {
        /// Host to bind to (overrides config)
        #[arg(short = 'H', long)]
        host: Option<String>,

        /// Port to bind to (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Fetch races for a date and print them
    Fetch {
        /// Race date (YYYY-MM-DD)
        #[arg(value_name = "DATE")]
        date: String,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
}

/// Default log filter for `serve`
pub const SERVE_LOG_FILTER: &str = "keiba_scraper=debug,tower_http=debug";

/// Default log filter for `fetch`
pub const FETCH_LOG_FILTER: &str = "keiba_scraper=info";

/// Install the tracing subscriber. `RUST_LOG` overrides `default_filter`.
/// Logs go to stderr so `fetch` output on stdout stays parseable.
pub fn init_tracing(default_filter: &str) {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Run a single aggregation and print the result.
pub async fn run_fetch(date: String, format: OutputFormat) -> anyhow::Result<()> {
    init_tracing(FETCH_LOG_FILTER);

    let config = AppConfig::load()?;
    let launcher = ChromeLauncher::new(config.scraper.clone());

    eprintln!("Fetching races for {} from {}", date, config.scraper.index_url);
    let response = aggregate(&launcher, &config.scraper, &date).await?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&response)?),
        OutputFormat::Table => print!("{}", render_table(&response)),
    }
    Ok(())
}

fn render_table(response: &AggregatedResponse) -> String {
    let mut out = format!(
        "Races for {} (fetched {})\n",
        response.date,
        response.fetched_at.format("%Y-%m-%d %H:%M:%S UTC")
    );

    for entry in &response.list {
        out.push_str(&format!("\n== {}\n", entry.source_text()));
        match entry {
            ResultEntry::Detail { link, detail, .. } => {
                out.push_str(&format!("   {}\n   {}\n", detail.race_name, link));
                for horse in &detail.horses {
                    out.push_str(&format!(
                        "   {:>3}  {:<24} {}\n",
                        horse.num, horse.name, horse.jockey
                    ));
                }
            }
            ResultEntry::Failed { link, error, .. } => {
                out.push_str(&format!("   {}\n   error: {}\n", link, error));
            }
            ResultEntry::Skipped { note, .. } => {
                out.push_str(&format!("   ({})\n", note));
            }
        }
    }

    out
}
