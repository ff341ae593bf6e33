//! # Fitness Harvester
//!
//! Harvests long-form articles from a fitness content website and writes them
//! out as structured records.
//!
//! ## Usage
//!
//! ```sh
//! fitness_harvester --limit 50 -o data/articles.json
//! ```
//!
//! ## Architecture
//!
//! The run is a single sequential pipeline:
//! 1. **Discovery**: sitemaps, then listing pages, then a local URL list
//! 2. **Fetching**: one request at a time, backing off on 429/403
//! 3. **Extraction**: ordered selector chains for title, author, date and body
//! 4. **Assembly**: quality gate, word count and timestamp per record
//! 5. **Output**: JSON array of records, optional CSV and summary report

use clap::Parser;
use std::error::Error;
use std::process::ExitCode;
use tracing::{debug, error, info, instrument, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod assembler;
mod cli;
mod config;
mod discovery;
mod extractor;
mod fetcher;
mod models;
mod outputs;
mod pipeline;
mod quality;
mod urls;
mod utils;

use cli::Cli;
use config::HarvestConfig;
use fetcher::{Fetcher, ReqwestTransport, RetryPolicy};
use outputs::{csv, json, report};
use pipeline::{Pipeline, RunOutcome};

/// Exit status when discovery found no candidate URLs at all.
const EXIT_NOTHING_TO_SCRAPE: u8 = 2;

#[tokio::main]
#[instrument]
async fn main() -> Result<ExitCode, Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("fitness_harvester starting up");

    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    // ---- Configuration ----
    let base = match &args.config {
        Some(path) => {
            let config = HarvestConfig::from_yaml_file(path)?;
            info!(path = %path.display(), "Loaded configuration file");
            config
        }
        None => HarvestConfig::default(),
    };
    let config = args.apply(base);
    if let Err(e) = config.validate() {
        error!(error = %e, "Invalid configuration");
        return Err(e.into());
    }
    info!(
        base_url = %config.base_url,
        limit = config.limit,
        max_retries = config.max_retries,
        backoff_cap_units = config.backoff_cap_units,
        "Configuration ready"
    );

    // ---- Discover and scrape ----
    let transport = ReqwestTransport::from_config(&config)?;
    let fetcher = Fetcher::new(transport, RetryPolicy::from_config(&config));
    let outcome = Pipeline::new(&fetcher, &config).run().await?;

    let harvest = match outcome {
        RunOutcome::NothingToScrape { state } => {
            let hint = match &config.debug_dir {
                Some(dir) => format!("inspect the saved pages in {}", dir.display()),
                None => "re-run with --debug-dir to save the fetched listing pages".to_string(),
            };
            error!(
                pages_visited = state.visited.len(),
                fallback = %config.fallback_urls_file.display(),
                %hint,
                "No article URLs discovered; nothing to scrape"
            );
            return Ok(ExitCode::from(EXIT_NOTHING_TO_SCRAPE));
        }
        RunOutcome::Completed(harvest) => harvest,
    };
    info!(
        strategy = %harvest.strategy,
        articles = harvest.records.len(),
        pages_visited = harvest.state.visited.len(),
        "Harvest complete"
    );

    // ---- Output ----
    if let Err(e) = json::write_articles(&harvest.records, &config.output_file).await {
        error!(path = %config.output_file.display(), error = %e, "Failed to write article JSON");
        return Err(e);
    }

    if let Some(csv_path) = &config.csv_file {
        if let Err(e) = csv::write_articles_csv(&harvest.records, csv_path).await {
            warn!(path = %csv_path.display(), error = %e, "Failed to write article CSV");
        }
    }

    for line in harvest.metrics.to_string().lines() {
        info!("{line}");
    }
    if let Some(report_path) = &config.report_file {
        if let Err(e) = report::write_report(&harvest.metrics, &config.base_url, report_path).await {
            warn!(path = %report_path.display(), error = %e, "Failed to write summary report");
        }
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Execution complete"
    );

    Ok(ExitCode::SUCCESS)
}
