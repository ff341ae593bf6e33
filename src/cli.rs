//! Command-line interface definitions.
//!
//! Every flag can also be given through an environment variable. Flags that
//! are present override the YAML config file, which overrides the defaults.

use crate::config::HarvestConfig;
use clap::Parser;
use std::path::PathBuf;

/// Command-line arguments for the harvester.
///
/// # Examples
///
/// ```sh
/// # Defaults: scrape 20 articles into data/articles.json
/// fitness_harvester
///
/// # Bigger run with saved listing pages and a report
/// fitness_harvester --limit 100 --debug-dir data/debug --report data/summary_report.txt
///
/// # Settings from a file, one flag overriding it
/// fitness_harvester --config harvest.yaml --max-retries 5
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Optional path to a YAML config file
    #[arg(short, long, env = "HARVEST_CONFIG")]
    pub config: Option<PathBuf>,

    /// Site root to harvest from
    #[arg(short, long, env = "HARVEST_BASE_URL")]
    pub base_url: Option<String>,

    /// Maximum number of articles to scrape
    #[arg(short, long, env = "HARVEST_LIMIT")]
    pub limit: Option<usize>,

    /// Where to write the article JSON array
    #[arg(short, long, env = "HARVEST_OUTPUT")]
    pub output: Option<PathBuf>,

    /// Also write the records as CSV here
    #[arg(long, env = "HARVEST_CSV")]
    pub csv: Option<PathBuf>,

    /// Where to write the plain-text summary report
    #[arg(long, env = "HARVEST_REPORT")]
    pub report: Option<PathBuf>,

    /// Local list of article URLs used when discovery finds nothing
    #[arg(long, env = "HARVEST_URLS_FILE")]
    pub urls_file: Option<PathBuf>,

    /// Save fetched listing pages here for inspection
    #[arg(long, env = "HARVEST_DEBUG_DIR")]
    pub debug_dir: Option<PathBuf>,

    /// Per-request timeout in seconds
    #[arg(long, env = "HARVEST_TIMEOUT")]
    pub timeout: Option<u64>,

    /// Attempts per URL for 429/403/transport failures
    #[arg(long, env = "HARVEST_MAX_RETRIES")]
    pub max_retries: Option<u32>,

    /// Upper bound on rate-limit backoff, in backoff units
    #[arg(long, env = "HARVEST_BACKOFF_CAP")]
    pub backoff_cap: Option<u32>,

    /// Pause between article fetches in milliseconds
    #[arg(long, env = "HARVEST_REQUEST_DELAY_MS")]
    pub request_delay_ms: Option<u64>,

    /// Minimum article body length in characters
    #[arg(long, env = "HARVEST_MIN_CONTENT_LENGTH")]
    pub min_content_length: Option<usize>,
}

impl Cli {
    /// Overlay the flags that were given onto `config`.
    pub fn apply(&self, mut config: HarvestConfig) -> HarvestConfig {
        if let Some(v) = &self.base_url {
            config.base_url = v.clone();
        }
        if let Some(v) = self.limit {
            config.limit = v;
        }
        if let Some(v) = &self.output {
            config.output_file = v.clone();
        }
        if let Some(v) = &self.csv {
            config.csv_file = Some(v.clone());
        }
        if let Some(v) = &self.report {
            config.report_file = Some(v.clone());
        }
        if let Some(v) = &self.urls_file {
            config.fallback_urls_file = v.clone();
        }
        if let Some(v) = &self.debug_dir {
            config.debug_dir = Some(v.clone());
        }
        if let Some(v) = self.timeout {
            config.timeout_secs = v;
        }
        if let Some(v) = self.max_retries {
            config.max_retries = v;
        }
        if let Some(v) = self.backoff_cap {
            config.backoff_cap_units = v;
        }
        if let Some(v) = self.request_delay_ms {
            config.request_delay_ms = v;
        }
        if let Some(v) = self.min_content_length {
            config.min_content_length = v;
        }
        config
    }
}
