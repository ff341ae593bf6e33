//! Run configuration: defaults, optional YAML file, validation.
//!
//! Values are layered lowest to highest: [`HarvestConfig::default`], then the
//! YAML file given with `--config`, then CLI flags (see [`crate::cli::Cli::apply`]).
//!
//! ```yaml
//! base_url: https://www.t-nation.com
//! limit: 50
//! backoff_cap_units: 4
//! debug_dir: data/debug
//! ```

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Errors raised while loading or validating a [`HarvestConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },
    #[error("invalid base_url {0:?}: must be an absolute http(s) URL")]
    BaseUrl(String),
    #[error("invalid topic_prefix {0:?}: must be a single non-empty path segment")]
    TopicPrefix(String),
    #[error("timeout_secs must be greater than zero")]
    ZeroTimeout,
    #[error("max_retries must be at least 1")]
    ZeroRetries,
}

/// Everything one harvesting run needs to know.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct HarvestConfig {
    /// Site root; sitemap and listing paths are resolved against it.
    pub base_url: String,
    /// First path segment of article URLs (`/<prefix>/<slug>/<id>`).
    pub topic_prefix: String,
    /// Maximum number of articles to scrape.
    pub limit: usize,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// Total attempts per URL for 429/403 and transport failures.
    pub max_retries: u32,
    /// Length of one backoff "time unit" in milliseconds.
    pub backoff_unit_ms: u64,
    /// Ceiling for rate-limit backoff, in time units.
    pub backoff_cap_units: u32,
    /// Pause between listing-page fetches during discovery.
    pub discovery_delay_ms: u64,
    /// Pause between article fetches.
    pub request_delay_ms: u64,
    /// Minimum body length in characters, shared by extractor and assembler.
    pub min_content_length: usize,
    /// Sitemap locations probed in order, relative to `base_url`.
    pub sitemap_paths: Vec<String>,
    /// Category pages crawled when no sitemap yields candidates.
    pub listing_paths: Vec<String>,
    /// Follow child sitemaps listed by a sitemap index, one level deep.
    pub follow_nested_sitemaps: bool,
    /// One URL per line, read when sitemap and listing discovery both come up empty.
    pub fallback_urls_file: PathBuf,
    /// When set, raw listing-page HTML is saved here for inspection.
    pub debug_dir: Option<PathBuf>,
    /// Where the JSON array of records is written.
    pub output_file: PathBuf,
    /// When set, the same records are also written here as CSV.
    pub csv_file: Option<PathBuf>,
    /// When set, the plain-text summary report is written here.
    pub report_file: Option<PathBuf>,
    /// Identity headers sent with every request.
    pub user_agent: String,
    pub accept: String,
    pub accept_language: String,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.t-nation.com".to_string(),
            topic_prefix: "t".to_string(),
            limit: 20,
            timeout_secs: 15,
            max_retries: 3,
            backoff_unit_ms: 1000,
            backoff_cap_units: 8,
            discovery_delay_ms: 1000,
            request_delay_ms: 1500,
            min_content_length: 100,
            sitemap_paths: [
                "/sitemap.xml",
                "/sitemap_index.xml",
                "/sitemap-posts.xml",
                "/sitemap1.xml",
                "/sitemap-index.xml",
            ]
            .map(String::from)
            .to_vec(),
            listing_paths: [
                "/t/",
                "/t/training",
                "/t/nutrition",
                "/t/supplements",
                "/training",
                "/nutrition",
            ]
            .map(String::from)
            .to_vec(),
            follow_nested_sitemaps: true,
            fallback_urls_file: PathBuf::from("urls.txt"),
            debug_dir: None,
            output_file: PathBuf::from("data/articles.json"),
            csv_file: None,
            report_file: None,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/124.0 Safari/537.36"
                .to_string(),
            accept: "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"
                .to_string(),
            accept_language: "en-US,en;q=0.9".to_string(),
        }
    }
}

impl HarvestConfig {
    /// Load a YAML file on top of the defaults. Missing keys keep their default.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] if the file cannot be read and
    /// [`ConfigError::Parse`] if it is not valid YAML for this struct.
    pub fn from_yaml_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_yaml_str(raw: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(raw)
    }

    /// Check the invariants the fetcher and URL matcher rely on.
    ///
    /// # Errors
    ///
    /// Returns the first violated rule: an unusable `base_url`, a
    /// `topic_prefix` that is empty or spans segments, or a zero timeout or
    /// retry count.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.site_root()?;
        if self.topic_prefix.is_empty() || self.topic_prefix.contains('/') {
            return Err(ConfigError::TopicPrefix(self.topic_prefix.clone()));
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        if self.max_retries == 0 {
            return Err(ConfigError::ZeroRetries);
        }
        Ok(())
    }

    /// Parsed `base_url`.
    pub fn site_root(&self) -> Result<Url, ConfigError> {
        match Url::parse(&self.base_url) {
            Ok(url) if matches!(url.scheme(), "http" | "https") && url.host_str().is_some() => {
                Ok(url)
            }
            _ => Err(ConfigError::BaseUrl(self.base_url.clone())),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn backoff_unit(&self) -> Duration {
        Duration::from_millis(self.backoff_unit_ms)
    }

    pub fn discovery_delay(&self) -> Duration {
        Duration::from_millis(self.discovery_delay_ms)
    }

    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }
}
