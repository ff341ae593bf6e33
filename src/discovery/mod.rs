//! Candidate article URL discovery.
//!
//! Three strategies are tried in order and the first non-empty one wins:
//!
//! | Strategy | Module | Source |
//! |----------|--------|--------|
//! | Sitemap | [`sitemap`] | conventional sitemap paths under the site root |
//! | Listing pages | [`listing`] | category pages: anchors plus a raw-text regex scan |
//! | Local fallback | [`fallback`] | user-supplied file, one URL per line |
//!
//! A page that fails to fetch is logged and skipped. Running out of strategies
//! is not an error: the result is simply empty and the driver decides what
//! that means.

pub mod fallback;
pub mod listing;
pub mod sitemap;

use crate::config::HarvestConfig;
use crate::fetcher::{Fetcher, Pause, Transport};
use crate::models::DiscoveryState;
use crate::urls::{ArticlePattern, debug_file_name};
use std::fmt;
use tokio::fs;
use tracing::{debug, info, instrument, warn};

/// Which strategy produced the candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Sitemap,
    ListingPages,
    LocalFallback,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Strategy::Sitemap => "sitemap",
            Strategy::ListingPages => "listing_pages",
            Strategy::LocalFallback => "local_fallback",
        })
    }
}

/// Result of one discovery pass.
#[derive(Debug)]
pub struct Discovery {
    /// Sorted, deduplicated, truncated to the requested limit.
    pub urls: Vec<String>,
    /// `None` when every strategy came up empty.
    pub strategy: Option<Strategy>,
    pub state: DiscoveryState,
}

/// Runs the discovery strategies against one site.
pub struct Discoverer<'a, T, P> {
    pub(crate) fetcher: &'a Fetcher<T, P>,
    pub(crate) pattern: &'a ArticlePattern,
    pub(crate) config: &'a HarvestConfig,
}

impl<'a, T: Transport, P: Pause> Discoverer<'a, T, P> {
    pub fn new(
        fetcher: &'a Fetcher<T, P>,
        pattern: &'a ArticlePattern,
        config: &'a HarvestConfig,
    ) -> Self {
        Self {
            fetcher,
            pattern,
            config,
        }
    }

    /// Resolve the configured seeds into at most `limit` candidate URLs.
    ///
    /// `state` is threaded through and handed back so the caller keeps
    /// ownership of the visited set for the rest of the run.
    #[instrument(level = "info", skip_all, fields(site = %self.pattern.site(), limit))]
    pub async fn discover(&self, mut state: DiscoveryState, limit: usize) -> Discovery {
        let attempts = [
            Strategy::Sitemap,
            Strategy::ListingPages,
            Strategy::LocalFallback,
        ];

        for strategy in attempts {
            let found = match strategy {
                Strategy::Sitemap => self.from_sitemaps(&mut state).await,
                Strategy::ListingPages => self.from_listing_pages(&mut state).await,
                Strategy::LocalFallback => self.from_fallback_file().await,
            };
            info!(%strategy, count = found.len(), "Discovery strategy finished");

            if !found.is_empty() {
                state.candidates.extend(found);
                let urls = state.sorted_candidates(limit);
                info!(%strategy, total = state.candidates.len(), kept = urls.len(), "Using discovered URLs");
                return Discovery {
                    urls,
                    strategy: Some(strategy),
                    state,
                };
            }
        }

        warn!("No article URLs discovered by any strategy");
        Discovery {
            urls: Vec::new(),
            strategy: None,
            state,
        }
    }

    /// Fetch one discovery page, skipping it if already visited or if the
    /// fetch fails. Saves a debug artifact when asked and configured.
    pub(crate) async fn fetch_page(
        &self,
        url: &str,
        state: &mut DiscoveryState,
        save_debug: bool,
    ) -> Option<String> {
        if !state.mark_visited(url) {
            debug!(%url, "Already visited; skipping");
            return None;
        }

        let result = self.fetcher.fetch(url).await;
        let status = result.status;
        let http_status = result.http_status;
        match result.into_body() {
            Some(body) => {
                if save_debug {
                    self.save_debug(url, &body).await;
                }
                Some(body)
            }
            None => {
                warn!(%url, ?status, ?http_status, "Discovery page unavailable; skipping");
                None
            }
        }
    }

    async fn save_debug(&self, page_url: &str, body: &str) {
        let Some(dir) = &self.config.debug_dir else {
            return;
        };
        let path = dir.join(debug_file_name(page_url));
        if let Err(e) = fs::create_dir_all(dir).await {
            warn!(dir = %dir.display(), error = %e, "Failed to create debug directory");
            return;
        }
        match fs::write(&path, body).await {
            Ok(()) => info!(path = %path.display(), "Saved debug HTML"),
            Err(e) => warn!(path = %path.display(), error = %e, "Failed to save debug HTML"),
        }
    }
}
