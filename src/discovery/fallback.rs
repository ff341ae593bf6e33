//! Local URL list, the last discovery strategy.

use super::Discoverer;
use crate::fetcher::{Pause, Transport};
use crate::urls::ArticlePattern;
use std::collections::BTreeSet;
use std::io::ErrorKind;
use tokio::fs;
use tracing::{info, warn};

/// Article candidates from a one-URL-per-line list. Blank lines and lines
/// that do not match the article pattern are dropped.
pub fn parse_url_list(pattern: &ArticlePattern, text: &str) -> BTreeSet<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && pattern.is_match(line))
        .filter_map(|line| pattern.candidate(pattern.site(), line))
        .collect()
}

impl<T: Transport, P: Pause> Discoverer<'_, T, P> {
    pub(crate) async fn from_fallback_file(&self) -> BTreeSet<String> {
        let path = &self.config.fallback_urls_file;
        match fs::read_to_string(path).await {
            Ok(text) => {
                info!(path = %path.display(), "Reading fallback URLs");
                parse_url_list(self.pattern, &text)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!(path = %path.display(), "No fallback URL file");
                BTreeSet::new()
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to read fallback URL file");
                BTreeSet::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HarvestConfig;
    use crate::discovery::Strategy;
    use crate::discovery::tests::test_config;
    use crate::fetcher::tests::{RecordingPause, ScriptedTransport};
    use crate::fetcher::{Fetcher, RetryPolicy};
    use crate::models::DiscoveryState;
    use url::Url;

    #[test]
    fn test_parse_url_list_filters_lines() {
        let pattern = ArticlePattern::new(&Url::parse("https://example.com").unwrap(), "t").unwrap();
        let text = "\n  https://example.com/t/rows/5?x=1  \n\n/t/curls/6/\nhttps://example.com/about\nnot a url\n";

        let urls: Vec<String> = parse_url_list(&pattern, text).into_iter().collect();

        assert_eq!(
            urls,
            vec!["https://example.com/t/curls/6", "https://example.com/t/rows/5"]
        );
    }

    #[tokio::test]
    async fn test_fallback_used_when_network_strategies_empty() {
        let dir = tempfile::tempdir().unwrap();
        let list = dir.path().join("urls.txt");
        std::fs::write(&list, "https://example.com/t/lunges/11\n").unwrap();
        let config = HarvestConfig {
            fallback_urls_file: list,
            ..test_config("https://example.com")
        };
        let fetcher = Fetcher::with_pause(
            ScriptedTransport::default(),
            RecordingPause::default(),
            RetryPolicy::default(),
        );
        let pattern = ArticlePattern::new(&Url::parse(&config.base_url).unwrap(), "t").unwrap();

        let discovery = Discoverer::new(&fetcher, &pattern, &config)
            .discover(DiscoveryState::new(), 10)
            .await;

        assert_eq!(discovery.strategy, Some(Strategy::LocalFallback));
        assert_eq!(discovery.urls, vec!["https://example.com/t/lunges/11"]);
    }
}
