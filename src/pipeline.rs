//! The run driver: discover, then fetch, extract and assemble each candidate.
//!
//! Everything runs sequentially with one request in flight. A politeness
//! pause separates article fetches, and records come out in discovery order,
//! so a run over an unchanged site is reproducible. No per-URL failure stops
//! the run; each one becomes a [`SkipReason`] in the quality metrics.

use crate::assembler::assemble;
use crate::config::HarvestConfig;
use crate::discovery::{Discoverer, Strategy};
use crate::extractor::ContentExtractor;
use crate::fetcher::{Fetcher, Pause, Transport};
use crate::models::{ArticleRecord, DiscoveryState, SkipReason};
use crate::quality::QualityMetrics;
use crate::urls::ArticlePattern;
use std::error::Error;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

/// Records and metrics of a completed run.
#[derive(Debug)]
pub struct Harvest {
    /// The discovery strategy that produced the candidates.
    pub strategy: Strategy,
    /// Validated records, in scrape order.
    pub records: Vec<ArticleRecord>,
    pub metrics: QualityMetrics,
    pub state: DiscoveryState,
}

/// How a run ended.
#[derive(Debug)]
pub enum RunOutcome {
    /// Every discovery strategy came up empty; nothing was fetched.
    NothingToScrape { state: DiscoveryState },
    Completed(Harvest),
}

/// Fetch, extract and assemble one URL at a time.
pub struct Pipeline<'a, T, P> {
    fetcher: &'a Fetcher<T, P>,
    extractor: ContentExtractor,
    config: &'a HarvestConfig,
}

impl<'a, T: Transport, P: Pause> Pipeline<'a, T, P> {
    pub fn new(fetcher: &'a Fetcher<T, P>, config: &'a HarvestConfig) -> Self {
        Self {
            fetcher,
            extractor: ContentExtractor::new(config.min_content_length),
            config,
        }
    }

    /// Discover candidates and scrape up to `config.limit` of them.
    ///
    /// # Returns
    ///
    /// [`RunOutcome::NothingToScrape`] when discovery found no candidates,
    /// otherwise the [`Harvest`]. Individual article failures are counted in
    /// the metrics, not returned.
    ///
    /// # Errors
    ///
    /// Returns an error only if `base_url` or `topic_prefix` cannot be turned
    /// into an article matcher.
    #[instrument(level = "info", skip_all, fields(site = %self.config.base_url, limit = self.config.limit))]
    pub async fn run(&self) -> Result<RunOutcome, Box<dyn Error>> {
        let pattern = ArticlePattern::new(&self.config.site_root()?, &self.config.topic_prefix)?;
        let discovery = Discoverer::new(self.fetcher, &pattern, self.config)
            .discover(DiscoveryState::new(), self.config.limit)
            .await;
        info!(count = discovery.urls.len(), "Discovered candidate article URLs");

        let Some(strategy) = discovery.strategy else {
            return Ok(RunOutcome::NothingToScrape {
                state: discovery.state,
            });
        };

        let mut state = discovery.state;
        let (records, metrics) = self.scrape(&discovery.urls, &mut state).await;
        Ok(RunOutcome::Completed(Harvest {
            strategy,
            records,
            metrics,
            state,
        }))
    }

    /// Scrape `urls` in order. URLs already in `state.visited` are skipped.
    pub async fn scrape(
        &self,
        urls: &[String],
        state: &mut DiscoveryState,
    ) -> (Vec<ArticleRecord>, QualityMetrics) {
        let t0 = Instant::now();
        let delay = self.config.request_delay();
        let total = urls.len();
        let mut records = Vec::new();
        let mut metrics = QualityMetrics::default();

        for (i, url) in urls.iter().enumerate() {
            if !state.mark_visited(url) {
                debug!(%url, "Already fetched this run; skipping");
                continue;
            }
            if i > 0 {
                self.fetcher.pause(delay).await;
            }

            info!(index = i + 1, total, %url, "Scraping");
            match self.scrape_one(url).await {
                Ok(record) => {
                    info!(%url, words = record.word_count, title = %record.title, "Scraped article");
                    metrics.record_success(&record);
                    records.push(record);
                }
                Err(reason) => {
                    warn!(%url, reason = reason.label(), detail = %reason, "Skipping article");
                    metrics.record_skip(&reason);
                }
            }
        }

        info!(
            produced = metrics.produced,
            skipped = metrics.skipped_total(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Scrape pass complete"
        );
        (records, metrics)
    }

    /// Fetch, extract and assemble a single article.
    pub async fn scrape_one(&self, url: &str) -> Result<ArticleRecord, SkipReason> {
        let result = self.fetcher.fetch(url).await;
        if let Some(reason) = result.skip_reason() {
            return Err(reason);
        }
        let body = result.into_body().ok_or(SkipReason::ExtractionFailure)?;

        let fields = self
            .extractor
            .extract(&body)
            .ok_or(SkipReason::ExtractionFailure)?;
        assemble(url, fields, self.config.min_content_length).ok_or(SkipReason::ValidationFailure)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::tests::{RecordingPause, ScriptedTransport};
    use crate::fetcher::{ReqwestTransport, RetryPolicy};
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(base: &str) -> HarvestConfig {
        HarvestConfig {
            base_url: base.to_string(),
            max_retries: 2,
            timeout_secs: 5,
            request_delay_ms: 1500,
            fallback_urls_file: "/nonexistent/urls.txt".into(),
            ..HarvestConfig::default()
        }
    }

    fn article_page(title: &str, words: usize) -> String {
        let paragraphs: Vec<String> = (0..words / 10)
            .map(|p| {
                let line: Vec<String> = (0..10).map(|w| format!("rep{p}x{w}")).collect();
                format!("<p>{}</p>", line.join(" "))
            })
            .collect();
        format!(
            "<html><head><title>T Nation</title></head><body><h1>{title}</h1><article>{}</article></body></html>",
            paragraphs.join("\n")
        )
    }

    #[tokio::test]
    async fn test_end_to_end_sitemap_to_record() {
        let server = MockServer::start().await;
        let base = server.uri();
        let sitemap = format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
  <url><loc>{base}/t/how-to-squat/12345</loc></url>
  <url><loc>{base}/about</loc></url>
  <url><loc>{base}/forums/latest</loc></url>
</urlset>"#
        );
        Mock::given(method("GET"))
            .and(path("/sitemap.xml"))
            .respond_with(ResponseTemplate::new(200).set_body_string(sitemap))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/t/how-to-squat/12345"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string(article_page("How To Squat", 300)),
            )
            .mount(&server)
            .await;

        let config = config(&base);
        let transport = ReqwestTransport::from_config(&config).unwrap();
        let fetcher = Fetcher::with_pause(
            transport,
            RecordingPause::default(),
            RetryPolicy::from_config(&config),
        );

        let outcome = Pipeline::new(&fetcher, &config).run().await.unwrap();

        let RunOutcome::Completed(harvest) = outcome else {
            panic!("expected a completed run");
        };
        assert_eq!(harvest.strategy, Strategy::Sitemap);
        assert_eq!(harvest.records.len(), 1);
        let record = &harvest.records[0];
        assert_eq!(record.url, format!("{base}/t/how-to-squat/12345"));
        assert_eq!(record.title, "How To Squat");
        assert_eq!(record.word_count, 300);
        assert_eq!(record.author, "Unknown");
        assert_eq!(harvest.metrics.produced, 1);
        assert!(harvest.state.visited.contains(&record.url));
    }

    #[tokio::test]
    async fn test_nothing_to_scrape() {
        let server = MockServer::start().await;
        let config = HarvestConfig {
            discovery_delay_ms: 0,
            ..config(&server.uri())
        };
        let transport = ReqwestTransport::from_config(&config).unwrap();
        let fetcher = Fetcher::with_pause(
            transport,
            RecordingPause::default(),
            RetryPolicy::from_config(&config),
        );

        let outcome = Pipeline::new(&fetcher, &config).run().await.unwrap();

        assert!(matches!(outcome, RunOutcome::NothingToScrape { .. }));
    }

    #[tokio::test]
    async fn test_scrape_skips_failures_and_keeps_order() {
        let config = config("https://example.com");
        let transport = ScriptedTransport::default();
        transport.push_status("https://example.com/t/a/1", 200, &article_page("Alpha", 50));
        transport.push_status("https://example.com/t/b/2", 500, "");
        transport.push_status(
            "https://example.com/t/c/3",
            200,
            "<html><h1>Short</h1><article><p>tiny</p></article></html>",
        );
        transport.push_status(
            "https://example.com/t/d/4",
            200,
            &article_page("", 50).replace("<title>T Nation</title>", ""),
        );
        transport.push_status("https://example.com/t/e/5", 429, "");
        transport.push_status("https://example.com/t/f/6", 200, &article_page("Zeta", 40));
        let pause = RecordingPause::default();
        let fetcher = Fetcher::with_pause(transport, pause.clone(), RetryPolicy::from_config(&config));
        let pipeline = Pipeline::new(&fetcher, &config);
        let urls: Vec<String> = ["a/1", "b/2", "c/3", "d/4", "e/5", "f/6", "a/1"]
            .iter()
            .map(|p| format!("https://example.com/t/{p}"))
            .collect();
        let mut state = DiscoveryState::new();

        let (records, metrics) = pipeline.scrape(&urls, &mut state).await;

        let titles: Vec<&str> = records.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["Alpha", "Zeta"]);
        assert_eq!(metrics.attempted, 6);
        assert_eq!(metrics.skipped.get("permanent"), Some(&1));
        assert_eq!(metrics.skipped.get("extraction_failure"), Some(&1));
        assert_eq!(metrics.skipped.get("validation_failure"), Some(&1));
        assert_eq!(metrics.skipped.get("transient"), Some(&1));

        // Five politeness pauses between six fetched URLs, plus one backoff
        // after the first 429.
        let delays = pause.delays();
        assert_eq!(
            delays
                .iter()
                .filter(|d| **d == Duration::from_millis(1500))
                .count(),
            5
        );
        assert!(delays.contains(&Duration::from_secs(1)));
    }
}
