//! Listing-page crawl.
//!
//! Category pages are fetched in order and mined two ways: anchor `href`s
//! resolved against the page, and a regex scan of the raw body, which also
//! catches links that only appear inside script or JSON blocks.

use super::Discoverer;
use crate::fetcher::{Pause, Transport};
use crate::models::DiscoveryState;
use crate::urls::ArticlePattern;
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use std::collections::BTreeSet;
use tracing::{info, warn};
use url::Url;

static ANCHOR: Lazy<Selector> = Lazy::new(|| Selector::parse("a[href]").unwrap());

/// Article candidates linked from one page, anchors and raw scan combined.
pub fn extract_links(pattern: &ArticlePattern, page_url: &Url, html: &str) -> BTreeSet<String> {
    let document = Html::parse_document(html);
    let mut links: BTreeSet<String> = document
        .select(&ANCHOR)
        .filter_map(|a| a.value().attr("href"))
        .filter_map(|href| pattern.candidate(page_url, href))
        .collect();
    links.extend(pattern.scan(html));
    links
}

impl<T: Transport, P: Pause> Discoverer<'_, T, P> {
    /// Crawl the configured listing pages, pausing between fetches.
    pub(crate) async fn from_listing_pages(&self, state: &mut DiscoveryState) -> BTreeSet<String> {
        let site = self.pattern.site();
        let delay = self.config.discovery_delay();
        let mut discovered = BTreeSet::new();

        for (i, path) in self.config.listing_paths.iter().enumerate() {
            if i > 0 {
                self.fetcher.pause(delay).await;
            }
            let Ok(page_url) = site.join(path) else {
                warn!(%path, "Invalid listing path; skipping");
                continue;
            };
            let Some(html) = self.fetch_page(page_url.as_str(), state, true).await else {
                continue;
            };

            let links = extract_links(self.pattern, &page_url, &html);
            info!(page = %page_url, count = links.len(), "Found article-like links");
            discovered.extend(links);
        }

        info!(count = discovered.len(), "Total discovered via listing pages");
        discovered
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pattern() -> ArticlePattern {
        ArticlePattern::new(&Url::parse("https://example.com").unwrap(), "t").unwrap()
    }

    #[test]
    fn test_anchor_and_regex_paths_deduplicate() {
        let p = pattern();
        let page = Url::parse("https://example.com/t/training").unwrap();
        let html = r#"<html><body>
            <a href="https://example.com/t/how-to-squat/12345">absolute</a>
            <a href="/t/how-to-squat/12345?utm_source=feed">relative with query</a>
            <a href="/t/how-to-squat/12345/">relative with slash</a>
            <script>var next = "/t/how-to-squat/12345?page=2";</script>
        </body></html>"#;

        let links = extract_links(&p, &page, html);

        assert_eq!(
            links.into_iter().collect::<Vec<_>>(),
            vec!["https://example.com/t/how-to-squat/12345"]
        );
    }

    #[test]
    fn test_script_only_links_are_found() {
        let p = pattern();
        let page = Url::parse("https://example.com/training").unwrap();
        let html = r#"<div id="app"></div>
            <script type="application/json">{"topics":[{"slug":"/t/bench-day/42"}]}</script>"#;

        let links = extract_links(&p, &page, html);

        assert!(links.contains("https://example.com/t/bench-day/42"));
    }

    #[test]
    fn test_non_article_and_off_site_anchors_ignored() {
        let p = pattern();
        let page = Url::parse("https://example.com/t/").unwrap();
        let html = r#"<a href="/about">About</a>
            <a href="https://other.net/x">Elsewhere</a>
            <a href="https://other.net/t/partner-squat/99">Partner article</a>
            <a href="/t/nutrition">Category</a>"#;

        assert!(extract_links(&p, &page, html).is_empty());
    }

    #[test]
    fn test_off_site_article_links_in_scripts_ignored() {
        let p = pattern();
        let page = Url::parse("https://example.com/t/").unwrap();
        let html = r#"<script>
            var related = ["https://other.net/t/partner-squat/99", "/t/own-squat/3"];
        </script>"#;

        assert_eq!(
            extract_links(&p, &page, html).into_iter().collect::<Vec<_>>(),
            vec!["https://example.com/t/own-squat/3"]
        );
    }
}
