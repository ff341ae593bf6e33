//! Sitemap probing.
//!
//! Each configured sitemap path is fetched relative to the site root. A body
//! counts as a sitemap when it contains a `<urlset` or `<sitemapindex` marker;
//! the schema is not validated. Every `<loc>` is run through the article
//! pattern. Child sitemaps listed by an index are followed one level deep.

use super::Discoverer;
use crate::fetcher::{Pause, Transport};
use crate::models::DiscoveryState;
use crate::utils::truncate_for_log;
use quick_xml::Reader;
use quick_xml::events::Event;
use std::collections::BTreeSet;
use tracing::{debug, info, warn};

/// Root element of a parsed sitemap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SitemapKind {
    UrlSet,
    Index,
    Unknown,
}

/// `<loc>` entries of one sitemap document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sitemap {
    pub kind: SitemapKind,
    pub locs: Vec<String>,
}

/// Cheap shape check before parsing.
pub fn looks_like_sitemap(body: &str) -> bool {
    body.contains("<urlset") || body.contains("<sitemapindex")
}

/// Collect the text of every `<loc>` element.
///
/// Parsing stops at the first XML error; whatever was read up to that point
/// is kept.
pub fn parse_sitemap(xml: &str) -> Sitemap {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut kind = SitemapKind::Unknown;
    let mut locs = Vec::new();
    let mut in_loc = false;
    let mut current = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"urlset" if kind == SitemapKind::Unknown => kind = SitemapKind::UrlSet,
                b"sitemapindex" if kind == SitemapKind::Unknown => kind = SitemapKind::Index,
                b"loc" => {
                    in_loc = true;
                    current.clear();
                }
                _ => {}
            },
            Ok(Event::Text(t)) if in_loc => current.push_str(&String::from_utf8_lossy(&t)),
            Ok(Event::CData(c)) if in_loc => current.push_str(&String::from_utf8_lossy(&c)),
            Ok(Event::End(e)) if e.local_name().as_ref() == b"loc" => {
                in_loc = false;
                let loc = current.trim();
                if !loc.is_empty() {
                    locs.push(loc.to_string());
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                warn!(position = reader.buffer_position(), error = %e, "Malformed sitemap XML; keeping entries read so far");
                break;
            }
            _ => {}
        }
    }

    Sitemap { kind, locs }
}

impl<T: Transport, P: Pause> Discoverer<'_, T, P> {
    /// Probe the configured sitemap paths and collect article candidates.
    pub(crate) async fn from_sitemaps(&self, state: &mut DiscoveryState) -> BTreeSet<String> {
        let site = self.pattern.site();
        let mut found = BTreeSet::new();
        let mut nested = Vec::new();

        for path in &self.config.sitemap_paths {
            let Ok(url) = site.join(path) else {
                warn!(%path, "Invalid sitemap path; skipping");
                continue;
            };
            self.read_sitemap(url.as_str(), state, &mut found, &mut nested)
                .await;
        }

        if self.config.follow_nested_sitemaps {
            // One level only: children of children are ignored.
            let children = std::mem::take(&mut nested);
            for child in children {
                self.read_sitemap(&child, state, &mut found, &mut nested)
                    .await;
            }
        }

        info!(count = found.len(), "Sitemap discovered article URLs");
        found
    }

    async fn read_sitemap(
        &self,
        url: &str,
        state: &mut DiscoveryState,
        found: &mut BTreeSet<String>,
        nested: &mut Vec<String>,
    ) {
        let Some(body) = self.fetch_page(url, state, false).await else {
            return;
        };
        if !looks_like_sitemap(&body) {
            debug!(%url, preview = %truncate_for_log(&body, 200), "Response is not a sitemap");
            return;
        }

        let sitemap = parse_sitemap(&body);
        info!(%url, kind = ?sitemap.kind, locs = sitemap.locs.len(), "Parsing sitemap");
        let site = self.pattern.site();
        for loc in sitemap.locs {
            if let Some(candidate) = self.pattern.candidate(site, &loc) {
                found.insert(candidate);
            } else if sitemap.kind == SitemapKind::Index && is_child_sitemap(&loc) {
                if let Ok(child) = site.join(&loc) {
                    if self.pattern.is_same_site(&child) {
                        nested.push(child.to_string());
                    }
                }
            }
        }
    }
}

fn is_child_sitemap(loc: &str) -> bool {
    let path = loc.split(['?', '#']).next().unwrap_or_default();
    path.to_ascii_lowercase().ends_with(".xml")
}
