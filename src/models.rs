//! Data models shared by the discovery, fetch and extraction stages.
//!
//! This module defines the core data structures used throughout the application:
//! - [`FetchResult`]: Tagged outcome of one fetch, never an error
//! - [`ExtractedFields`]: Raw fields pulled out of a page by the extractor
//! - [`ArticleRecord`]: The validated article handed to the output sinks
//! - [`DiscoveryState`]: The seen/candidate sets owned by one run
//! - [`SkipReason`]: Why a candidate URL produced no record

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;

/// Placeholder used for optional article fields the page did not provide.
pub const UNKNOWN: &str = "Unknown";

/// Classification of a fetch outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStatus {
    /// HTTP 200 with a body.
    Ok,
    /// HTTP 429 after every retry was used up.
    RateLimited,
    /// HTTP 403 after every retry was used up.
    Forbidden,
    /// HTTP 404, never retried.
    NotFound,
    /// Any other non-200 status, never retried.
    HttpError,
    /// DNS, connect, reset or timeout failure after every retry was used up.
    TransportError,
}

impl FetchStatus {
    /// Map an HTTP status code onto the fetch taxonomy.
    pub fn from_http(code: u16) -> Self {
        match code {
            200 => FetchStatus::Ok,
            429 => FetchStatus::RateLimited,
            403 => FetchStatus::Forbidden,
            404 => FetchStatus::NotFound,
            _ => FetchStatus::HttpError,
        }
    }

    /// Whether another attempt may succeed.
    pub fn is_transient(self) -> bool {
        matches!(
            self,
            FetchStatus::RateLimited | FetchStatus::Forbidden | FetchStatus::TransportError
        )
    }
}

/// Outcome of [`crate::fetcher::Fetcher::fetch`].
///
/// `body` is only present when `status` is [`FetchStatus::Ok`]; `http_status`
/// is absent for transport failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResult {
    pub status: FetchStatus,
    pub body: Option<String>,
    pub http_status: Option<u16>,
}

impl FetchResult {
    pub fn ok(body: String) -> Self {
        Self {
            status: FetchStatus::Ok,
            body: Some(body),
            http_status: Some(200),
        }
    }

    pub fn http(code: u16) -> Self {
        Self {
            status: FetchStatus::from_http(code),
            body: None,
            http_status: Some(code),
        }
    }

    pub fn transport_error() -> Self {
        Self {
            status: FetchStatus::TransportError,
            body: None,
            http_status: None,
        }
    }

    /// The body of a successful fetch, `None` for every other outcome.
    pub fn into_body(self) -> Option<String> {
        match self.status {
            FetchStatus::Ok => self.body,
            _ => None,
        }
    }

    /// Classify a failed fetch; `None` for [`FetchStatus::Ok`].
    pub fn skip_reason(&self) -> Option<SkipReason> {
        match self.status {
            FetchStatus::Ok => None,
            s if s.is_transient() => Some(SkipReason::Transient {
                status: self.http_status,
            }),
            _ => Some(SkipReason::Permanent {
                status: self.http_status.unwrap_or_default(),
            }),
        }
    }
}

/// Fields pulled out of one page before validation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedFields {
    pub title: String,
    pub author: Option<String>,
    pub date_published: Option<String>,
    pub content: String,
}

/// A validated article, the unit handed to the output sinks.
///
/// Only [`crate::assembler::assemble`] builds these, so `title` is never empty
/// and `content` always meets the configured minimum length.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleRecord {
    pub url: String,
    pub title: String,
    pub author: String,
    pub date_published: String,
    pub content: String,
    pub word_count: usize,
    /// ISO-8601 UTC timestamp, e.g. `2025-05-06T14:30:00.123Z`.
    pub scraped_at: String,
}

/// Running discovery state for one run.
///
/// `visited` holds every page URL fetched so far (sitemaps, listing pages and,
/// once the driver starts, article pages). `candidates` holds normalized
/// article URLs; a `BTreeSet` keeps them in lexicographic order.
#[derive(Debug, Clone, Default)]
pub struct DiscoveryState {
    pub visited: BTreeSet<String>,
    pub candidates: BTreeSet<String>,
}

impl DiscoveryState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `url` as visited; returns `false` if it already was.
    pub fn mark_visited(&mut self, url: &str) -> bool {
        self.visited.insert(url.to_string())
    }

    /// Candidates in sorted order, truncated to `limit`.
    pub fn sorted_candidates(&self, limit: usize) -> Vec<String> {
        self.candidates.iter().take(limit).cloned().collect()
    }
}

/// Why a candidate URL did not produce an [`ArticleRecord`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SkipReason {
    /// 429/403/transport failure that outlasted every retry.
    #[error("transient failure persisted after retries (status {status:?})")]
    Transient { status: Option<u16> },
    /// Non-retryable HTTP status such as 404 or 500.
    #[error("permanent failure (status {status})")]
    Permanent { status: u16 },
    /// Page fetched, but no container met the content-length gate.
    #[error("no content container met the minimum length")]
    ExtractionFailure,
    /// Extracted fields failed the record quality checks.
    #[error("record failed validation")]
    ValidationFailure,
}

impl SkipReason {
    /// Short stable label used in logs and reports.
    pub fn label(&self) -> &'static str {
        match self {
            SkipReason::Transient { .. } => "transient",
            SkipReason::Permanent { .. } => "permanent",
            SkipReason::ExtractionFailure => "extraction_failure",
            SkipReason::ValidationFailure => "validation_failure",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_status_from_http() {
        assert_eq!(FetchStatus::from_http(200), FetchStatus::Ok);
        assert_eq!(FetchStatus::from_http(429), FetchStatus::RateLimited);
        assert_eq!(FetchStatus::from_http(403), FetchStatus::Forbidden);
        assert_eq!(FetchStatus::from_http(404), FetchStatus::NotFound);
        assert_eq!(FetchStatus::from_http(500), FetchStatus::HttpError);
    }

    #[test]
    fn test_skip_reason_classification() {
        assert_eq!(FetchResult::ok("x".into()).skip_reason(), None);
        assert_eq!(
            FetchResult::http(429).skip_reason(),
            Some(SkipReason::Transient { status: Some(429) })
        );
        assert_eq!(
            FetchResult::transport_error().skip_reason(),
            Some(SkipReason::Transient { status: None })
        );
        assert_eq!(
            FetchResult::http(500).skip_reason(),
            Some(SkipReason::Permanent { status: 500 })
        );
    }

    #[test]
    fn test_into_body_only_on_ok() {
        assert_eq!(FetchResult::ok("body".into()).into_body().as_deref(), Some("body"));
        assert_eq!(FetchResult::http(404).into_body(), None);
    }

    #[test]
    fn test_discovery_state_sorted_and_limited() {
        let mut state = DiscoveryState::new();
        state.candidates.insert("https://example.com/t/b/2".into());
        state.candidates.insert("https://example.com/t/a/1".into());
        state.candidates.insert("https://example.com/t/c/3".into());

        assert_eq!(
            state.sorted_candidates(2),
            vec!["https://example.com/t/a/1", "https://example.com/t/b/2"]
        );
        assert!(state.mark_visited("https://example.com/sitemap.xml"));
        assert!(!state.mark_visited("https://example.com/sitemap.xml"));
    }

    #[test]
    fn test_article_record_serialization_fields() {
        let record = ArticleRecord {
            url: "https://example.com/t/a/1".into(),
            title: "A".into(),
            author: UNKNOWN.into(),
            date_published: UNKNOWN.into(),
            content: "text".into(),
            word_count: 1,
            scraped_at: "2025-05-06T14:30:00Z".into(),
        };

        let value = serde_json::to_value(&record).unwrap();
        let keys: Vec<&str> = value.as_object().unwrap().keys().map(String::as_str).collect();
        assert_eq!(keys.len(), 7);
        for key in [
            "url",
            "title",
            "author",
            "date_published",
            "content",
            "word_count",
            "scraped_at",
        ] {
            assert!(keys.contains(&key), "missing {key}");
        }
    }
}
