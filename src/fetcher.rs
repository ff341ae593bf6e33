//! HTTP fetching with status-aware retry and capped exponential backoff.
//!
//! # Architecture
//!
//! The module uses a trait-based design so the retry policy can be exercised
//! without a network:
//! - [`Transport`]: one GET request, returning status and body or a transport failure
//! - [`ReqwestTransport`]: the real client, with a fixed browser-like header set
//! - [`Pause`]: how the fetcher waits between attempts ([`TokioPause`] in production)
//! - [`Fetcher`]: wraps a transport with the retry policy and never returns an error
//!
//! # Retry Strategy
//!
//! | Response | Action |
//! |----------|--------|
//! | 200 | return [`FetchStatus::Ok`] with the body |
//! | 429 / 403 | wait `min(2^attempt, cap)` units, retry |
//! | transport failure | wait `1 + attempt` units, retry |
//! | anything else | return immediately, no retry |
//!
//! No wait follows the final attempt.

use crate::config::HarvestConfig;
use crate::models::FetchResult;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderValue, USER_AGENT};
use std::error::Error;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{debug, error, info, instrument, warn};

/// Status code and body of a single HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

/// DNS, connect, reset, timeout or body-read failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("transport failure: {0}")]
pub struct TransportFailure(pub String);

/// One GET request.
pub trait Transport {
    async fn get(&self, url: &str, timeout: Duration) -> Result<RawResponse, TransportFailure>;
}

/// How the fetcher waits between attempts.
pub trait Pause {
    async fn pause(&self, delay: Duration);
}

/// Real sleeping via `tokio::time::sleep`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioPause;

impl Pause for TokioPause {
    async fn pause(&self, delay: Duration) {
        if !delay.is_zero() {
            sleep(delay).await;
        }
    }
}

/// `reqwest` client carrying the identity headers on every request.
///
/// The client keeps its connection pool for the whole run.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Build a client that sends the given identity headers on every request.
    ///
    /// # Arguments
    ///
    /// * `user_agent` - Value of the `User-Agent` header
    /// * `accept` - Value of the `Accept` header
    /// * `accept_language` - Value of the `Accept-Language` header
    ///
    /// # Errors
    ///
    /// Returns an error if a header value contains invalid characters or the
    /// TLS backend fails to initialize.
    pub fn new(
        user_agent: &str,
        accept: &str,
        accept_language: &str,
    ) -> Result<Self, Box<dyn Error>> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_str(user_agent)?);
        headers.insert(ACCEPT, HeaderValue::from_str(accept)?);
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_str(accept_language)?);

        let client = reqwest::Client::builder().default_headers(headers).build()?;
        Ok(Self { client })
    }

    /// [`ReqwestTransport::new`] with the headers from `config`.
    pub fn from_config(config: &HarvestConfig) -> Result<Self, Box<dyn Error>> {
        Self::new(&config.user_agent, &config.accept, &config.accept_language)
    }
}

impl Transport for ReqwestTransport {
    async fn get(&self, url: &str, timeout: Duration) -> Result<RawResponse, TransportFailure> {
        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| TransportFailure(e.to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| TransportFailure(e.to_string()))?;
        Ok(RawResponse { status, body })
    }
}

/// Attempt count, timeout and backoff shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub timeout: Duration,
    /// One backoff time unit.
    pub unit: Duration,
    /// Largest rate-limit backoff, in units.
    pub cap_units: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            timeout: Duration::from_secs(15),
            unit: Duration::from_secs(1),
            cap_units: 8,
        }
    }
}

impl RetryPolicy {
    /// Attempts, timeout and backoff shape taken from `config`.
    pub fn from_config(config: &HarvestConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            timeout: config.timeout(),
            unit: config.backoff_unit(),
            cap_units: config.backoff_cap_units,
        }
    }

    /// Wait after a 429/403 on 0-indexed `attempt`.
    pub fn rate_limit_delay(&self, attempt: u32) -> Duration {
        let units = 2u32.saturating_pow(attempt).min(self.cap_units.max(1));
        self.unit.saturating_mul(units)
    }

    /// Wait after a transport failure on 0-indexed `attempt`.
    pub fn transport_delay(&self, attempt: u32) -> Duration {
        self.unit.saturating_mul(attempt.saturating_add(1))
    }
}

/// Retrying fetcher. See the module docs for the policy.
#[derive(Debug)]
pub struct Fetcher<T, P = TokioPause> {
    transport: T,
    pause: P,
    policy: RetryPolicy,
}

impl<T: Transport> Fetcher<T, TokioPause> {
    pub fn new(transport: T, policy: RetryPolicy) -> Self {
        Self::with_pause(transport, TokioPause, policy)
    }
}

impl<T: Transport, P: Pause> Fetcher<T, P> {
    pub fn with_pause(transport: T, pause: P, policy: RetryPolicy) -> Self {
        Self {
            transport,
            pause,
            policy,
        }
    }

    #[cfg(test)]
    pub(crate) fn transport(&self) -> &T {
        &self.transport
    }

    /// Wait using the fetcher's pause implementation; used for politeness delays.
    pub async fn pause(&self, delay: Duration) {
        self.pause.pause(delay).await;
    }

    /// Fetch with the configured timeout and attempt count.
    pub async fn fetch(&self, url: &str) -> FetchResult {
        self.fetch_with(url, self.policy.timeout, self.policy.max_retries)
            .await
    }

    /// Fetch `url`, retrying transient failures.
    ///
    /// # Arguments
    ///
    /// * `url` - Absolute URL to GET
    /// * `timeout` - Per-attempt timeout
    /// * `max_retries` - Total attempts; values below 1 are treated as 1
    ///
    /// # Returns
    ///
    /// A [`FetchResult`] with the body on 200. Every other outcome (permanent
    /// status, exhausted 429/403 retries, transport failure) is encoded in its
    /// status instead of an error.
    #[instrument(level = "info", skip_all, fields(%url))]
    pub async fn fetch_with(&self, url: &str, timeout: Duration, max_retries: u32) -> FetchResult {
        let total_t0 = Instant::now();
        let max_retries = max_retries.max(1);
        let mut last = FetchResult::transport_error();

        for attempt in 0..max_retries {
            let is_last = attempt + 1 == max_retries;
            debug!(attempt = attempt + 1, max = max_retries, "GET");

            match self.transport.get(url, timeout).await {
                Ok(resp) if resp.status == 200 => {
                    info!(
                        status = resp.status,
                        bytes = resp.body.len(),
                        elapsed_ms_total = total_t0.elapsed().as_millis() as u64,
                        "Fetched"
                    );
                    return FetchResult::ok(resp.body);
                }
                Ok(resp) if matches!(resp.status, 403 | 429) => {
                    last = FetchResult::http(resp.status);
                    if !is_last {
                        let delay = self.policy.rate_limit_delay(attempt);
                        warn!(
                            attempt = attempt + 1,
                            max = max_retries,
                            status = resp.status,
                            ?delay,
                            "Rate limited; backing off"
                        );
                        self.pause.pause(delay).await;
                    }
                }
                Ok(resp) => {
                    warn!(status = resp.status, "Non-retryable status");
                    return FetchResult::http(resp.status);
                }
                Err(e) => {
                    last = FetchResult::transport_error();
                    if !is_last {
                        let delay = self.policy.transport_delay(attempt);
                        warn!(
                            attempt = attempt + 1,
                            max = max_retries,
                            error = %e,
                            ?delay,
                            "Transport failure; backing off"
                        );
                        self.pause.pause(delay).await;
                    } else {
                        warn!(attempt = attempt + 1, error = %e, "Transport failure");
                    }
                }
            }
        }

        error!(
            attempts = max_retries,
            status = ?last.status,
            elapsed_ms_total = total_t0.elapsed().as_millis() as u64,
            "Fetch exhausted retries"
        );
        last
    }
}
