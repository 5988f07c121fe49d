//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the scraper, including:
//! - Building the HTTP client with a bounded per-request timeout
//! - Presenting a rotated browser identity on every attempt
//! - Retry logic with randomized backoff between attempts
//! - Anti-bot response detection
//! - Per-origin pacing so no origin sees two requests without a delay
//!
//! A logical fetch only ever hands a body to the caller when the response was a
//! clean 200 whose body carries no block marker.

use crate::config::FetchConfig;
use crate::crawler::identity::{Identity, IdentityRotator};
use crate::crawler::random::SharedRng;
use crate::crawler::scheduler::BackoffScheduler;
use crate::config::validate_fetch_config;
use crate::state::OriginState;
use crate::url::origin_of;
use reqwest::{Client, StatusCode};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex as AsyncMutex;
use tokio_util::sync::CancellationToken;

/// Case-insensitive substrings that identify a robot check or CAPTCHA page
pub const BLOCK_MARKERS: [&str; 2] = ["robot", "captcha"];

/// Failure of a single request attempt
///
/// Every variant is retried by [`Fetcher::fetch`]; they are kept distinct so
/// that logs and statistics can tell blocking apart from plain outages.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Request failed for {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Detected anti-bot response for {url} (marker \"{marker}\")")]
    Blocked { url: String, marker: &'static str },

    #[error("HTTP {status} for {url}")]
    Http { url: String, status: u16 },
}

impl FetchError {
    /// Short label used in structured log fields
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Transport { .. } => "transport",
            Self::Blocked { .. } => "blocked",
            Self::Http { .. } => "http",
        }
    }

    /// Returns true if this attempt was answered with a block page
    pub fn is_blocked(&self) -> bool {
        matches!(self, Self::Blocked { .. })
    }

    /// Returns true if the request ran into the per-request timeout
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Transport { source, .. } if source.is_timeout())
    }
}

/// Terminal status of a logical fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FetchStatus {
    /// A clean 200 without block markers; the body is available
    Success,

    /// Stopped early after too many consecutive block pages
    Blocked,

    /// Every attempt in the budget failed
    Exhausted,

    /// Cancellation was raised before the fetch could finish
    Cancelled,
}

/// Result of a logical fetch
#[derive(Debug)]
pub struct FetchResult {
    status: FetchStatus,
    body: Option<String>,
    attempts_used: u32,
    last_error: Option<FetchError>,
}

impl FetchResult {
    /// A successful fetch carrying the page body
    pub fn success(body: String, attempts_used: u32) -> Self {
        Self {
            status: FetchStatus::Success,
            body: Some(body),
            attempts_used,
            last_error: None,
        }
    }

    /// A fetch whose attempt budget ran out
    pub fn exhausted(attempts_used: u32, last_error: Option<FetchError>) -> Self {
        Self::failed(FetchStatus::Exhausted, attempts_used, last_error)
    }

    /// A fetch abandoned after repeated block pages
    pub fn blocked(attempts_used: u32, last_error: Option<FetchError>) -> Self {
        Self::failed(FetchStatus::Blocked, attempts_used, last_error)
    }

    /// A fetch interrupted by cancellation
    pub fn cancelled(attempts_used: u32, last_error: Option<FetchError>) -> Self {
        Self::failed(FetchStatus::Cancelled, attempts_used, last_error)
    }

    fn failed(status: FetchStatus, attempts_used: u32, last_error: Option<FetchError>) -> Self {
        Self {
            status,
            body: None,
            attempts_used,
            last_error,
        }
    }

    pub fn status(&self) -> FetchStatus {
        self.status
    }

    pub fn is_success(&self) -> bool {
        self.status == FetchStatus::Success
    }

    /// The page body; present iff the fetch succeeded
    pub fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }

    /// Consumes the result, returning the body of a successful fetch
    pub fn into_body(self) -> Option<String> {
        self.body
    }

    pub fn attempts_used(&self) -> u32 {
        self.attempts_used
    }

    /// Failure of the last unsuccessful attempt, if any
    pub fn last_error(&self) -> Option<&FetchError> {
        self.last_error.as_ref()
    }
}

/// One iteration of the retry loop, alive only long enough to be logged
struct RequestAttempt<'a> {
    number: u32,
    identity: Identity,
    delay_before: Duration,
    outcome: &'a Result<String, FetchError>,
}

impl RequestAttempt<'_> {
    fn log(&self, url: &str, max_retries: u32) {
        match self.outcome {
            Ok(body) => tracing::debug!(
                url,
                attempt = self.number,
                user_agent = self.identity.user_agent(),
                delay_ms = self.delay_before.as_millis() as u64,
                bytes = body.len(),
                "Fetched page"
            ),
            Err(FetchError::Blocked { marker, .. }) => tracing::warn!(
                url,
                attempt = self.number,
                max_retries,
                marker = *marker,
                user_agent = self.identity.user_agent(),
                "Detected anti-bot response for {}",
                url
            ),
            Err(FetchError::Http { status, .. })
                if *status == StatusCode::SERVICE_UNAVAILABLE.as_u16() =>
            {
                tracing::warn!(
                    url,
                    attempt = self.number,
                    max_retries,
                    status = *status,
                    "Service unavailable for {}, retrying...",
                    url
                )
            }
            Err(FetchError::Http { status, .. }) => tracing::warn!(
                url,
                attempt = self.number,
                max_retries,
                status = *status,
                "HTTP {} for {}",
                status,
                url
            ),
            Err(err @ FetchError::Transport { .. }) => tracing::error!(
                url,
                attempt = self.number,
                max_retries,
                timeout = err.is_timeout(),
                "{}",
                err
            ),
        }
    }
}

/// Builds an HTTP client with proper configuration
///
/// The user agent is not set here: every attempt sends its own identity.
///
/// # Arguments
///
/// * `config` - The fetch configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(config: &FetchConfig) -> Result<Client, reqwest::Error> {
    let timeout = config.request_timeout();

    Client::builder()
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .gzip(true)
        .brotli(true)
        .deflate(true)
        .build()
}

/// Looks for an anti-bot marker in a response body
///
/// # Returns
///
/// The first marker found, or None for a clean page
pub fn detect_block(body: &str) -> Option<&'static str> {
    let lowered = body.to_lowercase();
    BLOCK_MARKERS
        .iter()
        .find(|marker| lowered.contains(*marker))
        .copied()
}

/// Fetch controller: one logical fetch per call, retries included
///
/// The controller owns the connection pool, the identity rotator, the backoff
/// scheduler and the per-origin pacing ledger. It is safe to share between
/// tasks. Each origin has an async gate: the pacing check, the scheduled delay
/// and the request bookkeeping all run while holding it, so concurrent fetches
/// to one origin take turns and each waits out its own delay. The ledger and
/// the random source sit behind short-lived locks never held across an await.
pub struct Fetcher {
    client: Client,
    identities: IdentityRotator,
    backoff: BackoffScheduler,
    max_retries: u32,
    max_consecutive_blocks: Option<u32>,
    origins: Mutex<HashMap<String, OriginState>>,
    gates: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl Fetcher {
    /// Creates a fetcher seeded from operating system entropy
    pub fn new(config: &FetchConfig) -> crate::Result<Self> {
        Self::with_rng(config, SharedRng::from_entropy())
    }

    /// Creates a fetcher drawing identities and delays from `rng`
    ///
    /// # Returns
    ///
    /// * `Ok(Fetcher)` - Ready to fetch
    /// * `Err(ScoutError)` - Invalid fetch configuration or client construction failure
    pub fn with_rng(config: &FetchConfig, rng: SharedRng) -> crate::Result<Self> {
        validate_fetch_config(config)?;
        let client = build_http_client(config)?;

        Ok(Self {
            client,
            identities: IdentityRotator::new(rng.clone()),
            backoff: BackoffScheduler::from_config(config, rng),
            max_retries: config.max_retries,
            max_consecutive_blocks: config.max_consecutive_blocks,
            origins: Mutex::new(HashMap::new()),
            gates: Mutex::new(HashMap::new()),
        })
    }

    /// Attempt budget of one logical fetch
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub fn backoff(&self) -> &BackoffScheduler {
        &self.backoff
    }

    /// Fetches a URL with full retry and block handling
    ///
    /// # Request Flow
    ///
    /// | Condition | Action |
    /// |-----------|--------|
    /// | Transport error / timeout | Retry after backoff |
    /// | Non-200 status (503 logged separately) | Retry after backoff |
    /// | 200 with a block marker | Discard body, retry after backoff |
    /// | 200 without a block marker | Return success immediately |
    /// | Budget spent | Return `Exhausted` |
    ///
    /// No delay follows the final attempt.
    pub async fn fetch(&self, url: &str) -> FetchResult {
        self.fetch_with_cancel(url, &CancellationToken::new()).await
    }

    /// Same as [`Fetcher::fetch`], but stops issuing attempts once `cancel`
    /// is raised
    pub async fn fetch_with_cancel(&self, url: &str, cancel: &CancellationToken) -> FetchResult {
        let origin = origin_of(url);
        let mut consecutive_blocks = 0u32;
        let mut last_error = None;

        for attempt in 1..=self.max_retries {
            if cancel.is_cancelled() {
                tracing::info!(url, "Fetch cancelled before attempt {}", attempt);
                return FetchResult::cancelled(attempt - 1, last_error);
            }

            let slot = match origin.as_deref() {
                Some(origin) => self.claim_slot(origin, cancel).await,
                None if attempt > 1 => self.backoff.wait_or_cancel(cancel).await,
                None => Some(Duration::ZERO),
            };
            let Some(delay_before) = slot else {
                tracing::info!(url, "Fetch cancelled before attempt {}", attempt);
                return FetchResult::cancelled(attempt - 1, last_error);
            };

            let identity = self.identities.next_identity();
            let outcome = self.attempt(url, &identity).await;
            RequestAttempt {
                number: attempt,
                identity,
                delay_before,
                outcome: &outcome,
            }
            .log(url, self.max_retries);

            match outcome {
                Ok(body) => return FetchResult::success(body, attempt),
                Err(err) => {
                    if err.is_blocked() {
                        consecutive_blocks += 1;
                        if let Some(origin) = origin.as_deref() {
                            self.with_origin(origin, OriginState::record_block);
                        }
                    } else {
                        consecutive_blocks = 0;
                    }
                    last_error = Some(err);
                }
            }

            if self
                .max_consecutive_blocks
                .is_some_and(|limit| consecutive_blocks >= limit)
            {
                tracing::error!(
                    url,
                    consecutive_blocks,
                    "Giving up on {}: persistently blocked",
                    url
                );
                return FetchResult::blocked(attempt, last_error);
            }
        }

        tracing::error!(
            url,
            attempts = self.max_retries,
            "Failed to fetch {} after {} attempts",
            url,
            self.max_retries
        );
        FetchResult::exhausted(self.max_retries, last_error)
    }

    /// Applies one scheduled delay for the origin of `url`
    ///
    /// Used by callers between consecutive logical fetches; it also clears the
    /// pacing debt of that origin so the next fetch does not wait twice.
    ///
    /// # Returns
    ///
    /// * `true` - The delay elapsed
    /// * `false` - Cancellation cut the delay short
    pub async fn pause(&self, url: &str, cancel: &CancellationToken) -> bool {
        let Some(origin) = origin_of(url) else {
            return self.backoff.wait_or_cancel(cancel).await.is_some();
        };

        let gate = self.gate(&origin);
        let _turn = tokio::select! {
            turn = gate.lock() => turn,
            _ = cancel.cancelled() => return false,
        };

        if self.backoff.wait_or_cancel(cancel).await.is_none() {
            return false;
        }
        self.with_origin(&origin, OriginState::record_delay);
        true
    }

    /// Returns a copy of the pacing state of one origin
    pub fn origin_state(&self, origin: &str) -> Option<OriginState> {
        self.lock_origins().get(origin).cloned()
    }

    /// Claims the next request slot of `origin`
    ///
    /// Waits one scheduled delay first when the origin was contacted since its
    /// last delay, then records the request. The whole sequence holds the
    /// origin's gate.
    ///
    /// # Returns
    ///
    /// * `Some(Duration)` - The delay applied before the request
    /// * `None` - Cancellation was raised while waiting
    async fn claim_slot(&self, origin: &str, cancel: &CancellationToken) -> Option<Duration> {
        let gate = self.gate(origin);
        let _turn = tokio::select! {
            turn = gate.lock() => turn,
            _ = cancel.cancelled() => return None,
        };

        let mut delay = Duration::ZERO;
        if self.origin_needs_delay(origin) {
            tracing::debug!(origin, "Pacing request to recently contacted origin");
            delay = self.backoff.wait_or_cancel(cancel).await?;
            self.with_origin(origin, OriginState::record_delay);
        }

        self.with_origin(origin, OriginState::record_request);
        Some(delay)
    }

    /// Issues one GET and classifies the response
    async fn attempt(&self, url: &str, identity: &Identity) -> Result<String, FetchError> {
        let transport = |source| FetchError::Transport {
            url: url.to_string(),
            source,
        };

        let response = self
            .client
            .get(url)
            .headers(identity.headers())
            .send()
            .await
            .map_err(transport)?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(FetchError::Http {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await.map_err(transport)?;

        if let Some(marker) = detect_block(&body) {
            return Err(FetchError::Blocked {
                url: url.to_string(),
                marker,
            });
        }

        Ok(body)
    }

    fn origin_needs_delay(&self, origin: &str) -> bool {
        self.lock_origins()
            .get(origin)
            .is_some_and(OriginState::needs_delay)
    }

    fn with_origin<F>(&self, origin: &str, update: F)
    where
        F: FnOnce(&mut OriginState),
    {
        let mut origins = self.lock_origins();
        update(origins.entry(origin.to_string()).or_default());
    }

    fn lock_origins(&self) -> MutexGuard<'_, HashMap<String, OriginState>> {
        self.origins.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The pacing gate of one origin, created on first use
    fn gate(&self, origin: &str) -> Arc<AsyncMutex<()>> {
        let mut gates = self.gates.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(gates.entry(origin.to_string()).or_default())
    }
}
