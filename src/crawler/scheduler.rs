//! Backoff scheduler for randomized request pacing
//!
//! This module handles:
//! - Drawing randomized inter-request delays from the configured range
//! - Sleeping for those delays, optionally cut short by cancellation

use crate::config::{FetchConfig, MAX_DELAY_SECS};
use crate::crawler::random::SharedRng;
use rand::Rng;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Computes and applies the delays between requests
///
/// Delays are drawn uniformly from `[min, max]` seconds. The scheduler is
/// invoked between retries of one logical fetch and between any two requests
/// to the same origin.
#[derive(Debug, Clone)]
pub struct BackoffScheduler {
    /// Lower bound in seconds
    min_secs: f64,

    /// Upper bound in seconds
    max_secs: f64,

    /// Random source for the draws
    rng: SharedRng,
}

impl BackoffScheduler {
    /// Creates a scheduler over `[min_secs, max_secs]`
    ///
    /// The bounds are expected to be validated already. Anything else is
    /// coerced into `[0, MAX_DELAY_SECS]` (NaN counts as zero) and an inverted
    /// range is reordered, so drawing a delay never panics.
    pub fn new(min_secs: f64, max_secs: f64, rng: SharedRng) -> Self {
        let (min_secs, max_secs) = (bound(min_secs), bound(max_secs));
        let (min_secs, max_secs) = if min_secs <= max_secs {
            (min_secs, max_secs)
        } else {
            (max_secs, min_secs)
        };

        Self {
            min_secs,
            max_secs,
            rng,
        }
    }

    /// Creates a scheduler from the fetch configuration
    pub fn from_config(config: &FetchConfig, rng: SharedRng) -> Self {
        let (min, max) = config.delay_range();
        Self::new(min, max, rng)
    }

    /// Returns the configured `(min, max)` range in seconds
    pub fn range(&self) -> (f64, f64) {
        (self.min_secs, self.max_secs)
    }

    /// Draws the next delay
    pub fn delay(&self) -> Duration {
        let secs = if self.max_secs > self.min_secs {
            self.rng.lock().random_range(self.min_secs..=self.max_secs)
        } else {
            self.min_secs
        };
        Duration::from_secs_f64(secs)
    }

    /// Sleeps for one freshly drawn delay
    ///
    /// # Returns
    ///
    /// The delay that was applied
    pub async fn wait(&self) -> Duration {
        let delay = self.delay();
        tracing::trace!("Sleeping {:?}", delay);
        tokio::time::sleep(delay).await;
        delay
    }

    /// Sleeps for one freshly drawn delay unless cancelled first
    ///
    /// # Returns
    ///
    /// * `Some(Duration)` - The full delay elapsed
    /// * `None` - Cancellation was raised before the delay elapsed
    pub async fn wait_or_cancel(&self, cancel: &CancellationToken) -> Option<Duration> {
        let delay = self.delay();
        tracing::trace!("Sleeping {:?}", delay);
        tokio::select! {
            _ = tokio::time::sleep(delay) => Some(delay),
            _ = cancel.cancelled() => None,
        }
    }
}

fn bound(secs: f64) -> f64 {
    if secs.is_nan() {
        0.0
    } else {
        secs.clamp(0.0, MAX_DELAY_SECS)
    }
}
