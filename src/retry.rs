//! Retry backoff policy for transient failures.
//!
//! Exponential backoff with full jitter: the deterministic envelope grows as
//! `initial * multiplier^attempt` capped at `max`, and the actual sleep is
//! drawn uniformly from `[0, envelope]` so a fleet of controllers does not
//! hammer a recovering store in lockstep. There is no attempt cap: secret
//! delivery keeps trying for as long as the failure stays transient, and the
//! reconciler resets the attempt counter on the first successful cycle.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for retry backoff on transient errors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Initial backoff duration for the first retry
    pub initial_backoff: Duration,
    /// Maximum backoff duration (cap for exponential growth)
    pub max_backoff: Duration,
    /// Multiplier for exponential backoff (e.g., 2.0 for doubling)
    pub backoff_multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(60),
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// The deterministic backoff envelope for a given attempt (0-indexed).
    ///
    /// Non-decreasing in `attempt` and bounded by `max_backoff`.
    pub fn backoff_for_attempt(&self, attempt: u32) -> Duration {
        let multiplier = self.backoff_multiplier.powi(attempt.min(i32::MAX as u32) as i32);
        let backoff_ms = self.initial_backoff.as_millis() as f64 * multiplier;
        let capped_ms = backoff_ms.min(self.max_backoff.as_millis() as f64);
        Duration::from_millis(capped_ms as u64)
    }

    /// The actual delay to sleep before the retry: uniform in
    /// `[0, backoff_for_attempt(attempt)]`.
    pub fn jittered_delay(&self, attempt: u32) -> Duration {
        let envelope = self.backoff_for_attempt(attempt);
        if envelope.is_zero() {
            return envelope;
        }
        let ms = rand::thread_rng().gen_range(0..=envelope.as_millis() as u64);
        Duration::from_millis(ms)
    }
}
