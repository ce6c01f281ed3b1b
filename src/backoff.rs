//! Retry delay calculation with symmetric jitter.
//!
//! Delays grow as `base_delay * exponential_base^attempt`, are capped at
//! `max_delay`, then perturbed by up to ±12.5% so that many sends failing
//! together do not retry in lockstep.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Total width of the jitter band as a fraction of the raw delay.
const JITTER_SPREAD: f64 = 0.25;

/// Caller-supplied backoff shape. The calculator applies no defaults of its own.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct BackoffConfig {
    /// Delay before the first retry, in milliseconds
    pub base_delay_ms: u64,
    /// Upper bound on the un-jittered delay, in milliseconds
    pub max_delay_ms: u64,
    /// Growth factor per attempt
    pub exponential_base: f64,
}

impl BackoffConfig {
    pub fn new(base_delay_ms: u64, max_delay_ms: u64, exponential_base: f64) -> Self {
        Self {
            base_delay_ms,
            max_delay_ms,
            exponential_base,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.base_delay_ms == 0 {
            return Err("backoff.base_delay_ms must be positive".into());
        }
        if self.max_delay_ms == 0 {
            return Err("backoff.max_delay_ms must be positive".into());
        }
        if !(self.exponential_base.is_finite() && self.exponential_base > 0.0) {
            return Err("backoff.exponential_base must be a positive number".into());
        }
        Ok(())
    }

    /// Capped delay before jitter.
    fn raw_delay_ms(&self, attempt: u32) -> f64 {
        let grown = self.base_delay_ms as f64 * self.exponential_base.powf(attempt as f64);
        grown.min(self.max_delay_ms as f64)
    }
}

/// Delay before retry number `attempt` (0-based), using the thread-local RNG.
pub fn compute_delay(attempt: u32, config: &BackoffConfig) -> Duration {
    compute_delay_with(attempt, config, &mut rand::thread_rng())
}

/// Same as [`compute_delay`] with an explicit random source.
pub fn compute_delay_with<R: Rng + ?Sized>(
    attempt: u32,
    config: &BackoffConfig,
    rng: &mut R,
) -> Duration {
    let raw = config.raw_delay_ms(attempt);
    let unit: f64 = rng.gen_range(0.0..1.0);
    let jitter = raw * JITTER_SPREAD * (unit - 0.5);
    let millis = (raw + jitter).floor().max(0.0);
    Duration::from_millis(millis as u64)
}

/// Backoff plus an attempt budget.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct RetryPolicy {
    pub backoff: BackoffConfig,
    /// Retries allowed after the first attempt
    pub max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            backoff: BackoffConfig::new(1_000, 60_000, 2.0),
            max_attempts: 5,
        }
    }
}

impl RetryPolicy {
    /// Delay before retry `attempt`, or `None` once the budget is spent.
    pub fn next_delay(&self, attempt: u32) -> Option<Duration> {
        (attempt < self.max_attempts).then(|| compute_delay(attempt, &self.backoff))
    }

    pub fn next_delay_with<R: Rng + ?Sized>(&self, attempt: u32, rng: &mut R) -> Option<Duration> {
        (attempt < self.max_attempts).then(|| compute_delay_with(attempt, &self.backoff, rng))
    }
}
