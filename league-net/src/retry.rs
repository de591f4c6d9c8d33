//! Retry policy - backoff schedule with jitter
//!
//! Delay for attempt k (0-indexed): exponential is `initial * 2^k`, linear
//! is `initial * (k+1)`. Jitter of ±25% is applied, then the result is
//! clamped to `max_delay`.

use std::time::Duration;

use rand::Rng;

/// How inter-attempt delays grow.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BackoffStrategy {
    Exponential,
    Linear,
}

impl Default for BackoffStrategy {
    fn default() -> Self {
        BackoffStrategy::Exponential
    }
}

/// Retry configuration for one outbound call.
#[derive(Clone, Copy, Debug)]
pub struct RetryPolicy {
    /// Extra attempts after the first (so `max_retries + 1` total).
    pub max_retries: u32,
    pub strategy: BackoffStrategy,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    /// Timeout applied to each individual attempt.
    pub request_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            strategy: BackoffStrategy::Exponential,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            request_timeout: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_strategy(mut self, strategy: BackoffStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_initial_delay(mut self, initial_delay: Duration) -> Self {
        self.initial_delay = initial_delay;
        self
    }

    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }

    pub fn with_request_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self
    }

    /// Un-jittered delay for attempt `attempt` (0-indexed).
    pub fn base_delay(&self, attempt: u32) -> Duration {
        let initial = self.initial_delay.as_secs_f64();
        let secs = match self.strategy {
            BackoffStrategy::Exponential => initial * 2f64.powi(attempt as i32),
            BackoffStrategy::Linear => initial * (attempt as f64 + 1.0),
        };
        Duration::from_secs_f64(secs)
    }

    /// Jittered, clamped delay for attempt `attempt`.
    pub fn delay_for<R: Rng + ?Sized>(&self, attempt: u32, rng: &mut R) -> Duration {
        let base = self.base_delay(attempt).as_secs_f64();
        // Uniform jitter in [-25%, +25%] of the base.
        let jitter = base * 0.25 * (rng.gen::<f64>() * 2.0 - 1.0);
        let delayed = (base + jitter).min(self.max_delay.as_secs_f64());
        Duration::from_secs_f64(delayed.max(0.0))
    }
}
