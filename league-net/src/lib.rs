//! League Net - resilient outbound transport
//!
//! Every outbound call a league agent makes goes through this crate:
//! - Retry with exponential/linear backoff and ±25% jitter
//! - Per-destination circuit breaker (CLOSED/OPEN/HALF_OPEN)
//! - Their composition over a pluggable send primitive
//!
//! Transport failures never surface as panics or errors: retry exhaustion
//! and an open breaker both yield a distinguished no-response outcome that
//! callers map to their own failure branch.

mod breaker;
mod client;
mod retry;

pub use breaker::{BreakerState, CircuitBreaker};
pub use client::{HttpTransport, ResilientClient, SendOutcome, Transport};
pub use retry::{BackoffStrategy, RetryPolicy};
