//! Resilient RPC client - retry and breaker composed over a send primitive
//!
//! The breaker is consulted before any network attempt; an open circuit
//! short-circuits to no-response. Otherwise the retrying send runs, and the
//! breaker records the final outcome of the whole call, not each attempt.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use league_proto::{Envelope, LeagueError, RpcRequest, RpcResponse};
use serde_json::Value;
use tracing::{debug, error, warn};

use crate::breaker::CircuitBreaker;
use crate::retry::RetryPolicy;

/// The generic "send one request" primitive the transport layer wraps.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(
        &self,
        url: &str,
        request: &RpcRequest,
        timeout: Duration,
    ) -> Result<RpcResponse, LeagueError>;
}

/// HTTP POST transport over reqwest.
#[derive(Clone, Debug, Default)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(
        &self,
        url: &str,
        request: &RpcRequest,
        timeout: Duration,
    ) -> Result<RpcResponse, LeagueError> {
        let response = self
            .client
            .post(url)
            .json(request)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LeagueError::Timeout(timeout.as_secs_f64())
                } else {
                    LeagueError::Connection(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(LeagueError::Connection(format!("HTTP {}", status)));
        }

        // A malformed body is an application error, not a network one.
        let rpc: RpcResponse = response
            .json()
            .await
            .map_err(|e| LeagueError::Serialization(serde_json::Error::io(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                e.to_string(),
            ))))?;
        Ok(rpc)
    }
}

/// Final outcome of a resilient call. Exhaustion and an open breaker are
/// data, not errors.
#[derive(Debug)]
pub enum SendOutcome {
    Response(RpcResponse),
    NoResponse,
}

impl SendOutcome {
    pub fn into_response(self) -> Option<RpcResponse> {
        match self {
            SendOutcome::Response(r) => Some(r),
            SendOutcome::NoResponse => None,
        }
    }
}

/// Retry + circuit breaker over a transport, breakers keyed per destination.
pub struct ResilientClient<T: Transport = HttpTransport> {
    transport: T,
    policy: RetryPolicy,
    failure_threshold: u32,
    recovery_timeout: Duration,
    breakers: RwLock<HashMap<String, Arc<CircuitBreaker>>>,
}

impl ResilientClient<HttpTransport> {
    pub fn http(policy: RetryPolicy) -> Self {
        Self::new(HttpTransport::new(), policy, 5, Duration::from_secs(30))
    }
}

impl<T: Transport> ResilientClient<T> {
    pub fn new(
        transport: T,
        policy: RetryPolicy,
        failure_threshold: u32,
        recovery_timeout: Duration,
    ) -> Self {
        Self {
            transport,
            policy,
            failure_threshold,
            recovery_timeout,
            breakers: RwLock::new(HashMap::new()),
        }
    }

    /// The underlying transport, mostly useful to test doubles.
    pub fn transport_ref(&self) -> &T {
        &self.transport
    }

    /// Record a breaker failure for a destination whose in-flight call was
    /// abandoned before it completed (an outer deadline cancelled `send`
    /// mid-retry, so neither outcome was recorded).
    pub fn note_failure(&self, url: &str) {
        self.breaker_for(url).record_failure();
    }

    /// Breaker for a destination, created on first use.
    fn breaker_for(&self, url: &str) -> Arc<CircuitBreaker> {
        if let Some(b) = self
            .breakers
            .read()
            .expect("breaker map lock poisoned")
            .get(url)
        {
            return Arc::clone(b);
        }
        let mut map = self.breakers.write().expect("breaker map lock poisoned");
        Arc::clone(map.entry(url.to_string()).or_insert_with(|| {
            Arc::new(CircuitBreaker::new(
                self.failure_threshold,
                self.recovery_timeout,
            ))
        }))
    }

    /// Send one request with full resilience.
    ///
    /// Returns `Ok(NoResponse)` when the breaker rejects or retries are
    /// exhausted, and `Err` only for non-network application errors.
    pub async fn send(
        &self,
        url: &str,
        request: &RpcRequest,
    ) -> Result<SendOutcome, LeagueError> {
        let breaker = self.breaker_for(url);
        if !breaker.can_execute() {
            warn!(url, "circuit open, rejecting call without network attempt");
            return Ok(SendOutcome::NoResponse);
        }

        match self.send_with_retry(url, request).await {
            Ok(Some(response)) => {
                breaker.record_success();
                Ok(SendOutcome::Response(response))
            }
            Ok(None) => {
                breaker.record_failure();
                Ok(SendOutcome::NoResponse)
            }
            Err(e) => {
                breaker.record_failure();
                Err(e)
            }
        }
    }

    /// Convenience: wrap an envelope in a JSON-RPC frame and send it.
    pub async fn call(
        &self,
        url: &str,
        method: &str,
        envelope: &Envelope,
        id: Value,
    ) -> Result<SendOutcome, LeagueError> {
        let request = RpcRequest::new(method, serde_json::to_value(envelope)?, id);
        self.send(url, &request).await
    }

    /// Sequential attempts: `max_retries + 1` total, sleeping the jittered
    /// backoff between them. Only transport-transient errors are retried.
    async fn send_with_retry(
        &self,
        url: &str,
        request: &RpcRequest,
    ) -> Result<Option<RpcResponse>, LeagueError> {
        for attempt in 0..=self.policy.max_retries {
            match self
                .transport
                .send(url, request, self.policy.request_timeout)
                .await
            {
                Ok(response) => {
                    if attempt > 0 {
                        debug!(url, attempt, "retry succeeded");
                    }
                    return Ok(Some(response));
                }
                Err(e) if e.is_retryable() => {
                    warn!(url, attempt, error = %e, "attempt failed");
                    if attempt < self.policy.max_retries {
                        let delay = {
                            let mut rng = rand::thread_rng();
                            self.policy.delay_for(attempt, &mut rng)
                        };
                        debug!(url, delay_ms = delay.as_millis() as u64, "backing off");
                        tokio::time::sleep(delay).await;
                    }
                }
                Err(e) => return Err(e),
            }
        }

        error!(url, max_retries = self.policy.max_retries, "retries exhausted");
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::breaker::BreakerState;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    /// Scripted transport: pops one result per attempt.
    struct FakeTransport {
        script: Mutex<VecDeque<Result<RpcResponse, LeagueError>>>,
        attempts: AtomicU32,
    }

    impl FakeTransport {
        fn new(script: Vec<Result<RpcResponse, LeagueError>>) -> Self {
            Self {
                script: Mutex::new(script.into()),
                attempts: AtomicU32::new(0),
            }
        }

        fn attempts(&self) -> u32 {
            self.attempts.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Transport for FakeTransport {
        async fn send(
            &self,
            _url: &str,
            _request: &RpcRequest,
            _timeout: Duration,
        ) -> Result<RpcResponse, LeagueError> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(LeagueError::Connection("script exhausted".into())))
        }
    }

    fn ok_response() -> RpcResponse {
        RpcResponse::success(json!(1), json!({"accept": true}))
    }

    fn fast_policy() -> RetryPolicy {
        RetryPolicy::default()
            .with_max_retries(2)
            .with_initial_delay(Duration::from_millis(1))
            .with_max_delay(Duration::from_millis(2))
    }

    fn client_with(
        script: Vec<Result<RpcResponse, LeagueError>>,
    ) -> ResilientClient<FakeTransport> {
        ResilientClient::new(
            FakeTransport::new(script),
            fast_policy(),
            3,
            Duration::from_millis(20),
        )
    }

    fn request() -> RpcRequest {
        RpcRequest::new("health", json!({}), json!(1))
    }

    #[tokio::test]
    async fn test_first_attempt_success() {
        let client = client_with(vec![Ok(ok_response())]);
        let outcome = client.send("http://p1", &request()).await.unwrap();
        assert!(outcome.into_response().is_some());
        assert_eq!(client.transport.attempts(), 1);
    }

    #[tokio::test]
    async fn test_retries_transient_errors_then_succeeds() {
        let client = client_with(vec![
            Err(LeagueError::Timeout(0.1)),
            Err(LeagueError::Connection("refused".into())),
            Ok(ok_response()),
        ]);
        let outcome = client.send("http://p1", &request()).await.unwrap();
        assert!(outcome.into_response().is_some());
        assert_eq!(client.transport.attempts(), 3);
    }

    #[tokio::test]
    async fn test_exhaustion_yields_no_response() {
        let client = client_with(vec![
            Err(LeagueError::Timeout(0.1)),
            Err(LeagueError::Timeout(0.1)),
            Err(LeagueError::Timeout(0.1)),
        ]);
        let outcome = client.send("http://p1", &request()).await.unwrap();
        assert!(outcome.into_response().is_none());
        // max_retries = 2 means 3 total attempts.
        assert_eq!(client.transport.attempts(), 3);
    }

    #[tokio::test]
    async fn test_application_error_not_retried() {
        let client = client_with(vec![Err(LeagueError::InvalidParityChoice("prime".into()))]);
        let result = client.send("http://p1", &request()).await;
        assert!(result.is_err());
        assert_eq!(client.transport.attempts(), 1);
    }

    #[tokio::test]
    async fn test_breaker_opens_after_repeated_exhaustion() {
        // Every attempt times out; each full send records one breaker failure.
        let script: Vec<_> = (0..9).map(|_| Err(LeagueError::Timeout(0.1))).collect();
        let client = client_with(script);

        for _ in 0..3 {
            let outcome = client.send("http://p1", &request()).await.unwrap();
            assert!(outcome.into_response().is_none());
        }
        assert_eq!(client.breaker_for("http://p1").state(), BreakerState::Open);
        assert_eq!(client.transport.attempts(), 9);

        // Open circuit: rejected with no further network attempts.
        let outcome = client.send("http://p1", &request()).await.unwrap();
        assert!(outcome.into_response().is_none());
        assert_eq!(client.transport.attempts(), 9);
    }

    #[tokio::test]
    async fn test_breaker_recovers_through_half_open() {
        let mut script: Vec<_> = (0..9)
            .map(|_| Err(LeagueError::Timeout(0.1)))
            .collect::<Vec<_>>();
        script.push(Ok(ok_response()));
        let client = client_with(script);

        for _ in 0..3 {
            client.send("http://p1", &request()).await.unwrap();
        }
        assert_eq!(client.breaker_for("http://p1").state(), BreakerState::Open);

        tokio::time::sleep(Duration::from_millis(25)).await;
        let outcome = client.send("http://p1", &request()).await.unwrap();
        assert!(outcome.into_response().is_some());
        assert_eq!(
            client.breaker_for("http://p1").state(),
            BreakerState::Closed
        );
    }

    #[tokio::test]
    async fn test_noted_failures_open_the_breaker() {
        // A caller that abandons calls (outer deadline) reports them here;
        // they count toward the threshold like any completed failure.
        let client = client_with(vec![Ok(ok_response())]);
        for _ in 0..3 {
            client.note_failure("http://p1");
        }
        assert_eq!(client.breaker_for("http://p1").state(), BreakerState::Open);

        // Short-circuits without touching the transport.
        let outcome = client.send("http://p1", &request()).await.unwrap();
        assert!(outcome.into_response().is_none());
        assert_eq!(client.transport.attempts(), 0);
    }

    #[tokio::test]
    async fn test_breakers_are_per_destination() {
        let script: Vec<_> = (0..9).map(|_| Err(LeagueError::Timeout(0.1))).collect();
        let client = client_with(script);

        for _ in 0..3 {
            client.send("http://p1", &request()).await.unwrap();
        }
        assert_eq!(client.breaker_for("http://p1").state(), BreakerState::Open);
        assert_eq!(
            client.breaker_for("http://p2").state(),
            BreakerState::Closed
        );
    }
}
