//! The resilient RPC client: validation, circuit-breaker admission, retry
//! with exponential backoff, and metric emission around a single downstream
//! call, per §4.1's six-step algorithm.

use std::marker::PhantomData;
use std::sync::Arc;
use std::time::{Duration, Instant};

use substrate_circuitbreaker::{CircuitBreakerConfig, CircuitBreakerHandle};
use substrate_retry::{ExponentialBackoff, IntervalFunction};

use crate::error::{RpcError, TransportError};
use crate::transport::DownstreamTransport;
use crate::validation::Validate;

/// Number of attempts per call before giving up, per §4.1 ("retry up to N=3
/// times").
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Configuration for one downstream's resilient client.
pub struct RpcClientConfig {
    pub(crate) operation: String,
    pub(crate) language: Option<String>,
    pub(crate) max_attempts: u32,
    pub(crate) per_attempt_timeout: Duration,
    pub(crate) backoff: Arc<dyn IntervalFunction>,
    pub(crate) breaker: CircuitBreakerConfigOrHandle,
}

pub(crate) enum CircuitBreakerConfigOrHandle {
    Builder(substrate_circuitbreaker::CircuitBreakerConfigBuilder),
    Handle(CircuitBreakerHandle),
}

impl RpcClientConfig {
    /// Starts a builder for the named operation (used as the breaker name and
    /// the `operation` metric label), with a per-attempt deadline. The
    /// deadline must be `<=` the operation's configured timeout, per §4.1.
    pub fn builder(operation: impl Into<String>, per_attempt_timeout: Duration) -> RpcClientConfigBuilder {
        RpcClientConfigBuilder {
            operation: operation.into(),
            language: None,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            per_attempt_timeout,
            backoff: Arc::new(ExponentialBackoff::new(Duration::from_millis(100)).max_interval(Duration::from_secs(5))),
            breaker: CircuitBreakerConfigOrHandle::Builder(CircuitBreakerConfig::builder().failure_threshold(5).success_threshold(2).cooldown(Duration::from_secs(60))),
        }
    }
}

pub struct RpcClientConfigBuilder {
    operation: String,
    language: Option<String>,
    max_attempts: u32,
    per_attempt_timeout: Duration,
    backoff: Arc<dyn IntervalFunction>,
    breaker: CircuitBreakerConfigOrHandle,
}

impl RpcClientConfigBuilder {
    /// Sets the `language` metric label attached to every call (empty by
    /// default, matching §2's "operation, language (where applicable)").
    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    /// Overrides the retry attempt cap. Default: 3 (§4.1).
    pub fn max_attempts(mut self, n: u32) -> Self {
        self.max_attempts = n;
        self
    }

    /// Overrides the backoff schedule between attempts.
    pub fn backoff(mut self, backoff: impl IntervalFunction + 'static) -> Self {
        self.backoff = Arc::new(backoff);
        self
    }

    /// Shares an existing circuit breaker (e.g. one owned by a per-downstream
    /// registry so every caller of the same downstream observes the same
    /// breaker state, per §9: "the same downstream seen by two different
    /// callers must share a breaker").
    pub fn shared_breaker(mut self, handle: CircuitBreakerHandle) -> Self {
        self.breaker = CircuitBreakerConfigOrHandle::Handle(handle);
        self
    }

    /// Overrides the breaker's failure/success thresholds and cooldown when
    /// this client owns its own breaker (ignored if `shared_breaker` was
    /// called).
    pub fn breaker_thresholds(mut self, failure_threshold: u32, success_threshold: u32, cooldown: Duration) -> Self {
        if let CircuitBreakerConfigOrHandle::Builder(b) = self.breaker {
            self.breaker = CircuitBreakerConfigOrHandle::Builder(
                b.failure_threshold(failure_threshold)
                    .success_threshold(success_threshold)
                    .cooldown(cooldown),
            );
        }
        self
    }

    pub fn build(self) -> RpcClientConfig {
        RpcClientConfig {
            operation: self.operation,
            language: self.language,
            max_attempts: self.max_attempts,
            per_attempt_timeout: self.per_attempt_timeout,
            backoff: self.backoff,
            breaker: self.breaker,
        }
    }
}

/// A circuit-broken, retried client fronting one downstream operation.
///
/// `Req` must implement [`Validate`]; `T` supplies the wire transport. The
/// same client type is reused for every downstream adapter (sandbox, file
/// processor, cyber scanner, knowledge store, LLM completion) by
/// instantiating it with a different `Req`/`Resp`/`T`.
pub struct ResilientRpcClient<Req, Resp, T> {
    transport: T,
    breaker: CircuitBreakerHandle,
    operation: String,
    language: String,
    max_attempts: u32,
    per_attempt_timeout: Duration,
    backoff: Arc<dyn IntervalFunction>,
    _phantom: PhantomData<fn(Req) -> Resp>,
}

impl<Req, Resp, T> ResilientRpcClient<Req, Resp, T>
where
    Req: Validate,
    T: DownstreamTransport<Req, Resp>,
{
    pub fn new(transport: T, config: RpcClientConfig) -> Self {
        let breaker = match config.breaker {
            CircuitBreakerConfigOrHandle::Handle(h) => h,
            CircuitBreakerConfigOrHandle::Builder(b) => {
                CircuitBreakerHandle::new(b.name(config.operation.clone()))
            }
        };
        Self {
            transport,
            breaker,
            operation: config.operation,
            language: config.language.unwrap_or_default(),
            max_attempts: config.max_attempts.max(1),
            per_attempt_timeout: config.per_attempt_timeout,
            backoff: config.backoff,
            _phantom: PhantomData,
        }
    }

    /// A handle to this client's breaker, for registries and dashboards.
    pub fn breaker(&self) -> &CircuitBreakerHandle {
        &self.breaker
    }

    /// Runs the six-step algorithm in §4.1: validate, admit, call with
    /// deadline, retry on transient failure, report to the breaker, emit a
    /// metric.
    pub async fn execute(&self, request: &Req) -> Result<Resp, RpcError> {
        request.validate().map_err(|e| match e {
            RpcError::Validation(msg) => RpcError::Validation(msg),
            other => other,
        })?;

        if !self.breaker.is_call_permitted() {
            self.emit_metric("unavailable");
            return Err(RpcError::Unavailable {
                operation: self.operation.clone(),
                retry_after: Duration::from_secs(60),
            });
        }

        let started = Instant::now();
        let mut last_error: Option<TransportError> = None;

        for attempt in 0..self.max_attempts {
            match self.transport.send(request, self.per_attempt_timeout).await {
                Ok(response) => {
                    self.breaker.record_success();
                    self.emit_metric("success");
                    return Ok(response);
                }
                Err(err) => {
                    let retryable = err.is_retryable();
                    last_error = Some(err);
                    if retryable && attempt + 1 < self.max_attempts {
                        tokio::time::sleep(self.backoff.next_interval(attempt as usize)).await;
                        continue;
                    }
                    break;
                }
            }
        }

        let err = last_error.expect("loop always assigns an error before breaking without returning Ok");
        self.breaker.record_failure();
        self.emit_metric("failure");

        if err.is_retryable() {
            Err(RpcError::Transient {
                operation: self.operation.clone(),
                attempts: self.max_attempts,
                source: err,
            })
        } else if started.elapsed() >= self.per_attempt_timeout && matches!(err, TransportError::Network(_)) {
            Err(RpcError::Timeout {
                operation: self.operation.clone(),
                elapsed: started.elapsed(),
            })
        } else {
            Err(RpcError::Permanent {
                operation: self.operation.clone(),
                source: err,
            })
        }
    }

    /// Delegates to the transport's health probe without consulting the
    /// breaker (§6, §SUPPLEMENTED FEATURES: a separate concern from breaker
    /// internals).
    pub async fn health(&self) -> bool {
        self.transport.health().await
    }

    fn emit_metric(&self, outcome: &'static str) {
        #[cfg(feature = "metrics")]
        substrate_core::metrics::record_rpc_outcome(&self.operation, &self.language, outcome);
        #[cfg(not(feature = "metrics"))]
        let _ = outcome;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct EchoRequest {
        fail_times: usize,
        valid: bool,
    }

    impl Validate for EchoRequest {
        fn validate(&self) -> Result<(), RpcError> {
            if self.valid {
                Ok(())
            } else {
                Err(RpcError::Validation("invalid".into()))
            }
        }
    }

    struct FlakyTransport {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl DownstreamTransport<EchoRequest, &'static str> for FlakyTransport {
        async fn send(&self, request: &EchoRequest, _deadline: Duration) -> Result<&'static str, TransportError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n < request.fail_times {
                Err(TransportError::ServerError {
                    status: 503,
                    body: "unavailable".into(),
                })
            } else {
                Ok("ok")
            }
        }

        async fn health(&self) -> bool {
            true
        }
    }

    fn fast_config(operation: &str) -> RpcClientConfig {
        RpcClientConfig::builder(operation, Duration::from_millis(50))
            .backoff(substrate_retry::FixedInterval::new(Duration::from_millis(1)))
            .build()
    }

    #[tokio::test]
    async fn succeeds_without_retry_when_first_attempt_ok() {
        let client = ResilientRpcClient::new(
            FlakyTransport { calls: AtomicUsize::new(0) },
            fast_config("echo"),
        );
        let resp = client.execute(&EchoRequest { fail_times: 0, valid: true }).await.unwrap();
        assert_eq!(resp, "ok");
        assert_eq!(client.breaker().state(), substrate_circuitbreaker::CircuitState::Closed);
    }

    #[tokio::test]
    async fn retries_transient_failures_then_succeeds() {
        let client = ResilientRpcClient::new(
            FlakyTransport { calls: AtomicUsize::new(0) },
            fast_config("echo"),
        );
        let resp = client.execute(&EchoRequest { fail_times: 2, valid: true }).await.unwrap();
        assert_eq!(resp, "ok");
    }

    #[tokio::test]
    async fn exhausts_retries_and_reports_breaker_failure() {
        let client = ResilientRpcClient::new(
            FlakyTransport { calls: AtomicUsize::new(0) },
            fast_config("echo"),
        );
        let err = client.execute(&EchoRequest { fail_times: 100, valid: true }).await.unwrap_err();
        assert!(matches!(err, RpcError::Transient { attempts: 3, .. }));
    }

    #[tokio::test]
    async fn validation_failure_never_touches_wire_or_breaker() {
        let client = ResilientRpcClient::new(
            FlakyTransport { calls: AtomicUsize::new(0) },
            fast_config("echo"),
        );
        let err = client.execute(&EchoRequest { fail_times: 0, valid: false }).await.unwrap_err();
        assert!(matches!(err, RpcError::Validation(_)));
        assert_eq!(client.transport.calls.load(Ordering::SeqCst), 0);
        assert_eq!(client.breaker().state(), substrate_circuitbreaker::CircuitState::Closed);
    }

    #[tokio::test]
    async fn open_breaker_rejects_without_touching_wire() {
        let client = ResilientRpcClient::new(
            FlakyTransport { calls: AtomicUsize::new(0) },
            RpcClientConfig::builder("echo", Duration::from_millis(50))
                .backoff(substrate_retry::FixedInterval::new(Duration::from_millis(1)))
                .breaker_thresholds(1, 2, Duration::from_secs(60))
                .build(),
        );
        let _ = client.execute(&EchoRequest { fail_times: 100, valid: true }).await;
        assert_eq!(client.breaker().state(), substrate_circuitbreaker::CircuitState::Open);

        let calls_before = client.transport.calls.load(Ordering::SeqCst);
        let err = client.execute(&EchoRequest { fail_times: 0, valid: true }).await.unwrap_err();
        assert!(matches!(err, RpcError::Unavailable { .. }));
        assert_eq!(client.transport.calls.load(Ordering::SeqCst), calls_before);
    }
}
