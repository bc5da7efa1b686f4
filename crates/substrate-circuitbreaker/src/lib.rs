//! Circuit breaker pattern for Tower services.
//!
//! A circuit breaker prevents cascading failures by monitoring consecutive
//! call outcomes and temporarily blocking requests once a failure threshold
//! is crossed.
//!
//! ## States
//! - **Closed**: normal operation; a run of consecutive failures is tracked.
//! - **Open**: requests are rejected immediately until `cooldown` elapses.
//! - **HalfOpen**: a probe call (or several) is allowed through; enough
//!   consecutive successes close the breaker, any failure reopens it.
//!
//! ```rust
//! use substrate_circuitbreaker::CircuitBreakerLayer;
//! use tower::{ServiceBuilder, Service, service_fn};
//!
//! # async fn example() {
//! let layer = CircuitBreakerLayer::builder()
//!     .failure_threshold(5)
//!     .success_threshold(2)
//!     .build();
//!
//! let mut service = ServiceBuilder::new()
//!     .layer(layer)
//!     .service(service_fn(|req: String| async move { Ok::<_, std::io::Error>(req) }));
//!
//! let _ = service.call("hello".to_string()).await;
//! # }
//! ```

mod circuit;
mod classifier;
mod config;
mod error;
mod events;
mod layer;

pub use circuit::{Admission, Circuit, CircuitMetrics, CircuitState};
pub use classifier::{DefaultClassifier, FailureClassifier, FnClassifier};
pub use config::{CircuitBreakerConfig, CircuitBreakerConfigBuilder};
pub use error::CircuitBreakerError;
pub use events::CircuitBreakerEvent;
pub use layer::CircuitBreakerLayer;

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::future::BoxFuture;
use tower::Service;

/// A Tower `Service` that applies circuit breaker admission control to an
/// inner service.
pub struct CircuitBreaker<S, C = DefaultClassifier> {
    inner: S,
    config: Arc<CircuitBreakerConfig<C>>,
    circuit: Arc<Circuit>,
}

impl<S: Clone, C> Clone for CircuitBreaker<S, C> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            config: Arc::clone(&self.config),
            circuit: Arc::clone(&self.circuit),
        }
    }
}

impl<S, C> CircuitBreaker<S, C> {
    pub(crate) fn new(inner: S, config: Arc<CircuitBreakerConfig<C>>, circuit: Arc<Circuit>) -> Self {
        Self {
            inner,
            config,
            circuit,
        }
    }

    /// Current breaker state, without mutating it.
    pub fn state(&self) -> CircuitState {
        self.circuit.state()
    }

    /// A point-in-time metrics snapshot.
    pub fn metrics(&self) -> CircuitMetrics {
        self.circuit.metrics()
    }

    /// Operator escape hatch: force the breaker closed.
    pub fn force_closed(&self) {
        self.circuit.force_closed();
    }

    /// Operator escape hatch: force the breaker open.
    pub fn force_open(&self) {
        self.circuit.force_open();
    }

    /// Manual reset to `Closed`.
    pub fn reset(&self) {
        self.circuit.reset();
    }

    /// A handle to the shared circuit, for use by a per-downstream registry.
    pub fn circuit(&self) -> Arc<Circuit> {
        Arc::clone(&self.circuit)
    }
}

impl<S, Req, C> Service<Req> for CircuitBreaker<S, C>
where
    S: Service<Req> + Clone + Send + 'static,
    S::Future: Send + 'static,
    S::Response: Send + 'static,
    S::Error: Send + 'static,
    Req: Send + 'static,
    C: FailureClassifier<S::Response, S::Error> + Clone + Send + Sync + 'static,
{
    type Response = S::Response;
    type Error = CircuitBreakerError<S::Error>;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx).map_err(CircuitBreakerError::Inner)
    }

    fn call(&mut self, req: Req) -> Self::Future {
        let circuit = Arc::clone(&self.circuit);
        let classifier = self.config.classifier.clone();
        let mut inner = self.inner.clone();

        Box::pin(async move {
            match circuit.try_acquire() {
                Admission::Rejected => Err(CircuitBreakerError::OpenCircuit),
                Admission::Permitted(_) => {
                    let result = inner.call(req).await;
                    if classifier.classify(&result) {
                        circuit.record_failure();
                    } else {
                        circuit.record_success();
                    }
                    result.map_err(CircuitBreakerError::Inner)
                }
            }
        })
    }
}

/// A plain, non-Tower handle to a circuit breaker, useful for components
/// that gate an operation without going through a `tower::Service` (the
/// streaming pipeline's per-stream breaker and the pattern store's consumer
/// loop both use this directly).
#[derive(Clone)]
pub struct CircuitBreakerHandle {
    circuit: Arc<Circuit>,
}

impl CircuitBreakerHandle {
    pub fn new(config: CircuitBreakerConfigBuilder) -> Self {
        let layer = config.build();
        Self {
            circuit: layer.circuit(),
        }
    }

    pub fn is_call_permitted(&self) -> bool {
        matches!(self.circuit.try_acquire(), Admission::Permitted(_))
    }

    pub fn record_success(&self) {
        self.circuit.record_success();
    }

    pub fn record_failure(&self) {
        self.circuit.record_failure();
    }

    pub fn state(&self) -> CircuitState {
        self.circuit.state()
    }

    pub fn reset(&self) {
        self.circuit.reset();
    }

    /// A point-in-time counters snapshot, for callers that want to label
    /// events with the breaker's current consecutive-failure count.
    pub fn metrics(&self) -> CircuitMetrics {
        self.circuit.metrics()
    }
}
