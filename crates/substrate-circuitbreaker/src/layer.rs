use std::sync::Arc;

use tower::Layer;

use crate::circuit::Circuit;
use crate::classifier::{DefaultClassifier, FnClassifier};
use crate::config::CircuitBreakerConfig;
use crate::CircuitBreaker;

/// A Tower `Layer` that wraps an inner service with circuit breaker
/// admission control.
///
/// `C` is the failure classifier type; `CircuitBreakerLayer<DefaultClassifier>`
/// (the default) treats `Err` as failure. Use
/// [`CircuitBreakerConfigBuilder::failure_classifier`](crate::CircuitBreakerConfigBuilder::failure_classifier)
/// to classify some `Ok` responses (e.g. 5xx) as failures too.
///
/// ```rust
/// use tower::{ServiceBuilder, service_fn};
/// use substrate_circuitbreaker::CircuitBreakerLayer;
///
/// let layer = CircuitBreakerLayer::builder()
///     .failure_threshold(5)
///     .build();
///
/// let service = ServiceBuilder::new()
///     .layer(layer)
///     .service(service_fn(|req: String| async move { Ok::<_, std::io::Error>(req) }));
/// ```
#[derive(Clone)]
pub struct CircuitBreakerLayer<C = DefaultClassifier> {
    pub(crate) config: Arc<CircuitBreakerConfig<C>>,
    circuit: Arc<Circuit>,
}

impl<C> CircuitBreakerLayer<C> {
    pub(crate) fn new(config: CircuitBreakerConfig<C>) -> Self {
        let circuit = Arc::new(Circuit::new(
            config.failure_threshold,
            config.success_threshold,
            config.cooldown,
            config.name.clone(),
            config.event_listeners.clone(),
        ));
        Self {
            config: Arc::new(config),
            circuit,
        }
    }

    /// Builds a layer that shares circuit state with an already-constructed
    /// [`Circuit`], used to back a downstream-keyed registry where every
    /// caller of the same downstream must observe the same breaker.
    pub fn from_shared(config: Arc<CircuitBreakerConfig<C>>, circuit: Arc<Circuit>) -> Self {
        Self { config, circuit }
    }

    /// A handle to the underlying circuit, usable outside of the `Layer`
    /// machinery (e.g. by a registry, or for operator reset endpoints).
    pub fn circuit(&self) -> Arc<Circuit> {
        Arc::clone(&self.circuit)
    }

    pub fn layer_fn<S>(&self, service: S) -> CircuitBreaker<S, C>
    where
        C: Clone,
    {
        CircuitBreaker::new(service, Arc::clone(&self.config), Arc::clone(&self.circuit))
    }
}

impl CircuitBreakerLayer<DefaultClassifier> {
    pub fn builder() -> crate::CircuitBreakerConfigBuilder<DefaultClassifier> {
        crate::CircuitBreakerConfigBuilder::new()
    }
}

impl<S> Layer<S> for CircuitBreakerLayer<DefaultClassifier> {
    type Service = CircuitBreaker<S, DefaultClassifier>;

    fn layer(&self, service: S) -> Self::Service {
        self.layer_fn(service)
    }
}

impl<S, F> Layer<S> for CircuitBreakerLayer<FnClassifier<F>>
where
    F: Clone,
{
    type Service = CircuitBreaker<S, FnClassifier<F>>;

    fn layer(&self, service: S) -> Self::Service {
        self.layer_fn(service)
    }
}
