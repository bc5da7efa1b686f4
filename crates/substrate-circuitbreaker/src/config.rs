use std::time::Duration;

use substrate_core::EventListeners;

use crate::classifier::DefaultClassifier;
use crate::events::CircuitBreakerEvent;

/// Configuration for a circuit breaker instance.
///
/// `C` is the failure classifier used to decide whether a given
/// `Result<Res, Err>` counts as a failure; see [`crate::classifier`].
pub struct CircuitBreakerConfig<C = DefaultClassifier> {
    pub(crate) failure_threshold: u32,
    pub(crate) success_threshold: u32,
    pub(crate) cooldown: Duration,
    pub(crate) classifier: C,
    pub(crate) event_listeners: EventListeners<CircuitBreakerEvent>,
    pub(crate) name: String,
}

impl CircuitBreakerConfig<DefaultClassifier> {
    pub fn builder() -> CircuitBreakerConfigBuilder<DefaultClassifier> {
        CircuitBreakerConfigBuilder::new()
    }
}

/// Builder for a [`CircuitBreakerConfig`].
pub struct CircuitBreakerConfigBuilder<C = DefaultClassifier> {
    failure_threshold: u32,
    success_threshold: u32,
    cooldown: Duration,
    classifier: C,
    event_listeners: EventListeners<CircuitBreakerEvent>,
    name: String,
}

impl CircuitBreakerConfigBuilder<DefaultClassifier> {
    pub fn new() -> Self {
        Self {
            failure_threshold: 5,
            success_threshold: 2,
            cooldown: Duration::from_secs(60),
            classifier: DefaultClassifier,
            event_listeners: EventListeners::new(),
            name: String::from("<unnamed>"),
        }
    }
}

impl Default for CircuitBreakerConfigBuilder<DefaultClassifier> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> CircuitBreakerConfigBuilder<C> {
    /// Number of consecutive failures while `Closed` before the breaker
    /// opens. Default: 5.
    pub fn failure_threshold(mut self, n: u32) -> Self {
        self.failure_threshold = n;
        self
    }

    /// Number of consecutive successes while `HalfOpen` before the breaker
    /// closes. Default: 2.
    pub fn success_threshold(mut self, n: u32) -> Self {
        self.success_threshold = n;
        self
    }

    /// How long the breaker stays `Open` before admitting a probe call.
    /// Default: 60s.
    pub fn cooldown(mut self, duration: Duration) -> Self {
        self.cooldown = duration;
        self
    }

    /// Give this breaker a human-readable name for observability.
    pub fn name<N: Into<String>>(mut self, n: N) -> Self {
        self.name = n.into();
        self
    }

    /// Replace the failure classifier.
    pub fn failure_classifier<C2>(self, classifier: C2) -> CircuitBreakerConfigBuilder<C2> {
        CircuitBreakerConfigBuilder {
            failure_threshold: self.failure_threshold,
            success_threshold: self.success_threshold,
            cooldown: self.cooldown,
            classifier,
            event_listeners: self.event_listeners,
            name: self.name,
        }
    }

    /// Register a callback for state transition events.
    pub fn on_state_transition<F>(mut self, f: F) -> Self
    where
        F: Fn(crate::CircuitState, crate::CircuitState) + Send + Sync + 'static,
    {
        use substrate_core::FnListener;
        self.event_listeners
            .add(FnListener::new(move |event: &CircuitBreakerEvent| {
                if let CircuitBreakerEvent::StateTransition {
                    from_state,
                    to_state,
                    ..
                } = event
                {
                    f(*from_state, *to_state);
                }
            }));
        self
    }

    /// Register a callback for call rejected events.
    pub fn on_call_rejected<F>(mut self, f: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        use substrate_core::FnListener;
        self.event_listeners
            .add(FnListener::new(move |event: &CircuitBreakerEvent| {
                if matches!(event, CircuitBreakerEvent::CallRejected { .. }) {
                    f();
                }
            }));
        self
    }

    /// Builds the configuration and returns a [`crate::CircuitBreakerLayer`].
    pub fn build(self) -> crate::layer::CircuitBreakerLayer<C> {
        let config = CircuitBreakerConfig {
            failure_threshold: self.failure_threshold,
            success_threshold: self.success_threshold,
            cooldown: self.cooldown,
            classifier: self.classifier,
            event_listeners: self.event_listeners,
            name: self.name,
        };
        crate::layer::CircuitBreakerLayer::new(config)
    }
}
