//! Events emitted by the circuit breaker for observability.

use std::time::Instant;

use substrate_core::ResilienceEvent;

use crate::circuit::CircuitState;

/// Events emitted by a [`crate::CircuitBreaker`] as it transitions and
/// admits or rejects calls.
#[derive(Debug, Clone)]
pub enum CircuitBreakerEvent {
    /// The breaker moved from one state to another.
    StateTransition {
        name: String,
        from_state: CircuitState,
        to_state: CircuitState,
        timestamp: Instant,
    },
    /// A call was admitted.
    CallPermitted {
        name: String,
        state: CircuitState,
        timestamp: Instant,
    },
    /// A call was rejected without touching the wire.
    CallRejected { name: String, timestamp: Instant },
    /// A call succeeded and was recorded.
    SuccessRecorded {
        name: String,
        state: CircuitState,
        timestamp: Instant,
    },
    /// A call failed and was recorded.
    FailureRecorded {
        name: String,
        state: CircuitState,
        timestamp: Instant,
    },
}

impl ResilienceEvent for CircuitBreakerEvent {
    fn event_type(&self) -> &'static str {
        match self {
            CircuitBreakerEvent::StateTransition { .. } => "state_transition",
            CircuitBreakerEvent::CallPermitted { .. } => "call_permitted",
            CircuitBreakerEvent::CallRejected { .. } => "call_rejected",
            CircuitBreakerEvent::SuccessRecorded { .. } => "success_recorded",
            CircuitBreakerEvent::FailureRecorded { .. } => "failure_recorded",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            CircuitBreakerEvent::StateTransition { timestamp, .. }
            | CircuitBreakerEvent::CallPermitted { timestamp, .. }
            | CircuitBreakerEvent::CallRejected { timestamp, .. }
            | CircuitBreakerEvent::SuccessRecorded { timestamp, .. }
            | CircuitBreakerEvent::FailureRecorded { timestamp, .. } => *timestamp,
        }
    }

    fn pattern_name(&self) -> &str {
        match self {
            CircuitBreakerEvent::StateTransition { name, .. }
            | CircuitBreakerEvent::CallPermitted { name, .. }
            | CircuitBreakerEvent::CallRejected { name, .. }
            | CircuitBreakerEvent::SuccessRecorded { name, .. }
            | CircuitBreakerEvent::FailureRecorded { name, .. } => name,
        }
    }
}
