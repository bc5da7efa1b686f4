//! The three-state circuit breaker state machine.
//!
//! Unlike a rate-based sliding-window breaker, this implementation tracks a
//! simple consecutive-failure count, matching the state table in the design:
//! `Closed` accumulates consecutive failures until `failure_threshold`,
//! `Open` waits out `cooldown` before admitting a probe call into
//! `HalfOpen`, and `HalfOpen` returns to `Closed` after `success_threshold`
//! consecutive successes or back to `Open` on any single failure.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::events::CircuitBreakerEvent;
use substrate_core::EventListeners;

/// The three admission states of a circuit breaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

impl CircuitState {
    fn label(self) -> &'static str {
        match self {
            CircuitState::Closed => "closed",
            CircuitState::Open => "open",
            CircuitState::HalfOpen => "half_open",
        }
    }
}

/// A point-in-time snapshot of a circuit's counters, useful for dashboards
/// and tests.
#[derive(Debug, Clone, Copy)]
pub struct CircuitMetrics {
    pub state: CircuitState,
    pub failure_count: u32,
    pub success_count: u32,
    pub time_since_state_change: Duration,
}

struct Inner {
    state: CircuitState,
    failure_count: u32,
    success_count: u32,
    opened_at: Option<Instant>,
    state_changed_at: Instant,
}

/// The mutable circuit state machine plus its configuration, shared behind
/// an `Arc` by every clone of the `CircuitBreaker` service wrapping the same
/// downstream.
pub struct Circuit {
    inner: Mutex<Inner>,
    pub(crate) failure_threshold: u32,
    pub(crate) success_threshold: u32,
    pub(crate) cooldown: Duration,
    pub(crate) name: String,
    pub(crate) event_listeners: EventListeners<CircuitBreakerEvent>,
}

/// The outcome of an admission check.
pub enum Admission {
    /// The call may proceed; retains the state observed at decision time so
    /// callers don't need a second lock round-trip.
    Permitted(CircuitState),
    /// The call must be rejected without touching the wire.
    Rejected,
}

impl Circuit {
    pub fn new(
        failure_threshold: u32,
        success_threshold: u32,
        cooldown: Duration,
        name: String,
        event_listeners: EventListeners<CircuitBreakerEvent>,
    ) -> Self {
        Self {
            inner: Mutex::new(Inner {
                state: CircuitState::Closed,
                failure_count: 0,
                success_count: 0,
                opened_at: None,
                state_changed_at: Instant::now(),
            }),
            failure_threshold,
            success_threshold,
            cooldown,
            name,
            event_listeners,
        }
    }

    /// Current state, without mutating anything (does not perform the
    /// Open-to-HalfOpen cooldown check — use [`Circuit::try_acquire`] for
    /// that).
    pub fn state(&self) -> CircuitState {
        self.inner.lock().unwrap().state
    }

    fn transition(&self, inner: &mut Inner, to: CircuitState) {
        let from = inner.state;
        if from == to {
            return;
        }
        inner.state = to;
        inner.state_changed_at = Instant::now();
        match to {
            CircuitState::Open => inner.opened_at = Some(Instant::now()),
            CircuitState::Closed => {
                inner.failure_count = 0;
                inner.opened_at = None;
            }
            CircuitState::HalfOpen => inner.success_count = 0,
        }

        #[cfg(feature = "tracing")]
        tracing::info!(
            breaker = %self.name,
            from = from.label(),
            to = to.label(),
            "circuit breaker transitioned",
        );
        #[cfg(feature = "metrics")]
        substrate_core::metrics::record_breaker_transition(&self.name, from.label(), to.label());

        self.event_listeners.emit(&CircuitBreakerEvent::StateTransition {
            name: self.name.clone(),
            from_state: from,
            to_state: to,
            timestamp: Instant::now(),
        });
    }

    /// Asks the breaker for admission. Performs the Open→HalfOpen cooldown
    /// check inline, matching the design's "call attempt" trigger (the
    /// transition happens on the next attempted call, not on a background
    /// timer — see `DESIGN.md` for why that open question is resolved this
    /// way).
    pub fn try_acquire(&self) -> Admission {
        let mut inner = self.inner.lock().unwrap();
        match inner.state {
            CircuitState::Closed => {
                self.event_listeners.emit(&CircuitBreakerEvent::CallPermitted {
                    name: self.name.clone(),
                    state: CircuitState::Closed,
                    timestamp: Instant::now(),
                });
                Admission::Permitted(CircuitState::Closed)
            }
            CircuitState::HalfOpen => {
                self.event_listeners.emit(&CircuitBreakerEvent::CallPermitted {
                    name: self.name.clone(),
                    state: CircuitState::HalfOpen,
                    timestamp: Instant::now(),
                });
                Admission::Permitted(CircuitState::HalfOpen)
            }
            CircuitState::Open => {
                let elapsed = inner.opened_at.map(|t| t.elapsed()).unwrap_or_default();
                if elapsed >= self.cooldown {
                    self.transition(&mut inner, CircuitState::HalfOpen);
                    self.event_listeners.emit(&CircuitBreakerEvent::CallPermitted {
                        name: self.name.clone(),
                        state: CircuitState::HalfOpen,
                        timestamp: Instant::now(),
                    });
                    Admission::Permitted(CircuitState::HalfOpen)
                } else {
                    self.event_listeners.emit(&CircuitBreakerEvent::CallRejected {
                        name: self.name.clone(),
                        timestamp: Instant::now(),
                    });
                    Admission::Rejected
                }
            }
        }
    }

    /// Records a successful call.
    pub fn record_success(&self) {
        let mut inner = self.inner.lock().unwrap();
        match inner.state {
            CircuitState::Closed => {
                inner.failure_count = 0;
            }
            CircuitState::HalfOpen => {
                inner.success_count += 1;
                if inner.success_count >= self.success_threshold {
                    self.transition(&mut inner, CircuitState::Closed);
                }
            }
            CircuitState::Open => {}
        }
        self.event_listeners.emit(&CircuitBreakerEvent::SuccessRecorded {
            name: self.name.clone(),
            state: inner.state,
            timestamp: Instant::now(),
        });
    }

    /// Records a failed call.
    pub fn record_failure(&self) {
        let mut inner = self.inner.lock().unwrap();
        match inner.state {
            CircuitState::Closed => {
                inner.failure_count += 1;
                if inner.failure_count >= self.failure_threshold {
                    self.transition(&mut inner, CircuitState::Open);
                }
            }
            CircuitState::HalfOpen => {
                self.transition(&mut inner, CircuitState::Open);
            }
            CircuitState::Open => {}
        }
        self.event_listeners.emit(&CircuitBreakerEvent::FailureRecorded {
            name: self.name.clone(),
            state: inner.state,
            timestamp: Instant::now(),
        });
    }

    /// Operator escape hatch: force the breaker closed, discarding counters.
    pub fn force_closed(&self) {
        let mut inner = self.inner.lock().unwrap();
        self.transition(&mut inner, CircuitState::Closed);
    }

    /// Operator escape hatch: force the breaker open.
    pub fn force_open(&self) {
        let mut inner = self.inner.lock().unwrap();
        self.transition(&mut inner, CircuitState::Open);
    }

    /// Manual reset to `Closed`, as called out for operator use in the
    /// breaker's design ("A manual `reset` transition to Closed exists for
    /// operator use").
    pub fn reset(&self) {
        self.force_closed();
    }

    pub fn metrics(&self) -> CircuitMetrics {
        let inner = self.inner.lock().unwrap();
        CircuitMetrics {
            state: inner.state,
            failure_count: inner.failure_count,
            success_count: inner.success_count,
            time_since_state_change: inner.state_changed_at.elapsed(),
        }
    }
}
