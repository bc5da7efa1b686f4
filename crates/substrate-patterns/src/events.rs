//! Observability events for the pattern learning store.

use std::time::Instant;

use substrate_core::ResilienceEvent;

#[derive(Debug, Clone)]
pub enum PatternStoreEvent {
    LookupHit {
        composite_key: String,
        confidence: f64,
        timestamp: Instant,
    },
    LookupMiss {
        composite_key: String,
        timestamp: Instant,
    },
    Learned {
        composite_key: String,
        success: bool,
        confidence: f64,
        timestamp: Instant,
    },
    Pruned {
        composite_key: String,
        failure_rate: f64,
        timestamp: Instant,
    },
    OutcomeParseFailed {
        message_id: String,
        timestamp: Instant,
    },
}

impl ResilienceEvent for PatternStoreEvent {
    fn event_type(&self) -> &'static str {
        match self {
            PatternStoreEvent::LookupHit { .. } => "lookup_hit",
            PatternStoreEvent::LookupMiss { .. } => "lookup_miss",
            PatternStoreEvent::Learned { .. } => "learned",
            PatternStoreEvent::Pruned { .. } => "pruned",
            PatternStoreEvent::OutcomeParseFailed { .. } => "outcome_parse_failed",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            PatternStoreEvent::LookupHit { timestamp, .. }
            | PatternStoreEvent::LookupMiss { timestamp, .. }
            | PatternStoreEvent::Learned { timestamp, .. }
            | PatternStoreEvent::Pruned { timestamp, .. }
            | PatternStoreEvent::OutcomeParseFailed { timestamp, .. } => *timestamp,
        }
    }

    fn pattern_name(&self) -> &str {
        match self {
            PatternStoreEvent::LookupHit { composite_key, .. }
            | PatternStoreEvent::LookupMiss { composite_key, .. }
            | PatternStoreEvent::Learned { composite_key, .. }
            | PatternStoreEvent::Pruned { composite_key, .. } => composite_key,
            PatternStoreEvent::OutcomeParseFailed { message_id, .. } => message_id,
        }
    }
}
