//! Observability events for a streaming pipeline, following the same
//! [`ResilienceEvent`] shape every other substrate crate emits on.

use std::time::Instant;

use substrate_core::ResilienceEvent;

#[derive(Debug, Clone)]
pub enum StreamingEvent {
    WriteAccepted {
        stream_id: String,
        sequence: u64,
        timestamp: Instant,
    },
    WriteRejected {
        stream_id: String,
        reason: &'static str,
        timestamp: Instant,
    },
    BatchPersisted {
        stream_id: String,
        count: usize,
        latency_ms: f64,
        timestamp: Instant,
    },
    BatchFailed {
        stream_id: String,
        count: usize,
        consecutive_failures: u32,
        timestamp: Instant,
    },
    DeadLettered {
        stream_id: String,
        count: usize,
        timestamp: Instant,
    },
    PermanentlyFailed {
        stream_id: String,
        count: usize,
        attempts: u32,
        timestamp: Instant,
    },
}

impl ResilienceEvent for StreamingEvent {
    fn event_type(&self) -> &'static str {
        match self {
            StreamingEvent::WriteAccepted { .. } => "write_accepted",
            StreamingEvent::WriteRejected { .. } => "write_rejected",
            StreamingEvent::BatchPersisted { .. } => "batch_persisted",
            StreamingEvent::BatchFailed { .. } => "batch_failed",
            StreamingEvent::DeadLettered { .. } => "dead_lettered",
            StreamingEvent::PermanentlyFailed { .. } => "permanently_failed",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            StreamingEvent::WriteAccepted { timestamp, .. }
            | StreamingEvent::WriteRejected { timestamp, .. }
            | StreamingEvent::BatchPersisted { timestamp, .. }
            | StreamingEvent::BatchFailed { timestamp, .. }
            | StreamingEvent::DeadLettered { timestamp, .. }
            | StreamingEvent::PermanentlyFailed { timestamp, .. } => *timestamp,
        }
    }

    fn pattern_name(&self) -> &str {
        match self {
            StreamingEvent::WriteAccepted { stream_id, .. }
            | StreamingEvent::WriteRejected { stream_id, .. }
            | StreamingEvent::BatchPersisted { stream_id, .. }
            | StreamingEvent::BatchFailed { stream_id, .. }
            | StreamingEvent::DeadLettered { stream_id, .. }
            | StreamingEvent::PermanentlyFailed { stream_id, .. } => stream_id,
        }
    }
}
