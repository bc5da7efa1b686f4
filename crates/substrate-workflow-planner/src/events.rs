//! Observability events for the workflow planner.

use std::time::Instant;

use substrate_core::ResilienceEvent;

#[derive(Debug, Clone)]
pub enum PlannerEvent {
    PlanCreated { correlation_id: String, step_count: usize, confidence: f64, timestamp: Instant },
    PlanRejected { correlation_id: String, reason: String, timestamp: Instant },
    ClarificationRequested { correlation_id: String, question: String, timestamp: Instant },
}

impl ResilienceEvent for PlannerEvent {
    fn event_type(&self) -> &'static str {
        match self {
            PlannerEvent::PlanCreated { .. } => "plan_created",
            PlannerEvent::PlanRejected { .. } => "plan_rejected",
            PlannerEvent::ClarificationRequested { .. } => "clarification_requested",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            PlannerEvent::PlanCreated { timestamp, .. }
            | PlannerEvent::PlanRejected { timestamp, .. }
            | PlannerEvent::ClarificationRequested { timestamp, .. } => *timestamp,
        }
    }

    fn pattern_name(&self) -> &str {
        match self {
            PlannerEvent::PlanCreated { correlation_id, .. }
            | PlannerEvent::PlanRejected { correlation_id, .. }
            | PlannerEvent::ClarificationRequested { correlation_id, .. } => correlation_id,
        }
    }
}
