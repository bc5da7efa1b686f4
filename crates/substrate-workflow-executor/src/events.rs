//! Observability events for the workflow executor.

use std::time::Instant;

use substrate_core::ResilienceEvent;

#[derive(Debug, Clone)]
pub enum ExecutorEvent {
    StepStarted { plan_id: String, step_id: String, timestamp: Instant },
    StepCompleted { plan_id: String, step_id: String, timestamp: Instant },
    StepFailed { plan_id: String, step_id: String, code: &'static str, timestamp: Instant },
    StepSkipped { plan_id: String, step_id: String, timestamp: Instant },
    Deadlocked { plan_id: String, remaining: usize, timestamp: Instant },
    PlanFinished { plan_id: String, outcome: &'static str, timestamp: Instant },
}

impl ResilienceEvent for ExecutorEvent {
    fn event_type(&self) -> &'static str {
        match self {
            ExecutorEvent::StepStarted { .. } => "step_started",
            ExecutorEvent::StepCompleted { .. } => "step_completed",
            ExecutorEvent::StepFailed { .. } => "step_failed",
            ExecutorEvent::StepSkipped { .. } => "step_skipped",
            ExecutorEvent::Deadlocked { .. } => "deadlocked",
            ExecutorEvent::PlanFinished { .. } => "plan_finished",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            ExecutorEvent::StepStarted { timestamp, .. }
            | ExecutorEvent::StepCompleted { timestamp, .. }
            | ExecutorEvent::StepFailed { timestamp, .. }
            | ExecutorEvent::StepSkipped { timestamp, .. }
            | ExecutorEvent::Deadlocked { timestamp, .. }
            | ExecutorEvent::PlanFinished { timestamp, .. } => *timestamp,
        }
    }

    fn pattern_name(&self) -> &str {
        match self {
            ExecutorEvent::StepStarted { plan_id, .. }
            | ExecutorEvent::StepCompleted { plan_id, .. }
            | ExecutorEvent::StepFailed { plan_id, .. }
            | ExecutorEvent::StepSkipped { plan_id, .. }
            | ExecutorEvent::Deadlocked { plan_id, .. }
            | ExecutorEvent::PlanFinished { plan_id, .. } => plan_id,
        }
    }
}
