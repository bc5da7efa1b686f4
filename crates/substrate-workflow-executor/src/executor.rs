//! The DAG executor itself (§4.5).

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::Value;
use substrate_core::EventListeners;
use substrate_workflow_planner::{WorkflowMode, WorkflowPlan, WorkflowStep};
use tokio::sync::Semaphore;

use crate::dispatch::StepDispatcher;
use crate::error::StepFailure;
use crate::events::ExecutorEvent;
use crate::reference;

const DEFAULT_MAX_CONCURRENT_STEPS: usize = 5;

/// A single step's terminal state, as recorded in the executor's result map.
#[derive(Debug, Clone)]
pub enum StepOutcome {
    Completed { data: Value },
    Failed { failure: StepFailure },
    Skipped,
}

impl StepOutcome {
    pub fn succeeded(&self) -> bool {
        matches!(self, StepOutcome::Completed { .. })
    }

    pub fn data(&self) -> Option<&Value> {
        match self {
            StepOutcome::Completed { data } => Some(data),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowOutcome {
    Completed,
    Failed,
    Degraded,
}

/// A failed step surfaced in a `degraded` or `failed` result, with a
/// human-readable suggestion derived from the error kind (§7).
#[derive(Debug, Clone)]
pub struct FailedStep {
    pub step_id: String,
    pub code: crate::error::FailureCode,
    pub message: String,
    pub suggestion: &'static str,
    /// Direct dependents impacted by this failure (§4.5 "impact assessment").
    pub impacted_steps: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct ExecutionResult {
    pub plan_id: String,
    pub outcome: WorkflowOutcome,
    pub results: HashMap<String, StepOutcome>,
    pub failed_steps: Vec<FailedStep>,
    pub parallelization_efficiency: f64,
    pub wall_clock: Duration,
}

pub struct ExecutorConfig {
    pub max_concurrent_steps: usize,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self { max_concurrent_steps: DEFAULT_MAX_CONCURRENT_STEPS }
    }
}

pub struct WorkflowExecutor<D: StepDispatcher> {
    dispatcher: Arc<D>,
    config: ExecutorConfig,
    events: EventListeners<ExecutorEvent>,
}

impl<D: StepDispatcher + 'static> WorkflowExecutor<D> {
    pub fn new(dispatcher: Arc<D>, config: ExecutorConfig) -> Self {
        Self { dispatcher, config, events: EventListeners::new() }
    }

    pub fn event_listeners(&self) -> &EventListeners<ExecutorEvent> {
        &self.events
    }

    /// Runs `plan` to completion per the §4.5 algorithm.
    pub async fn execute(&self, plan: &WorkflowPlan) -> ExecutionResult {
        let plan_id = plan.id.to_string();
        let started = Instant::now();
        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrent_steps.max(1)));

        let mut pending: HashSet<String> = plan.steps.iter().map(|s| s.id.clone()).collect();
        let mut results: HashMap<String, StepOutcome> = HashMap::new();
        let mut step_durations = Duration::ZERO;

        while !pending.is_empty() && started.elapsed() < plan.timeout {
            let ready: Vec<&WorkflowStep> = plan
                .steps
                .iter()
                .filter(|s| pending.contains(&s.id) && s.depends_on.iter().all(|d| results.contains_key(d)))
                .collect();

            if ready.is_empty() {
                break;
            }

            let (to_skip, to_run): (Vec<&WorkflowStep>, Vec<&WorkflowStep>) =
                ready.into_iter().partition(|s| {
                    plan.mode == WorkflowMode::Strict
                        && s.depends_on.iter().any(|d| {
                            results.get(d).map(|o| !o.succeeded()).unwrap_or(false)
                        })
                });

            for step in &to_skip {
                pending.remove(&step.id);
                results.insert(step.id.clone(), StepOutcome::Skipped);
                self.events.emit(&ExecutorEvent::StepSkipped {
                    plan_id: plan_id.clone(),
                    step_id: step.id.clone(),
                    timestamp: Instant::now(),
                });
            }

            if to_run.is_empty() {
                continue;
            }

            let futures = to_run.iter().map(|step| {
                self.run_step(&plan_id, step, &results, semaphore.clone())
            });
            let outcomes = futures::future::join_all(futures).await;

            for (step, (outcome, duration)) in to_run.into_iter().zip(outcomes) {
                pending.remove(&step.id);
                step_durations += duration;
                results.insert(step.id.clone(), outcome);
            }
        }

        if !pending.is_empty() {
            self.events.emit(&ExecutorEvent::Deadlocked {
                plan_id: plan_id.clone(),
                remaining: pending.len(),
                timestamp: Instant::now(),
            });
            for step_id in &pending {
                results.insert(step_id.clone(), StepOutcome::Skipped);
            }
        }

        let wall_clock = started.elapsed();
        let failed_steps = build_failed_steps(plan, &results);
        let succeeded = results.values().filter(|o| o.succeeded()).count();
        let outcome = if failed_steps.is_empty() && succeeded == plan.steps.len() {
            WorkflowOutcome::Completed
        } else if succeeded == 0 {
            WorkflowOutcome::Failed
        } else {
            WorkflowOutcome::Degraded
        };

        self.events.emit(&ExecutorEvent::PlanFinished {
            plan_id: plan_id.clone(),
            outcome: match outcome {
                WorkflowOutcome::Completed => "completed",
                WorkflowOutcome::Failed => "failed",
                WorkflowOutcome::Degraded => "degraded",
            },
            timestamp: Instant::now(),
        });

        let parallelization_efficiency = if wall_clock.is_zero() {
            1.0
        } else {
            (step_durations.as_secs_f64() / wall_clock.as_secs_f64()).min(1.0)
        };

        ExecutionResult { plan_id, outcome, results, failed_steps, parallelization_efficiency, wall_clock }
    }

    async fn run_step(
        &self,
        plan_id: &str,
        step: &WorkflowStep,
        results: &HashMap<String, StepOutcome>,
        semaphore: Arc<Semaphore>,
    ) -> (StepOutcome, Duration) {
        let _permit = semaphore.acquire_owned().await.expect("semaphore never closed");
        let start = Instant::now();

        self.events.emit(&ExecutorEvent::StepStarted {
            plan_id: plan_id.to_string(),
            step_id: step.id.clone(),
            timestamp: Instant::now(),
        });

        let resolved_input = reference::resolve(&step.input, results);
        let dispatched = tokio::time::timeout(
            step.timeout,
            self.dispatcher.dispatch(step.service, &step.operation, resolved_input),
        )
        .await;

        let outcome = match dispatched {
            Ok(Ok(data)) => {
                #[cfg(feature = "metrics")]
                substrate_core::metrics::record_workflow_step(
                    step.service.as_str(),
                    &step.operation,
                    "success",
                );
                self.events.emit(&ExecutorEvent::StepCompleted {
                    plan_id: plan_id.to_string(),
                    step_id: step.id.clone(),
                    timestamp: Instant::now(),
                });
                StepOutcome::Completed { data }
            }
            Ok(Err(failure)) => {
                #[cfg(feature = "metrics")]
                substrate_core::metrics::record_workflow_step(
                    step.service.as_str(),
                    &step.operation,
                    "failure",
                );
                self.events.emit(&ExecutorEvent::StepFailed {
                    plan_id: plan_id.to_string(),
                    step_id: step.id.clone(),
                    code: failure_code_label(failure.code),
                    timestamp: Instant::now(),
                });
                StepOutcome::Failed { failure }
            }
            Err(_elapsed) => {
                let failure = StepFailure::new(
                    crate::error::FailureCode::Timeout,
                    format!("step `{}` exceeded its {:?} deadline", step.id, step.timeout),
                );
                #[cfg(feature = "metrics")]
                substrate_core::metrics::record_workflow_step(
                    step.service.as_str(),
                    &step.operation,
                    "timeout",
                );
                self.events.emit(&ExecutorEvent::StepFailed {
                    plan_id: plan_id.to_string(),
                    step_id: step.id.clone(),
                    code: "TIMEOUT",
                    timestamp: Instant::now(),
                });
                StepOutcome::Failed { failure }
            }
        };

        (outcome, start.elapsed())
    }
}

fn failure_code_label(code: crate::error::FailureCode) -> &'static str {
    match code {
        crate::error::FailureCode::ServiceError => "SERVICE_ERROR",
        crate::error::FailureCode::Timeout => "TIMEOUT",
        crate::error::FailureCode::ValidationFailed => "VALIDATION_FAILED",
        crate::error::FailureCode::Unavailable => "UNAVAILABLE",
        crate::error::FailureCode::StepException => "STEP_EXCEPTION",
    }
}

/// For each failed step, the set of steps whose `dependsOn` directly
/// contains it (§4.5: "the transitive closure ... is not required for the
/// report").
fn build_failed_steps(plan: &WorkflowPlan, results: &HashMap<String, StepOutcome>) -> Vec<FailedStep> {
    let mut failed = Vec::new();
    for step in &plan.steps {
        let Some(StepOutcome::Failed { failure }) = results.get(&step.id) else { continue };
        let impacted_steps: Vec<String> = plan
            .steps
            .iter()
            .filter(|s| s.depends_on.contains(&step.id))
            .map(|s| s.id.clone())
            .collect();
        failed.push(FailedStep {
            step_id: step.id.clone(),
            code: failure.code,
            message: failure.message.clone(),
            suggestion: suggestion_for(failure.code),
            impacted_steps,
        });
    }
    failed
}

fn suggestion_for(code: crate::error::FailureCode) -> &'static str {
    match code {
        crate::error::FailureCode::ServiceError => {
            "the downstream returned an error; inspect its response for details"
        }
        crate::error::FailureCode::Timeout => "the step exceeded its deadline; it may succeed on retry",
        crate::error::FailureCode::ValidationFailed => "correct the step's input and resubmit",
        crate::error::FailureCode::Unavailable => {
            "the downstream is temporarily unavailable; retry later"
        }
        crate::error::FailureCode::StepException => "the step raised an unexpected error",
    }
}
