//! The planner itself (§4.4): turns a `ProposedPlan` into a validated,
//! dependency-layered [`WorkflowPlan`].

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};

use substrate_core::{EventListeners, TenantContext};
use substrate_rpc::downstream::default_timeout_for_service;
use uuid::Uuid;

use crate::completion::{CompletionModel, ProposedPlan, ProposedStep};
use crate::error::PlannerError;
use crate::events::PlannerEvent;
use crate::model::{PlanStatus, Service, StepStatus, WorkflowMode, WorkflowPlan, WorkflowPriority, WorkflowStep};
use crate::registry::is_known_operation;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Clone)]
pub struct PlanOptions {
    pub mode: WorkflowMode,
    pub priority: WorkflowPriority,
    pub timeout: Duration,
}

impl Default for PlanOptions {
    fn default() -> Self {
        Self {
            mode: WorkflowMode::BestEffort,
            priority: WorkflowPriority::Normal,
            timeout: Duration::from_secs(600),
        }
    }
}

pub struct WorkflowPlanner<C: CompletionModel> {
    completion: Arc<C>,
    events: EventListeners<PlannerEvent>,
}

impl<C: CompletionModel> WorkflowPlanner<C> {
    pub fn new(completion: Arc<C>) -> Self {
        Self { completion, events: EventListeners::new() }
    }

    pub fn event_listeners(&self) -> &EventListeners<PlannerEvent> {
        &self.events
    }

    /// Parses `request` into a validated [`WorkflowPlan`] (§4.4).
    pub async fn plan(
        &self,
        request: &str,
        options: PlanOptions,
        tenant_context: Option<TenantContext>,
    ) -> Result<WorkflowPlan, PlannerError> {
        let correlation_id = tenant_context
            .as_ref()
            .map(|t| t.request_id.clone())
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        let proposed = match self.completion.propose_plan(request).await {
            Ok(p) => p,
            Err(err) => {
                self.events.emit(&PlannerEvent::PlanRejected {
                    correlation_id: correlation_id.clone(),
                    reason: err.to_string(),
                    timestamp: Instant::now(),
                });
                return Err(err);
            }
        };

        for clarification in &proposed.clarifications {
            self.events.emit(&PlannerEvent::ClarificationRequested {
                correlation_id: correlation_id.clone(),
                question: clarification.clone(),
                timestamp: Instant::now(),
            });
        }

        let llm_confidence = proposed.confidence;
        match self.build_plan(request, &correlation_id, proposed, options, tenant_context) {
            Ok(plan) => {
                self.events.emit(&PlannerEvent::PlanCreated {
                    correlation_id: correlation_id.clone(),
                    step_count: plan.steps.len(),
                    confidence: plan_confidence(&plan, llm_confidence),
                    timestamp: Instant::now(),
                });
                Ok(plan)
            }
            Err(err) => {
                self.events.emit(&PlannerEvent::PlanRejected {
                    correlation_id,
                    reason: err.to_string(),
                    timestamp: Instant::now(),
                });
                Err(err)
            }
        }
    }

    fn build_plan(
        &self,
        request: &str,
        correlation_id: &str,
        proposed: ProposedPlan,
        options: PlanOptions,
        tenant_context: Option<TenantContext>,
    ) -> Result<WorkflowPlan, PlannerError> {
        let steps = assign_steps(proposed.steps)?;
        validate_dependencies(&steps)?;
        let parallel_groups = compute_parallel_groups(&steps)?;

        Ok(WorkflowPlan {
            id: Uuid::new_v4(),
            correlation_id: correlation_id.to_string(),
            original_request: request.to_string(),
            steps,
            parallel_groups,
            status: PlanStatus::Pending,
            mode: options.mode,
            priority: options.priority,
            timeout: options.timeout,
            created_at: chrono::Utc::now(),
            started_at: None,
            completed_at: None,
            tenant_context,
        })
    }
}

/// Recognized-operation proportion combined (by minimum) with the
/// completion model's self-reported confidence, when present (§4.4).
pub fn plan_confidence(plan: &WorkflowPlan, llm_confidence: Option<f64>) -> f64 {
    if plan.steps.is_empty() {
        return 0.0;
    }
    let recognized = plan
        .steps
        .iter()
        .filter(|s| is_known_operation(s.service, &s.operation))
        .count();
    let proportion = recognized as f64 / plan.steps.len() as f64;
    match llm_confidence {
        Some(c) => proportion.min(c),
        None => proportion,
    }
}

fn assign_steps(proposed: Vec<ProposedStep>) -> Result<Vec<WorkflowStep>, PlannerError> {
    let mut steps = Vec::with_capacity(proposed.len());
    for step in proposed {
        let service = Service::parse(&step.service).ok_or_else(|| PlannerError::UnknownOperation {
            service: step.service.clone(),
            operation: step.operation.clone(),
        })?;
        if !is_known_operation(service, &step.operation) {
            return Err(PlannerError::UnknownOperation {
                service: step.service.clone(),
                operation: step.operation.clone(),
            });
        }

        let timeout = step
            .timeout_ms
            .map(Duration::from_millis)
            .or_else(|| default_timeout_for_service(service.as_str()))
            .unwrap_or(DEFAULT_TIMEOUT);

        let id = step.id.unwrap_or_else(|| Uuid::new_v4().to_string());
        steps.push(WorkflowStep {
            name: step.name.unwrap_or_else(|| format!("{}.{}", service.as_str(), step.operation)),
            id,
            service,
            operation: step.operation,
            input: step.input,
            depends_on: step.depends_on.into_iter().collect(),
            timeout,
            status: StepStatus::Pending,
            started_at: None,
            completed_at: None,
            error: None,
        });
    }
    Ok(steps)
}

fn validate_dependencies(steps: &[WorkflowStep]) -> Result<(), PlannerError> {
    let mut ids: HashSet<&str> = HashSet::with_capacity(steps.len());
    for step in steps {
        if !ids.insert(step.id.as_str()) {
            return Err(PlannerError::DuplicateStepId(step.id.clone()));
        }
    }
    for step in steps {
        for dep in &step.depends_on {
            if !ids.contains(dep.as_str()) {
                return Err(PlannerError::UnknownDependency {
                    step: step.id.clone(),
                    dependency: dep.clone(),
                });
            }
        }
    }
    Ok(())
}

/// `level(s) = 0` if `depends_on(s) = ∅`, else `1 + max(level(d))` (§4.4).
/// Computed iteratively (Kahn's algorithm) so a cycle is detected rather
/// than overflowing recursion.
fn compute_parallel_groups(steps: &[WorkflowStep]) -> Result<Vec<Vec<String>>, PlannerError> {
    let remaining_deps: HashMap<&str, HashSet<&str>> = steps
        .iter()
        .map(|s| (s.id.as_str(), s.depends_on.iter().map(|d| d.as_str()).collect()))
        .collect();
    let mut resolved: HashSet<&str> = HashSet::new();
    let mut groups: Vec<Vec<String>> = Vec::new();

    while resolved.len() < steps.len() {
        let ready: Vec<&str> = remaining_deps
            .iter()
            .filter(|(id, deps)| !resolved.contains(*id) && deps.iter().all(|d| resolved.contains(d)))
            .map(|(id, _)| *id)
            .collect();

        if ready.is_empty() {
            return Err(PlannerError::CyclicDependency);
        }

        let mut group: Vec<String> = ready.iter().map(|s| s.to_string()).collect();
        group.sort();
        for id in &ready {
            resolved.insert(id);
        }
        groups.push(group);
    }

    Ok(groups)
}
