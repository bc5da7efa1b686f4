//! Parses a natural-language request into a validated, dependency-layered
//! workflow DAG (§4.4).
//!
//! The planner never calls a downstream service itself — it delegates
//! understanding to a [`CompletionModel`], then does the mechanical,
//! deterministic part: assigning ids and per-service default timeouts,
//! rejecting unknown `(service, operation)` pairs and dependency cycles, and
//! computing the topological [`model::WorkflowPlan::parallel_groups`]
//! layering the executor runs against. Ownership of the resulting plan
//! passes to the executor crate for the duration of a run (§3).

mod completion;
mod error;
mod events;
mod model;
mod planner;
mod registry;

pub use completion::{CompletionModel, ProposedPlan, ProposedStep, StaticCompletionModel};
pub use error::PlannerError;
pub use events::PlannerEvent;
pub use model::{
    PlanStatus, Service, StepStatus, WorkflowMode, WorkflowPlan, WorkflowPriority, WorkflowStep,
};
pub use planner::{plan_confidence, PlanOptions, WorkflowPlanner};
pub use registry::{is_known_operation, operations_for};
