//! Executes a workflow DAG respecting dependencies, bounded parallelism,
//! and strict/best-effort failure propagation (§4.5).
//!
//! Ownership of a [`substrate_workflow_planner::WorkflowPlan`] passes from
//! the planner to this crate for the duration of a run (§3). Each ready
//! step's input is resolved against prior results' `${ref:stepId.field}`
//! placeholders ([`reference`]) before being handed to a [`StepDispatcher`]
//! the process root wires to the resilient RPC client family.

mod dispatch;
mod error;
mod events;
mod executor;
mod reference;

pub use dispatch::StepDispatcher;
pub use error::{FailureCode, StepFailure};
pub use events::ExecutorEvent;
pub use executor::{
    ExecutionResult, ExecutorConfig, FailedStep, StepOutcome, WorkflowExecutor, WorkflowOutcome,
};
pub use reference::resolve as resolve_references;
