//! Errors the planner can raise (§7: `Validation`/`DataIntegrity` dispositions).

use substrate_core::{Kind, PlatformError};

#[derive(Debug, thiserror::Error)]
pub enum PlannerError {
    /// The completion model failed to produce a usable plan at all.
    #[error("completion model failed: {0}")]
    CompletionFailed(String),

    /// A step referenced a `(service, operation)` pair outside the registry.
    #[error("unknown operation: {service}.{operation}")]
    UnknownOperation { service: String, operation: String },

    /// The step graph contains a cycle.
    #[error("workflow plan contains a dependency cycle")]
    CyclicDependency,

    /// A step's `dependsOn` referenced an id not present in the plan.
    #[error("step `{step}` depends on unknown step `{dependency}`")]
    UnknownDependency { step: String, dependency: String },

    /// Two or more steps in the same plan share an id.
    #[error("duplicate step id `{0}` in proposed plan")]
    DuplicateStepId(String),
}

impl From<PlannerError> for PlatformError {
    fn from(err: PlannerError) -> Self {
        let kind = match &err {
            PlannerError::CompletionFailed(_) => Kind::Transient,
            PlannerError::UnknownOperation { .. }
            | PlannerError::CyclicDependency
            | PlannerError::UnknownDependency { .. }
            | PlannerError::DuplicateStepId(_) => Kind::Validation,
        };
        PlatformError::new(kind, err.to_string())
    }
}
