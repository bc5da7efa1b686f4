//! The LLM-vendor-neutral contract the planner parses a request through
//! (§4.4: "delegates to an external LLM constrained to emit JSON").

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::PlannerError;

/// One step as reported by the completion model, before the planner fills
/// in defaults and validates it against the operation registry.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProposedStep {
    pub id: Option<String>,
    pub name: Option<String>,
    pub service: String,
    pub operation: String,
    #[serde(default = "default_input")]
    pub input: Value,
    #[serde(default)]
    pub depends_on: Vec<String>,
    pub timeout_ms: Option<u64>,
}

fn default_input() -> Value {
    Value::Object(Default::default())
}

/// The raw document the completion model is constrained to emit (§4.4:
/// `{steps[], confidence?, clarifications?}`).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProposedPlan {
    pub steps: Vec<ProposedStep>,
    pub confidence: Option<f64>,
    #[serde(default)]
    pub clarifications: Vec<String>,
}

/// Abstracts over whichever LLM vendor turns a natural-language request
/// into a [`ProposedPlan`], keeping vendor SDKs out of the planner itself.
#[async_trait]
pub trait CompletionModel: Send + Sync {
    async fn propose_plan(&self, request: &str) -> Result<ProposedPlan, PlannerError>;
}

/// A fixed-response `CompletionModel` for tests and for callers that already
/// have a deterministic rule-based planner sitting in front of the LLM path.
pub struct StaticCompletionModel {
    plan: ProposedPlan,
}

impl StaticCompletionModel {
    pub fn new(plan: ProposedPlan) -> Self {
        Self { plan }
    }
}

#[async_trait]
impl CompletionModel for StaticCompletionModel {
    async fn propose_plan(&self, _request: &str) -> Result<ProposedPlan, PlannerError> {
        Ok(self.plan.clone())
    }
}
