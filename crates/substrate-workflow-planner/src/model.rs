//! The workflow data model (§3: `WorkflowStep`, `WorkflowPlan`), owned by
//! the planner and handed to the executor for the duration of a run.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use substrate_core::TenantContext;
use uuid::Uuid;

/// The downstream families a step can target (§3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Service {
    Fileprocess,
    Cyberagent,
    Sandbox,
    Mageagent,
    Graphrag,
}

impl Service {
    pub fn as_str(self) -> &'static str {
        match self {
            Service::Fileprocess => "fileprocess",
            Service::Cyberagent => "cyberagent",
            Service::Sandbox => "sandbox",
            Service::Mageagent => "mageagent",
            Service::Graphrag => "graphrag",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "fileprocess" => Some(Service::Fileprocess),
            "cyberagent" => Some(Service::Cyberagent),
            "sandbox" => Some(Service::Sandbox),
            "mageagent" => Some(Service::Mageagent),
            "graphrag" => Some(Service::Graphrag),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Skipped,
}

/// One typed call within a plan (§3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowStep {
    pub id: String,
    pub name: String,
    pub service: Service,
    pub operation: String,
    pub input: Value,
    pub depends_on: HashSet<String>,
    pub timeout: std::time::Duration,
    pub status: StepStatus,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WorkflowMode {
    Strict,
    BestEffort,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowPriority {
    Low,
    Normal,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Degraded,
}

/// The DAG the planner produces and the executor runs (§3). `parallel_groups`
/// is a topological layering: every step in group *k* depends only on steps
/// in groups `< k`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowPlan {
    pub id: Uuid,
    pub correlation_id: String,
    pub original_request: String,
    pub steps: Vec<WorkflowStep>,
    pub parallel_groups: Vec<Vec<String>>,
    pub status: PlanStatus,
    pub mode: WorkflowMode,
    pub priority: WorkflowPriority,
    pub timeout: std::time::Duration,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(skip)]
    pub tenant_context: Option<TenantContext>,
}

impl WorkflowPlan {
    pub fn step(&self, id: &str) -> Option<&WorkflowStep> {
        self.steps.iter().find(|s| s.id == id)
    }
}
