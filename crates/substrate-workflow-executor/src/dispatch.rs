//! The seam between the DAG executor and the per-service resilient RPC
//! clients (§4.1 family). Kept generic over `serde_json::Value` so this
//! crate never needs to know the five downstream wire contracts — the
//! process root wires concrete `ResilientRpcClient`s behind this trait
//! (§9: "Singletons in source become explicit services").

use async_trait::async_trait;

use crate::error::StepFailure;
use substrate_workflow_planner::Service;

/// Dispatches one resolved step to its downstream and returns its response
/// body as JSON, or a typed [`StepFailure`].
#[async_trait]
pub trait StepDispatcher: Send + Sync {
    async fn dispatch(
        &self,
        service: Service,
        operation: &str,
        input: serde_json::Value,
    ) -> Result<serde_json::Value, StepFailure>;
}
