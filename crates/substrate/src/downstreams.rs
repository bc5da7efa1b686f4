//! Wires the five downstream families named in §6 into concrete
//! [`substrate_rpc::ResilientRpcClient`] instances, fronted by a single
//! [`StepDispatcher`] the workflow executor calls into (§9: "Singletons in
//! source become explicit services... registry owned by the process root").
//!
//! `graphrag` exposes two operations (`query`, `store`) against one
//! downstream, so its two clients share a single [`CircuitBreakerHandle`] —
//! the same downstream seen by two different callers must share a breaker,
//! per `substrate_rpc::client`'s own design note.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use substrate_circuitbreaker::{CircuitBreakerConfig, CircuitBreakerHandle};
use substrate_rpc::client::{RpcClientConfig, RpcClientConfigBuilder};
use substrate_rpc::downstream::{
    CyberScanRequest, CyberScanResponse, FileProcessRequest, FileProcessResponse,
    KnowledgeStoreRequest, KnowledgeStoreResponse, LlmCompletionRequest, LlmCompletionResponse,
    SandboxRequest, SandboxResponse,
};
use substrate_rpc::transport::{DownstreamTransport, ReqwestTransport};
use substrate_rpc::validation::Validate;
use substrate_rpc::ResilientRpcClient;
use substrate_workflow_executor::{FailureCode, StepDispatcher, StepFailure};
use substrate_workflow_planner::Service;

use crate::config::{DownstreamConfig, PlatformConfig};

type Client<Req, Resp> = ResilientRpcClient<Req, Resp, ReqwestTransport<Req, Resp>>;

fn client_config(operation: &str, downstream: &DownstreamConfig) -> RpcClientConfigBuilder {
    RpcClientConfig::builder(operation, downstream.timeout).breaker_thresholds(
        downstream.failure_threshold,
        downstream.success_threshold,
        downstream.cooldown,
    )
}

/// Owns one resilient client per downstream operation, built once at process
/// start from [`PlatformConfig`].
pub struct DownstreamRegistry {
    sandbox: Client<SandboxRequest, SandboxResponse>,
    fileprocess: Client<FileProcessRequest, FileProcessResponse>,
    cyberagent: Client<CyberScanRequest, CyberScanResponse>,
    mageagent: Client<LlmCompletionRequest, LlmCompletionResponse>,
    graphrag_query: Client<KnowledgeStoreRequest, KnowledgeStoreResponse>,
    graphrag_store: Client<KnowledgeStoreRequest, KnowledgeStoreResponse>,
}

impl DownstreamRegistry {
    pub fn new(config: &PlatformConfig) -> Self {
        let graphrag_breaker = CircuitBreakerHandle::new(
            CircuitBreakerConfig::builder()
                .failure_threshold(config.graphrag.failure_threshold)
                .success_threshold(config.graphrag.success_threshold)
                .cooldown(config.graphrag.cooldown)
                .name("graphrag"),
        );

        Self {
            sandbox: ResilientRpcClient::new(
                ReqwestTransport::new(config.sandbox.base_url.clone(), "/execute", "/health"),
                client_config("sandbox.execute", &config.sandbox).build(),
            ),
            fileprocess: ResilientRpcClient::new(
                ReqwestTransport::new(config.fileprocess.base_url.clone(), "/process", "/health"),
                client_config("fileprocess.process", &config.fileprocess).build(),
            ),
            cyberagent: ResilientRpcClient::new(
                ReqwestTransport::new(config.cyberagent.base_url.clone(), "/scan", "/health"),
                client_config("cyberagent.scan", &config.cyberagent).build(),
            ),
            mageagent: ResilientRpcClient::new(
                ReqwestTransport::new(config.mageagent.base_url.clone(), "/complete", "/health"),
                client_config("mageagent.complete", &config.mageagent).build(),
            ),
            graphrag_query: ResilientRpcClient::new(
                ReqwestTransport::new(config.graphrag.base_url.clone(), "/query", "/health"),
                client_config("graphrag.query", &config.graphrag)
                    .shared_breaker(graphrag_breaker.clone())
                    .build(),
            ),
            graphrag_store: ResilientRpcClient::new(
                ReqwestTransport::new(config.graphrag.base_url.clone(), "/store", "/health"),
                client_config("graphrag.store", &config.graphrag)
                    .shared_breaker(graphrag_breaker)
                    .build(),
            ),
        }
    }

    /// Probes every downstream's health endpoint (§6, §SUPPLEMENTED FEATURES:
    /// "a separate concern from breaker internals"), for an operator
    /// dashboard or readiness probe.
    pub async fn health_report(&self) -> Vec<(&'static str, bool)> {
        let (sandbox, fileprocess, cyberagent) =
            futures::future::join3(self.sandbox.health(), self.fileprocess.health(), self.cyberagent.health()).await;
        let (mageagent, graphrag_query, graphrag_store) = futures::future::join3(
            self.mageagent.health(),
            self.graphrag_query.health(),
            self.graphrag_store.health(),
        )
        .await;
        vec![
            ("sandbox", sandbox),
            ("fileprocess", fileprocess),
            ("cyberagent", cyberagent),
            ("mageagent", mageagent),
            ("graphrag.query", graphrag_query),
            ("graphrag.store", graphrag_store),
        ]
    }
}

async fn call<Req, Resp, T>(client: &ResilientRpcClient<Req, Resp, T>, input: Value) -> Result<Value, StepFailure>
where
    Req: Validate + DeserializeOwned,
    Resp: Serialize,
    T: DownstreamTransport<Req, Resp>,
{
    let request: Req = serde_json::from_value(input)
        .map_err(|e| StepFailure::new(FailureCode::ValidationFailed, format!("malformed step input: {e}")))?;
    let response = client
        .execute(&request)
        .await
        .map_err(|e| StepFailure::from(&e.into_platform_error()))?;
    serde_json::to_value(response)
        .map_err(|e| StepFailure::new(FailureCode::StepException, format!("could not encode response: {e}")))
}

#[async_trait]
impl StepDispatcher for DownstreamRegistry {
    async fn dispatch(&self, service: Service, operation: &str, input: Value) -> Result<Value, StepFailure> {
        match (service, operation) {
            (Service::Sandbox, "execute") => call(&self.sandbox, input).await,
            (Service::Fileprocess, "process") => call(&self.fileprocess, input).await,
            (Service::Cyberagent, "scan") => call(&self.cyberagent, input).await,
            (Service::Mageagent, "complete") => call(&self.mageagent, input).await,
            (Service::Graphrag, "query") => call(&self.graphrag_query, input).await,
            (Service::Graphrag, "store") => call(&self.graphrag_store, input).await,
            _ => Err(StepFailure::new(
                FailureCode::ValidationFailed,
                format!("no dispatcher route for {}.{operation}", service.as_str()),
            )),
        }
    }
}
