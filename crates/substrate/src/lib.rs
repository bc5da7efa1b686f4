//! Process-root composition of the orchestration and resilience substrate:
//! tenant isolation, the resilient downstream RPC family, the streaming
//! storage pipeline, the pattern learning store, and the workflow
//! planner/executor, wired together.
//!
//! This crate owns no algorithm of its own; every behavior in §4 lives in
//! its own crate (`substrate-circuitbreaker`, `substrate-rpc`,
//! `substrate-streaming`, `substrate-patterns`, `substrate-workflow-planner`,
//! `substrate-workflow-executor`). What lives here is the thing the source
//! system treated as implicit global singletons (§9 "Singletons in source
//! become explicit services"): one [`DownstreamRegistry`], one
//! [`substrate_streaming::StreamPipelineRegistry`], one
//! [`substrate_patterns::PatternStore`], one planner, one executor, built
//! once from [`PlatformConfig`] and handed to whatever transport surface
//! (HTTP/WebSocket, out of scope per §1) sits in front of them.
//!
//! See [`composition`] for how the pieces compose and [`observability`] for
//! the logging/metrics surface every component emits into.

pub mod composition;
pub mod config;
pub mod downstreams;
pub mod observability;

use std::sync::Arc;

use substrate_core::TenantContext;
use substrate_patterns::{PatternStore, PatternStoreConfig};
use substrate_streaming::{InMemoryKnowledgeStore, KnowledgeStore, StreamPipelineConfig, StreamPipelineRegistry};
use substrate_workflow_executor::{ExecutionResult, ExecutorConfig, WorkflowExecutor};
use substrate_workflow_planner::{CompletionModel, PlanOptions, PlannerError, WorkflowPlanner};

pub use config::PlatformConfig;
pub use downstreams::DownstreamRegistry;

/// The process-root handle. Generic over the completion model (the LLM
/// vendor integration is explicitly out of scope, §1) and the knowledge
/// store backing the streaming pipeline (the content-specific vector/search
/// store is likewise out of scope); both default to the in-memory
/// implementations shipped for tests and single-process deployments.
pub struct Substrate<C: CompletionModel, KS: KnowledgeStore + Send + Sync + 'static = InMemoryKnowledgeStore> {
    pub planner: WorkflowPlanner<C>,
    pub executor: WorkflowExecutor<DownstreamRegistry>,
    pub downstreams: Arc<DownstreamRegistry>,
    pub streams: Arc<StreamPipelineRegistry<KS>>,
    pub patterns: Arc<PatternStore>,
}

impl<C: CompletionModel + 'static> Substrate<C, InMemoryKnowledgeStore> {
    /// Builds the whole substrate against the shipped in-memory knowledge
    /// store. Production deployments construct a real [`KnowledgeStore`]
    /// and call [`Substrate::with_knowledge_store`] instead.
    pub fn new(config: PlatformConfig, completion: Arc<C>) -> Self {
        Self::with_knowledge_store(config, completion, InMemoryKnowledgeStore::new())
    }
}

impl<C: CompletionModel + 'static, KS: KnowledgeStore + Send + Sync + 'static> Substrate<C, KS> {
    pub fn with_knowledge_store(config: PlatformConfig, completion: Arc<C>, knowledge_store: KS) -> Self {
        let downstreams = Arc::new(DownstreamRegistry::new(&config));
        let executor = WorkflowExecutor::new(
            Arc::clone(&downstreams),
            ExecutorConfig { max_concurrent_steps: config.workflow.max_concurrent_steps },
        );
        let planner = WorkflowPlanner::new(completion);
        let streams = Arc::new(StreamPipelineRegistry::new(
            knowledge_store,
            StreamPipelineConfig::builder().batch_size(config.streaming.batch_size).build(),
        ));
        let patterns = Arc::new(PatternStore::new(
            PatternStoreConfig::builder()
                .ttl_days(config.pattern_store.ttl_days)
                .min_confidence_threshold(config.pattern_store.min_confidence)
                .build(),
        ));

        Self { planner, executor, downstreams, streams, patterns }
    }

    /// Plans then executes a natural-language request end to end (§4.4 →
    /// §4.5): the planner's output is handed to the executor without the
    /// caller ever touching a `WorkflowPlan` directly. Returns the planner's
    /// error if parsing/validation fails before any step runs.
    pub async fn run_workflow(
        &self,
        request: &str,
        options: PlanOptions,
        tenant_context: Option<TenantContext>,
    ) -> Result<ExecutionResult, PlannerError> {
        let plan = self.planner.plan(request, options, tenant_context).await?;
        Ok(self.executor.execute(&plan).await)
    }

    /// Starts (or returns the existing) streaming pipeline for `stream_id`,
    /// scoped to `tenant` (§4.2, §5: "single pipeline per streamId").
    pub fn stream(
        &self,
        stream_id: &str,
        domain: &str,
        tenant: Option<TenantContext>,
    ) -> Arc<substrate_streaming::StreamingPipeline<Arc<KS>>> {
        self.streams.get_or_create(stream_id, domain, tenant)
    }
}
