//! # Composition Guide
//!
//! How the process root wires the substrate's crates together, and why the
//! pieces are ordered the way they are.
//!
//! ## Request flow
//!
//! ```text
//! natural-language request
//!          │
//!          ▼
//! WorkflowPlanner::plan          (substrate-workflow-planner, §4.4)
//!          │  CompletionModel → ProposedPlan → validated, layered WorkflowPlan
//!          ▼
//! WorkflowExecutor::execute      (substrate-workflow-executor, §4.5)
//!          │  one task per ready step, bounded by max_concurrent_steps
//!          ▼
//! StepDispatcher (DownstreamRegistry)
//!          │  resolves ${ref:...} placeholders, picks the right client
//!          ▼
//! ResilientRpcClient::execute    (substrate-rpc, §4.1)
//!          │  validate → breaker admission → HTTP call → retry → breaker report
//!          ▼
//! downstream service (sandbox / fileprocess / cyberagent / mageagent / graphrag)
//! ```
//!
//! Two paths run independently of a workflow:
//!
//! ```text
//! LLM token stream → StreamingPipeline::write   (substrate-streaming, §4.2)
//!                          │ batched, breaker-guarded, dead-lettered
//!                          ▼
//!                   KnowledgeStore::persist
//!
//! outcome event stream → PatternStore::learn_from_outcome  (substrate-patterns, §4.3)
//!                          │ feeds future WorkflowPlanner decisions via lookup()
//! ```
//!
//! The pattern store is deliberately not wired into the planner's critical
//! path in this workspace: §4.4 describes the planner as LLM-driven, and
//! treats pattern lookups as an input the *caller* (the service embedding
//! this crate) may consult before or alongside planning, not as a step the
//! planner performs internally. [`crate::Substrate::patterns`] is exposed
//! for exactly that: a caller can `lookup` a prior decision for a file
//! fingerprint and fold it into the prompt or options it hands to
//! `run_workflow`.
//!
//! ## Why one registry per downstream family, not one client per call site
//!
//! [`crate::downstreams::DownstreamRegistry`] owns exactly one
//! `ResilientRpcClient` per `(service, operation)` pair, built once at
//! process start. This is the direct consequence of §9's "breaker per
//! downstream, not per call site": if every workflow step constructed its
//! own client, each would get its own circuit breaker, and a downstream
//! failing for one caller would stay invisible to every other caller of the
//! same downstream. `graphrag.query` and `graphrag.store` go further and
//! share a single breaker handle (see `downstreams::DownstreamRegistry::new`)
//! because they are two operations against the same downstream.
//!
//! ## Layer ordering inside a single client
//!
//! A `ResilientRpcClient::execute` call runs, in order: validation (fails
//! fast, never touches the breaker) → breaker admission check → HTTP call
//! with a per-attempt deadline → retry with exponential backoff on
//! transient failures → breaker outcome report → metric emission (§4.1).
//! Retry lives entirely inside `substrate-rpc`; nothing above it, not the
//! workflow executor, not a caller, retries on top, per §9's "Retry/backoff
//! belongs in the RPC client only".
//!
//! ## Tenant scoping
//!
//! A [`substrate_core::TenantContext`] flows from the caller through
//! `WorkflowPlanner::plan` (becomes `WorkflowPlan.tenant_context`) and
//! through `StreamPipelineRegistry::get_or_create` (becomes the pipeline's
//! scoping tenant, §4.2: "if the stream was created without a tenant
//! context, persistence is skipped"). Nothing in this crate strips or
//! rewrites it; the resilience substrate carries it unchanged the way §3
//! requires ("Tenant context is read-only after construction").
