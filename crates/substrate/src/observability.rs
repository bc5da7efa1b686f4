//! Observability surface: structured logging and metrics initialization for
//! the whole substrate (§6 "Outbound observability").
//!
//! Every component emits through the same two channels: `tracing` events
//! carrying `correlation_id`/`request_id` (populated from
//! [`substrate_core::TenantContext::span`]) and typed metric samples through
//! the `metrics` facade (`substrate_core::metrics`). This module only wires
//! the process-wide sinks; the emission sites live next to the behavior they
//! describe in each component crate.

/// Installs a JSON-formatted, env-filter-controlled `tracing` subscriber as
/// the global default. Call once at process start, before constructing a
/// [`crate::Substrate`]. Controlled by `RUST_LOG` (e.g. `RUST_LOG=info` or
/// `RUST_LOG=substrate_rpc=debug,substrate_streaming=warn`), defaulting to
/// `info` when unset.
///
/// Every log event produced during a workflow carries the
/// `company_id`/`app_id`/`request_id` fields of the originating
/// [`substrate_core::TenantContext`] via its [`tracing::Span`], so
/// correlating a request across the planner, executor, and every downstream
/// call it dispatches is a matter of filtering on `request_id` (§6:
/// "Correlation IDs appear on every log event produced during a workflow").
#[cfg(feature = "tracing")]
pub fn init_tracing() {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().json().with_env_filter(filter).with_target(true).init();
}

/// Installs the global Prometheus-compatible metrics recorder and returns a
/// handle whose `render()` produces exposition text for a `/metrics`
/// endpoint (the HTTP surface itself is out of scope per §1; the caller
/// wires this handle's output into whatever route it serves metrics on).
///
/// # Metric names emitted across the substrate
///
/// | Metric | Labels | Emitted by |
/// |---|---|---|
/// | `substrate_rpc_calls_total` | `operation`, `language`, `outcome` | `substrate-rpc` (§4.1) |
/// | `substrate_circuit_breaker_transitions_total` | `name`, `from`, `to` | `substrate-circuitbreaker` (§4.1 state table) |
/// | `substrate_stream_queue_depth` | `stream_id` | `substrate-streaming` (§4.2) |
/// | `substrate_stream_persist_latency_ms` | `stream_id` | `substrate-streaming` (§4.2) |
/// | `substrate_workflow_step_total` | `service`, `operation`, `outcome` | `substrate-workflow-executor` (§4.5) |
/// | `substrate_pattern_lookup_total` | `decision_point`, `hit` | `substrate-patterns` (§4.3) |
#[cfg(feature = "metrics")]
pub fn install_metrics_recorder(
) -> Result<metrics_exporter_prometheus::PrometheusHandle, metrics_exporter_prometheus::BuildError> {
    substrate_core::metrics::install_prometheus_recorder()
}
