//! Typed metrics registry.
//!
//! Thin typed wrappers over the `metrics` facade crate so call sites name a
//! counter/gauge/histogram once and get a consistent label contract,
//! matching the event-emission style already used by every pattern crate in
//! this workspace. The facade is reexported pick-a-backend: production wires
//! `metrics-exporter-prometheus`, tests use `metrics-util`'s debugging
//! recorder.

/// Installs a Prometheus text-exposition recorder as the global `metrics`
/// recorder. Call once at process start. Returns a handle whose `render()`
/// produces the exposition text for a `/metrics` endpoint.
#[cfg(feature = "prometheus")]
pub fn install_prometheus_recorder(
) -> Result<metrics_exporter_prometheus::PrometheusHandle, metrics_exporter_prometheus::BuildError>
{
    metrics_exporter_prometheus::PrometheusBuilder::new().install_recorder()
}

/// Record an outcome sample for an RPC-style operation.
///
/// Labels: `operation`, `language` (may be empty), `outcome` (`success` |
/// `failure`).
pub fn record_rpc_outcome(operation: &str, language: &str, outcome: &'static str) {
    metrics::counter!(
        "substrate_rpc_calls_total",
        "operation" => operation.to_string(),
        "language" => language.to_string(),
        "outcome" => outcome,
    )
    .increment(1);
}

/// Record a circuit breaker state transition.
pub fn record_breaker_transition(name: &str, from: &'static str, to: &'static str) {
    metrics::counter!(
        "substrate_circuit_breaker_transitions_total",
        "name" => name.to_string(),
        "from" => from,
        "to" => to,
    )
    .increment(1);
}

/// Record a streaming pipeline queue depth sample.
pub fn record_stream_queue_depth(stream_id: &str, depth: usize) {
    metrics::gauge!(
        "substrate_stream_queue_depth",
        "stream_id" => stream_id.to_string(),
    )
    .set(depth as f64);
}

/// Record a persisted batch's latency for rolling-window tracking.
pub fn record_stream_persist_latency(stream_id: &str, millis: f64) {
    metrics::histogram!(
        "substrate_stream_persist_latency_ms",
        "stream_id" => stream_id.to_string(),
    )
    .record(millis);
}

/// Record a workflow step outcome.
pub fn record_workflow_step(service: &str, operation: &str, outcome: &'static str) {
    metrics::counter!(
        "substrate_workflow_step_total",
        "service" => service.to_string(),
        "operation" => operation.to_string(),
        "outcome" => outcome,
    )
    .increment(1);
}

/// Record a pattern store lookup.
pub fn record_pattern_lookup(decision_point: &str, hit: bool) {
    metrics::counter!(
        "substrate_pattern_lookup_total",
        "decision_point" => decision_point.to_string(),
        "hit" => if hit { "true" } else { "false" },
    )
    .increment(1);
}
