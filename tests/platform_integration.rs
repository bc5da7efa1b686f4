//! End-to-end integration tests that cross crate boundaries the way a real
//! deployment would: a natural-language request goes through the real
//! planner before the executor ever sees it (§8 scenario 4), a resilient RPC
//! client's breaker is driven through its full open/cooldown/recover cycle
//! through the public `execute()` entry point rather than the bare `Circuit`
//! (§8 scenarios 1-2), and a streaming pipeline's in-memory bound is checked
//! under genuinely concurrent writers (§8 "bounded chunks" invariant).

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use substrate_rpc::client::{ResilientRpcClient, RpcClientConfig};
use substrate_rpc::error::{RpcError, TransportError};
use substrate_rpc::transport::DownstreamTransport;
use substrate_rpc::validation::Validate;
use substrate_workflow_executor::{
    ExecutorConfig, FailureCode, StepDispatcher, StepFailure, WorkflowExecutor, WorkflowOutcome,
};
use substrate_workflow_planner::{
    PlanOptions, ProposedPlan, ProposedStep, StaticCompletionModel, WorkflowMode, WorkflowPlanner,
};

/// A dispatcher keyed by step id (via the input's `step_id` field) rather
/// than operation name, so sibling steps sharing a service/operation can
/// fail independently.
struct KeyedDispatcher {
    fail_step_ids: HashSet<String>,
}

#[async_trait]
impl StepDispatcher for KeyedDispatcher {
    async fn dispatch(
        &self,
        _service: substrate_workflow_planner::Service,
        _operation: &str,
        input: Value,
    ) -> Result<Value, StepFailure> {
        let step_id = input.get("step_id").and_then(Value::as_str).unwrap_or_default();
        if self.fail_step_ids.contains(step_id) {
            return Err(StepFailure::new(FailureCode::ServiceError, format!("{step_id} failed")));
        }
        Ok(json!({"step_id": step_id, "value": 1}))
    }
}

fn keyed_diamond_request() -> ProposedPlan {
    let mk = |id: &str, deps: &[&str]| ProposedStep {
        id: Some(id.to_string()),
        name: None,
        service: "fileprocess".to_string(),
        operation: "process".to_string(),
        input: json!({"step_id": id, "from_a": "${ref:a.value}"}),
        depends_on: deps.iter().map(|s| s.to_string()).collect(),
        timeout_ms: None,
    };
    ProposedPlan {
        steps: vec![
            mk("a", &[]),
            mk("b", &["a"]),
            mk("c", &["a"]),
            mk("d", &["b", "c"]),
        ],
        confidence: Some(1.0),
        clarifications: vec![],
    }
}

/// §8 scenario 4: a plan with A, B/C depending on A, and D depending on both
/// B and C. The real planner must lay it out as `[[A], [B, C], [D]]`; when B
/// fails in strict mode D is skipped; in best-effort mode D still runs with
/// its unresolved `${ref:...}` left literal where the failed dependency's
/// data isn't available.
#[tokio::test]
async fn diamond_plan_strict_skips_d_best_effort_runs_it_with_literal_refs() {
    let planner = WorkflowPlanner::new(Arc::new(StaticCompletionModel::new(keyed_diamond_request())));

    let strict_options = PlanOptions { mode: WorkflowMode::Strict, ..PlanOptions::default() };
    let strict_plan = planner.plan("run the diamond workflow", strict_options, None).await.unwrap();

    assert_eq!(strict_plan.parallel_groups.len(), 3);
    assert_eq!(strict_plan.parallel_groups[0], vec!["a".to_string()]);
    assert_eq!(strict_plan.parallel_groups[1], vec!["b".to_string(), "c".to_string()]);
    assert_eq!(strict_plan.parallel_groups[2], vec!["d".to_string()]);

    let strict_dispatcher = Arc::new(KeyedDispatcher { fail_step_ids: ["b".to_string()].into() });
    let strict_executor = WorkflowExecutor::new(strict_dispatcher, ExecutorConfig::default());
    let strict_result = strict_executor.execute(&strict_plan).await;

    assert_eq!(strict_result.outcome, WorkflowOutcome::Degraded);
    assert!(matches!(
        strict_result.results["d"],
        substrate_workflow_executor::StepOutcome::Skipped
    ));

    // Best-effort mode: b still fails, but d runs anyway with its own
    // `${ref:a.value}` resolved (a succeeded) while d's input has no
    // reference to b, so there is nothing left unresolved to check there;
    // what matters is that d is dispatched at all instead of skipped.
    let best_effort_options = PlanOptions { mode: WorkflowMode::BestEffort, ..PlanOptions::default() };
    let best_effort_plan = planner.plan("run the diamond workflow", best_effort_options, None).await.unwrap();
    let best_effort_dispatcher = Arc::new(KeyedDispatcher { fail_step_ids: ["b".to_string()].into() });
    let best_effort_executor = WorkflowExecutor::new(best_effort_dispatcher, ExecutorConfig::default());
    let best_effort_result = best_effort_executor.execute(&best_effort_plan).await;

    assert_eq!(best_effort_result.outcome, WorkflowOutcome::Degraded);
    assert!(best_effort_result.results["d"].succeeded());
}

/// §8 scenarios 1 and 2 driven through the public RPC client rather than the
/// bare `Circuit`: the 5th consecutive failure opens the breaker, the 6th
/// call is rejected without touching the wire, and after the cooldown
/// elapses a probe call enters `HalfOpen` and a second success closes it.
#[tokio::test]
async fn resilient_client_breaker_opens_and_recovers_through_execute() {
    struct ToggleRequest;
    impl Validate for ToggleRequest {
        fn validate(&self) -> Result<(), RpcError> {
            Ok(())
        }
    }

    struct Toggle {
        calls: Arc<AtomicUsize>,
        fail_until: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl DownstreamTransport<ToggleRequest, &'static str> for Toggle {
        async fn send(&self, _request: &ToggleRequest, _deadline: Duration) -> Result<&'static str, TransportError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n < self.fail_until.load(Ordering::SeqCst) {
                Err(TransportError::ServerError { status: 503, body: "down".into() })
            } else {
                Ok("ok")
            }
        }

        async fn health(&self) -> bool {
            true
        }
    }

    let calls = Arc::new(AtomicUsize::new(0));
    let fail_until = Arc::new(AtomicUsize::new(usize::MAX));
    let client = ResilientRpcClient::new(
        Toggle { calls: Arc::clone(&calls), fail_until: Arc::clone(&fail_until) },
        RpcClientConfig::builder("integration.toggle", Duration::from_millis(50))
            .max_attempts(1) // one attempt per execute() call so each call maps to one breaker event
            .breaker_thresholds(5, 2, Duration::from_millis(30))
            .build(),
    );

    for _ in 0..4 {
        assert!(client.execute(&ToggleRequest).await.is_err());
    }
    assert_eq!(client.breaker().state(), substrate_circuitbreaker::CircuitState::Closed);

    // 5th failure opens the breaker.
    assert!(client.execute(&ToggleRequest).await.is_err());
    assert_eq!(client.breaker().state(), substrate_circuitbreaker::CircuitState::Open);

    // 6th call is rejected without reaching the transport.
    let calls_before = calls.load(Ordering::SeqCst);
    let err = client.execute(&ToggleRequest).await.unwrap_err();
    assert!(matches!(err, RpcError::Unavailable { .. }));
    assert_eq!(calls.load(Ordering::SeqCst), calls_before);

    // After cooldown, let the transport start succeeding and recover.
    tokio::time::sleep(Duration::from_millis(40)).await;
    fail_until.store(0, Ordering::SeqCst);
    client.execute(&ToggleRequest).await.unwrap();
    assert_eq!(client.breaker().state(), substrate_circuitbreaker::CircuitState::HalfOpen);
    client.execute(&ToggleRequest).await.unwrap();
    assert_eq!(client.breaker().state(), substrate_circuitbreaker::CircuitState::Closed);
}

/// The streaming pipeline's in-memory queue never holds more than
/// `maxQueueSize + batchSize` chunks at once, even when several producers
/// write concurrently (§8 bounded-queue invariant).
#[tokio::test]
async fn concurrent_writers_never_exceed_the_queue_plus_batch_bound() {
    let config = substrate_streaming::StreamPipelineConfig::builder()
        .max_queue_size(4)
        .batch_size(2)
        .batch_interval(Duration::from_millis(5))
        .build();
    let store = substrate_streaming::InMemoryKnowledgeStore::new();
    let pipeline = substrate_streaming::StreamingPipeline::new("bounded-queue-stream", "ingest", None, config, store);

    let observed_max = Arc::new(AtomicUsize::new(0));
    let observer_pipeline = Arc::clone(&pipeline);
    let observed_max_clone = Arc::clone(&observed_max);
    let observer = tokio::spawn(async move {
        for _ in 0..200 {
            let depth = observer_pipeline.metrics().queue_depth;
            observed_max_clone.fetch_max(depth, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    });

    let mut writers = Vec::new();
    for w in 0..4 {
        let p = Arc::clone(&pipeline);
        writers.push(tokio::spawn(async move {
            for i in 0..5 {
                let _ = p.write(format!("writer-{w}-chunk-{i}").into_bytes(), 1, false).await;
            }
        }));
    }
    for w in writers {
        w.await.unwrap();
    }
    pipeline.write(b"final".to_vec(), 1, true).await.unwrap();
    observer.await.unwrap();
    pipeline.close().await;

    assert!(
        observed_max.load(Ordering::SeqCst) <= 4 + 2,
        "queue depth exceeded maxQueueSize + batchSize at some point"
    );
}

/// Export/import round-trips composite keys across multiple distinct
/// `DecisionPoint`s in a single store, not just within one (§4.3).
#[tokio::test]
async fn pattern_export_import_preserves_keys_across_decision_points() {
    use substrate_patterns::{Decision, DecisionOutcome, DecisionPoint, FileFingerprint, PatternStore, PatternStoreConfig};

    let store = PatternStore::new(PatternStoreConfig::default());
    let doc = FileFingerprint {
        file_extension: "pdf".into(),
        mime_type: "application/pdf".into(),
        size_bytes: 4_096,
        classification: None,
        threat_level: None,
    };
    let exe = FileFingerprint {
        file_extension: "exe".into(),
        mime_type: "application/x-msdownload".into(),
        size_bytes: 1_048_576,
        classification: None,
        threat_level: Some("suspicious".into()),
    };

    for _ in 0..5 {
        store.learn_from_outcome(
            uuid::Uuid::new_v4().to_string().as_str(),
            &DecisionOutcome {
                fingerprint: doc.clone(),
                decision: Decision::Triage { route: "fast".into(), priority: "normal".into() },
                success: true,
                timestamp: chrono::Utc::now(),
            },
        );
        store.learn_from_outcome(
            uuid::Uuid::new_v4().to_string().as_str(),
            &DecisionOutcome {
                fingerprint: exe.clone(),
                decision: Decision::SecurityAssessment { threat_level: "high".into(), action: "quarantine".into() },
                success: true,
                timestamp: chrono::Utc::now(),
            },
        );
    }

    assert!(store.lookup(DecisionPoint::Triage, &doc).is_some());
    assert!(store.lookup(DecisionPoint::SecurityAssessment, &exe).is_some());

    let exported = store.export();
    let restored = PatternStore::new(PatternStoreConfig::default());
    restored.import(exported);

    let (doc_decision, doc_confidence) = restored.lookup(DecisionPoint::Triage, &doc).expect("triage pattern survives round trip");
    assert!(matches!(doc_decision, Decision::Triage { .. }));
    assert!(doc_confidence > 0.0);

    let (exe_decision, exe_confidence) =
        restored.lookup(DecisionPoint::SecurityAssessment, &exe).expect("security pattern survives round trip");
    assert!(matches!(exe_decision, Decision::SecurityAssessment { .. }));
    assert!(exe_confidence > 0.0);

    // The two decision points must not collide on the same composite key.
    assert!(restored.lookup(DecisionPoint::SecurityAssessment, &doc).is_none());
}
