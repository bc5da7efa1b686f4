//! Wires the whole substrate together and runs one request through it:
//! plan a two-step workflow, execute it, write a few chunks to a streaming
//! pipeline, and learn a pattern from a simulated outcome.
//!
//! Run with `cargo run --example full_stack -p substrate`.

use std::sync::Arc;

use serde_json::json;
use substrate::{PlatformConfig, Substrate};
use substrate_patterns::{Decision, DecisionOutcome, DecisionPoint, FileFingerprint};
use substrate_workflow_planner::{
    CompletionModel, PlanOptions, PlannerError, ProposedPlan, ProposedStep,
};

/// A fixed-response stand-in for the vendor LLM the real planner calls
/// through `CompletionModel` (§4.4; vendor SDK integration is out of scope
/// per §1).
struct DemoCompletionModel;

#[async_trait::async_trait]
impl CompletionModel for DemoCompletionModel {
    async fn propose_plan(&self, _request: &str) -> Result<ProposedPlan, PlannerError> {
        Ok(ProposedPlan {
            steps: vec![
                ProposedStep {
                    id: Some("scan".into()),
                    name: Some("scan the upload".into()),
                    service: "cyberagent".into(),
                    operation: "scan".into(),
                    input: json!({"file_id": "demo-upload"}),
                    depends_on: vec![],
                    timeout_ms: None,
                },
                ProposedStep {
                    id: Some("summarize".into()),
                    name: Some("summarize once scanned".into()),
                    service: "mageagent".into(),
                    operation: "complete".into(),
                    input: json!({"scan_result": "${ref:scan.threatLevel}"}),
                    depends_on: vec!["scan".into()],
                    timeout_ms: None,
                },
            ],
            confidence: Some(0.95),
            clarifications: vec![],
        })
    }
}

#[tokio::main]
async fn main() {
    #[cfg(feature = "tracing")]
    substrate::observability::init_tracing();

    let substrate = Substrate::new(PlatformConfig::default(), Arc::new(DemoCompletionModel));

    // Plan + execute a workflow end to end (§4.4 → §4.5). The downstreams
    // here aren't actually reachable in this demo process, so the steps
    // fail at the transport layer; what this demonstrates is the wiring,
    // not a live sandbox/cyberagent/mageagent fleet.
    let result = substrate
        .run_workflow("scan the upload then summarize it", PlanOptions::default(), None)
        .await
        .expect("planning succeeds even though execution may not");
    println!(
        "workflow {} finished as {:?} ({} steps, {:.0}% parallel efficiency)",
        result.plan_id,
        result.outcome,
        result.results.len(),
        result.parallelization_efficiency * 100.0,
    );

    // Stream a few chunks through the storage pipeline (§4.2). With no
    // tenant context the pipeline still drains its queue but skips
    // persistence, per §4.2's tenant-scoping invariant.
    let pipeline = substrate.stream("demo-stream", "summarization", None);
    for (i, word) in ["The", "quick", "brown", "fox"].iter().enumerate() {
        let is_final = i == 3;
        pipeline.write(word.as_bytes().to_vec(), 1, is_final).await.expect("write accepted");
    }
    pipeline.close().await;
    println!("stream metrics: {:?}", pipeline.metrics());

    // Record a decision outcome and immediately look it up again (§4.3).
    let fingerprint = FileFingerprint {
        file_extension: "pdf".into(),
        mime_type: "application/pdf".into(),
        size_bytes: 120_000,
        classification: Some("document".into()),
        threat_level: Some("low".into()),
    };
    substrate.patterns.learn_from_outcome(
        "demo-outcome-1",
        &DecisionOutcome {
            fingerprint: fingerprint.clone(),
            decision: Decision::Triage { route: "fast-path".into(), priority: "normal".into() },
            success: true,
            timestamp: chrono::Utc::now(),
        },
    );
    match substrate.patterns.lookup(DecisionPoint::Triage, &fingerprint) {
        Some((decision, confidence)) => {
            println!("learned pattern: {decision:?} at confidence {confidence:.2}")
        }
        None => println!("no pattern met the confidence threshold yet"),
    }
}
