//! Data model for the pattern learning store (§3: `Pattern`), plus the
//! closed set of decision-point kinds a pattern's `decision` can take.
//!
//! The source's outcome payloads are free-form maps; here they are tagged
//! variants over a closed set (§9 design notes) so the store can never
//! silently accept a malformed record.

use std::collections::{HashSet, VecDeque};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The named choice sites a pattern can be learned for (GLOSSARY:
/// "Decision point").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionPoint {
    Triage,
    SecurityAssessment,
    ProcessingRoute,
    PostProcessing,
}

impl DecisionPoint {
    pub fn as_str(self) -> &'static str {
        match self {
            DecisionPoint::Triage => "triage",
            DecisionPoint::SecurityAssessment => "security_assessment",
            DecisionPoint::ProcessingRoute => "processing_route",
            DecisionPoint::PostProcessing => "post_processing",
        }
    }
}

/// A decision made at a given decision point, tagged by kind rather than
/// stored as an opaque map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "decisionPoint", rename_all = "snake_case")]
pub enum Decision {
    Triage { route: String, priority: String },
    SecurityAssessment { threat_level: String, action: String },
    ProcessingRoute { route: String },
    PostProcessing { steps: Vec<String> },
}

impl Decision {
    pub fn decision_point(&self) -> DecisionPoint {
        match self {
            Decision::Triage { .. } => DecisionPoint::Triage,
            Decision::SecurityAssessment { .. } => DecisionPoint::SecurityAssessment,
            Decision::ProcessingRoute { .. } => DecisionPoint::ProcessingRoute,
            Decision::PostProcessing { .. } => DecisionPoint::PostProcessing,
        }
    }
}

/// The composite fingerprint an inbound file/request is classified against
/// before consulting the store (§3: "Composite key").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileFingerprint {
    pub file_extension: String,
    pub mime_type: String,
    pub size_bytes: u64,
    pub classification: Option<String>,
    pub threat_level: Option<String>,
}

/// Buckets raw byte sizes into one of five coarse classes used by the
/// composite key. Boundaries are an implementation choice (not specified
/// numerically in the spec); documented in `DESIGN.md`.
pub fn size_bucket(size_bytes: u64) -> &'static str {
    const KB: u64 = 1024;
    const MB: u64 = 1024 * KB;
    match size_bytes {
        0..=KB => "tiny",
        n if n <= 100 * KB => "small",
        n if n <= 10 * MB => "medium",
        n if n <= 100 * MB => "large",
        _ => "huge",
    }
}

fn mime_category(mime_type: &str) -> &str {
    mime_type.split('/').next().unwrap_or(mime_type)
}

impl FileFingerprint {
    /// Builds the opaque composite key string: `decisionPoint | ext |
    /// mimeCategory | sizeBucket | classification | threatLevel` (§3).
    pub fn composite_key(&self, decision_point: DecisionPoint) -> String {
        format!(
            "{}|{}|{}|{}|{}|{}",
            decision_point.as_str(),
            self.file_extension.to_ascii_lowercase(),
            mime_category(&self.mime_type),
            size_bucket(self.size_bytes),
            self.classification.as_deref().unwrap_or("-"),
            self.threat_level.as_deref().unwrap_or("-"),
        )
    }
}

/// A decision outcome consumed from the durable event stream (§6: "an
/// `outcome` field whose value is a `DecisionOutcome` document").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionOutcome {
    pub fingerprint: FileFingerprint,
    pub decision: Decision,
    pub success: bool,
    pub timestamp: DateTime<Utc>,
}

/// At most 10 recently observed values, oldest evicted first (§4.3
/// "Metadata maintenance").
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FifoSet {
    items: VecDeque<String>,
}

impl FifoSet {
    const CAP: usize = 10;

    pub fn push(&mut self, value: impl Into<String>) {
        let value = value.into();
        if self.items.contains(&value) {
            return;
        }
        if self.items.len() >= Self::CAP {
            self.items.pop_front();
        }
        self.items.push_back(value);
    }

    pub fn as_slice(&self) -> &[String] {
        self.items.as_slices().0
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SizeRange {
    pub lo: u64,
    pub hi: u64,
}

impl SizeRange {
    pub fn observe(&mut self, size: u64) {
        self.lo = self.lo.min(size);
        self.hi = self.hi.max(size);
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternMetadata {
    pub file_extensions: FifoSet,
    pub mime_types: FifoSet,
    pub size_range: SizeRange,
    pub threat_levels: HashSet<String>,
}

impl PatternMetadata {
    fn new(fingerprint: &FileFingerprint) -> Self {
        let mut file_extensions = FifoSet::default();
        file_extensions.push(fingerprint.file_extension.clone());
        let mut mime_types = FifoSet::default();
        mime_types.push(fingerprint.mime_type.clone());
        let mut threat_levels = HashSet::new();
        if let Some(level) = &fingerprint.threat_level {
            threat_levels.insert(level.clone());
        }
        Self {
            file_extensions,
            mime_types,
            size_range: SizeRange {
                lo: fingerprint.size_bytes,
                hi: fingerprint.size_bytes,
            },
            threat_levels,
        }
    }

    fn observe(&mut self, fingerprint: &FileFingerprint) {
        self.file_extensions.push(fingerprint.file_extension.clone());
        self.mime_types.push(fingerprint.mime_type.clone());
        self.size_range.observe(fingerprint.size_bytes);
        if let Some(level) = &fingerprint.threat_level {
            self.threat_levels.insert(level.clone());
        }
    }
}

/// A confidence-scored, decay-aware learned pattern (§3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pattern {
    pub id: Uuid,
    pub composite_key: String,
    pub decision_point: DecisionPoint,
    pub decision: Decision,
    pub confidence: f64,
    pub success_count: u32,
    pub failure_count: u32,
    pub last_used: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub metadata: PatternMetadata,
}

impl Pattern {
    pub(crate) fn new(
        composite_key: String,
        fingerprint: &FileFingerprint,
        decision: Decision,
        initial_confidence: f64,
        success: bool,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            decision_point: decision.decision_point(),
            composite_key,
            decision,
            confidence: initial_confidence,
            success_count: if success { 1 } else { 0 },
            failure_count: if success { 0 } else { 1 },
            last_used: now,
            created_at: now,
            updated_at: now,
            metadata: PatternMetadata::new(fingerprint),
        }
    }

    pub(crate) fn observe(&mut self, fingerprint: &FileFingerprint) {
        self.metadata.observe(fingerprint);
    }

    /// `failureCount / (successCount + failureCount)`, or 0 if never used.
    pub fn failure_rate(&self) -> f64 {
        let total = self.success_count + self.failure_count;
        if total == 0 {
            0.0
        } else {
            self.failure_count as f64 / total as f64
        }
    }

    /// Whether this pattern qualifies for pruning (§4.3): at least 5 total
    /// observations and a failure rate over 50%.
    pub fn should_prune(&self) -> bool {
        self.success_count + self.failure_count >= 5 && self.failure_rate() > 0.5
    }
}
