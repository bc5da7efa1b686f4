//! Confidence-weighted, decay-aware pattern learning store (§4.3).
//!
//! Downstream services classify a request into a [`model::FileFingerprint`]
//! and consult [`store::PatternStore::lookup`] before running an expensive
//! decision pipeline (triage, security assessment, processing routing, post
//! processing). Outcomes — whether the decision the pipeline made turned out
//! right — flow back asynchronously over a durable [`event_stream`] rather
//! than a synchronous write, so the store never sits on a caller's request
//! path. A background [`consumer`] loop drains that stream into the store,
//! deduplicating by message id so a redelivered event is idempotent (§8).
//!
//! Confidence starts high on a first success, low on a first failure, and is
//! nudged multiplicatively on every subsequent observation; looked-up
//! confidence also decays with the pattern's age, and a pattern that
//! accumulates a majority of failures is pruned outright (§4.3).
//!
//! ```
//! use substrate_patterns::{
//!     Decision, DecisionOutcome, DecisionPoint, FileFingerprint, PatternStore, PatternStoreConfig,
//! };
//!
//! let store = PatternStore::new(PatternStoreConfig::default());
//! let fingerprint = FileFingerprint {
//!     file_extension: "pdf".into(),
//!     mime_type: "application/pdf".into(),
//!     size_bytes: 40_000,
//!     classification: Some("document".into()),
//!     threat_level: Some("low".into()),
//! };
//!
//! assert!(store.lookup(DecisionPoint::Triage, &fingerprint).is_none());
//!
//! store.learn_from_outcome(
//!     "evt-1",
//!     &DecisionOutcome {
//!         fingerprint: fingerprint.clone(),
//!         decision: Decision::Triage { route: "fast-path".into(), priority: "normal".into() },
//!         success: true,
//!         timestamp: chrono::Utc::now(),
//!     },
//! );
//!
//! assert!(store.lookup(DecisionPoint::Triage, &fingerprint).is_some());
//! ```

mod confidence;
mod config;
mod consumer;
mod error;
mod event_stream;
mod events;
mod model;
mod store;

pub use config::{PatternStoreConfig, PatternStoreConfigBuilder};
pub use consumer::run_consumer;
pub use error::PatternStoreError;
pub use event_stream::{InMemoryOutcomeEventStream, OutcomeEventStream, StreamMessage};
pub use events::PatternStoreEvent;
pub use model::{
    Decision, DecisionOutcome, DecisionPoint, FifoSet, FileFingerprint, Pattern, PatternMetadata,
    SizeRange,
};
pub use store::{DecisionPointStats, PatternExport, PatternStore};
