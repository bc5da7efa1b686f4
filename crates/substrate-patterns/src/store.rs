//! The in-memory pattern index (§4.3 "Pattern Learning Store"): lookup,
//! learning, pruning, and bulk export/import.

use std::collections::{HashMap, VecDeque};
use std::sync::RwLock;
use std::time::Instant;

use chrono::Utc;
use substrate_core::EventListeners;

use crate::confidence;
use crate::config::PatternStoreConfig;
use crate::events::PatternStoreEvent;
use crate::model::{Decision, DecisionOutcome, DecisionPoint, FileFingerprint, Pattern};

/// Per-decision-point rollup returned by [`PatternStore::statistics`].
#[derive(Debug, Clone, serde::Serialize)]
pub struct DecisionPointStats {
    pub decision_point: DecisionPoint,
    pub pattern_count: usize,
    pub total_observations: u64,
    pub mean_confidence: f64,
}

/// A serializable snapshot of the whole store, used by `export`/`import`.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct PatternExport {
    pub patterns: Vec<Pattern>,
}

struct State {
    patterns: HashMap<String, Pattern>,
    /// Bounded FIFO of processed outcome message ids, for idempotent
    /// re-delivery of `learn_from_outcome` (§8 idempotence property).
    seen_message_ids: VecDeque<String>,
}

/// The store itself: a composite-key index of learned [`Pattern`]s plus the
/// dedup cache that makes re-applying the same outcome a no-op (§8).
pub struct PatternStore {
    state: RwLock<State>,
    config: PatternStoreConfig,
    events: EventListeners<PatternStoreEvent>,
}

impl PatternStore {
    pub fn new(config: PatternStoreConfig) -> Self {
        Self {
            state: RwLock::new(State {
                patterns: HashMap::new(),
                seen_message_ids: VecDeque::new(),
            }),
            config,
            events: EventListeners::new(),
        }
    }

    pub fn event_listeners(&self) -> &EventListeners<PatternStoreEvent> {
        &self.events
    }

    /// Looks up the best-known decision for a fingerprint at a decision
    /// point. Returns `None` if there's no pattern, it's past its TTL, or
    /// its effective confidence is below `min_confidence_threshold` (§4.3).
    pub fn lookup(
        &self,
        decision_point: DecisionPoint,
        fingerprint: &FileFingerprint,
    ) -> Option<(Decision, f64)> {
        let key = fingerprint.composite_key(decision_point);
        let now = Utc::now();
        let mut state = self.state.write().unwrap();
        let result = state.patterns.get_mut(&key).and_then(|pattern| {
            let age_days = (now - pattern.last_used).num_days();
            if age_days > self.config.ttl_days {
                return None;
            }
            let effective = confidence::effective_confidence(
                pattern.confidence,
                pattern.success_count,
                pattern.failure_count,
                pattern.last_used,
                now,
            );
            if effective < self.config.min_confidence_threshold {
                return None;
            }
            // A hit refreshes `last_used`, extending the pattern's TTL and
            // resetting the age-decay term for the next lookup (§4.3).
            pattern.last_used = now;
            Some((pattern.decision.clone(), effective))
        });

        #[cfg(feature = "metrics")]
        substrate_core::metrics::record_pattern_lookup(decision_point.as_str(), result.is_some());
        let event_ts = Instant::now();
        match &result {
            Some((_, confidence)) => self.events.emit(&PatternStoreEvent::LookupHit {
                composite_key: key,
                confidence: *confidence,
                timestamp: event_ts,
            }),
            None => self.events.emit(&PatternStoreEvent::LookupMiss {
                composite_key: key,
                timestamp: event_ts,
            }),
        }
        result
    }

    /// Returns up to `limit` patterns for the same decision point ranked by
    /// effective confidence, for callers that want a fallback list rather
    /// than a single best match (§4.3 "findSimilar").
    pub fn find_similar(
        &self,
        decision_point: DecisionPoint,
        limit: usize,
    ) -> Vec<(Decision, f64)> {
        let now = Utc::now();
        let state = self.state.read().unwrap();
        let mut scored: Vec<(Decision, f64)> = state
            .patterns
            .values()
            .filter(|p| p.decision_point == decision_point)
            .map(|p| {
                let effective = confidence::effective_confidence(
                    p.confidence,
                    p.success_count,
                    p.failure_count,
                    p.last_used,
                    now,
                );
                (p.decision.clone(), effective)
            })
            .collect();
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(limit);
        scored
    }

    /// Applies a decision outcome: creates a pattern on first sight or
    /// updates an existing one's confidence and counters (§4.3). Idempotent
    /// with respect to `message_id` — a repeated call with the same id is a
    /// no-op and returns the prior post-state unchanged (§8).
    pub fn learn_from_outcome(&self, message_id: &str, outcome: &DecisionOutcome) {
        let mut state = self.state.write().unwrap();

        if state.seen_message_ids.iter().any(|id| id == message_id) {
            return;
        }
        if state.seen_message_ids.len() >= self.config.dedup_cache_size {
            state.seen_message_ids.pop_front();
        }
        state.seen_message_ids.push_back(message_id.to_string());

        let decision_point = outcome.decision.decision_point();
        let key = outcome.fingerprint.composite_key(decision_point);
        let now = Utc::now();

        let is_first_touch = !state.patterns.contains_key(&key);
        let pattern = state.patterns.entry(key.clone()).or_insert_with(|| {
            let initial = if outcome.success {
                confidence::INITIAL_CONFIDENCE_ON_SUCCESS
            } else {
                confidence::INITIAL_CONFIDENCE_ON_FAILURE
            };
            Pattern::new(
                key.clone(),
                &outcome.fingerprint,
                outcome.decision.clone(),
                initial,
                outcome.success,
            )
        });

        // The freshly-created pattern already reflects this outcome's
        // counts and initial confidence; further observations update it.
        if !is_first_touch {
            pattern.observe(&outcome.fingerprint);
            pattern.confidence = if outcome.success {
                confidence::apply_success(pattern.confidence)
            } else {
                confidence::apply_failure(pattern.confidence)
            };
            if outcome.success {
                pattern.success_count += 1;
            } else {
                pattern.failure_count += 1;
            }
        }
        pattern.last_used = now;
        pattern.updated_at = now;

        let should_prune = pattern.should_prune();
        let failure_rate = pattern.failure_rate();
        let confidence_now = pattern.confidence;

        self.events.emit(&PatternStoreEvent::Learned {
            composite_key: key.clone(),
            success: outcome.success,
            confidence: confidence_now,
            timestamp: Instant::now(),
        });

        if should_prune {
            state.patterns.remove(&key);
            self.events.emit(&PatternStoreEvent::Pruned {
                composite_key: key,
                failure_rate,
                timestamp: Instant::now(),
            });
        }
    }

    /// Removes every pattern past its TTL. Intended to run on a schedule
    /// alongside the consumer loop, not on the lookup hot path.
    pub fn prune_expired(&self) -> usize {
        let now = Utc::now();
        let mut state = self.state.write().unwrap();
        let expired: Vec<String> = state
            .patterns
            .iter()
            .filter(|(_, p)| (now - p.last_used).num_days() > self.config.ttl_days)
            .map(|(k, _)| k.clone())
            .collect();
        for key in &expired {
            state.patterns.remove(key);
        }
        expired.len()
    }

    pub fn statistics(&self) -> Vec<DecisionPointStats> {
        let state = self.state.read().unwrap();
        let mut rollup: HashMap<DecisionPoint, (usize, u64, f64)> = HashMap::new();
        for pattern in state.patterns.values() {
            let entry = rollup.entry(pattern.decision_point).or_insert((0, 0, 0.0));
            entry.0 += 1;
            entry.1 += (pattern.success_count + pattern.failure_count) as u64;
            entry.2 += pattern.confidence;
        }
        rollup
            .into_iter()
            .map(|(decision_point, (count, total_observations, confidence_sum))| {
                DecisionPointStats {
                    decision_point,
                    pattern_count: count,
                    total_observations,
                    mean_confidence: if count == 0 { 0.0 } else { confidence_sum / count as f64 },
                }
            })
            .collect()
    }

    pub fn export(&self) -> PatternExport {
        let state = self.state.read().unwrap();
        PatternExport { patterns: state.patterns.values().cloned().collect() }
    }

    /// Replaces the store's contents with a previously exported snapshot.
    /// Existing patterns are dropped; the dedup cache is left untouched so
    /// in-flight redeliveries from before the import are still idempotent.
    pub fn import(&self, snapshot: PatternExport) {
        let mut state = self.state.write().unwrap();
        state.patterns = snapshot
            .patterns
            .into_iter()
            .map(|p| (p.composite_key.clone(), p))
            .collect();
    }

    pub fn clear_all(&self) {
        let mut state = self.state.write().unwrap();
        state.patterns.clear();
        state.seen_message_ids.clear();
    }

    pub fn len(&self) -> usize {
        self.state.read().unwrap().patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fingerprint() -> FileFingerprint {
        FileFingerprint {
            file_extension: "pdf".into(),
            mime_type: "application/pdf".into(),
            size_bytes: 50_000,
            classification: Some("document".into()),
            threat_level: Some("low".into()),
        }
    }

    fn outcome(success: bool) -> DecisionOutcome {
        DecisionOutcome {
            fingerprint: fingerprint(),
            decision: Decision::Triage { route: "fast-path".into(), priority: "normal".into() },
            success,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn lookup_misses_until_learned() {
        let store = PatternStore::new(PatternStoreConfig::default());
        assert!(store.lookup(DecisionPoint::Triage, &fingerprint()).is_none());
        store.learn_from_outcome("m1", &outcome(true));
        assert!(store.lookup(DecisionPoint::Triage, &fingerprint()).is_some());
    }

    #[test]
    fn repeated_message_id_is_idempotent() {
        let store = PatternStore::new(PatternStoreConfig::default());
        store.learn_from_outcome("m1", &outcome(true));
        let (_, confidence_once) = store.lookup(DecisionPoint::Triage, &fingerprint()).unwrap();
        store.learn_from_outcome("m1", &outcome(true));
        let (_, confidence_twice) = store.lookup(DecisionPoint::Triage, &fingerprint()).unwrap();
        assert_eq!(confidence_once, confidence_twice);
    }

    #[test]
    fn pattern_is_pruned_after_majority_failures() {
        let store = PatternStore::new(PatternStoreConfig::default());
        for i in 0..3 {
            store.learn_from_outcome(&format!("s{i}"), &outcome(true));
        }
        for i in 0..4 {
            store.learn_from_outcome(&format!("f{i}"), &outcome(false));
        }
        assert!(store.lookup(DecisionPoint::Triage, &fingerprint()).is_none());
        assert_eq!(store.len(), 0);
    }

    #[test]
    fn lookup_hit_refreshes_last_used_and_extends_ttl() {
        let store = PatternStore::new(PatternStoreConfig::default());
        store.learn_from_outcome("m1", &outcome(true));

        // Age the pattern to just inside its TTL window.
        let aged = Utc::now() - chrono::Duration::days(29);
        {
            let mut state = store.state.write().unwrap();
            for pattern in state.patterns.values_mut() {
                pattern.last_used = aged;
            }
        }

        assert!(store.lookup(DecisionPoint::Triage, &fingerprint()).is_some());

        let snapshot = store.export();
        let pattern = &snapshot.patterns[0];
        assert!(
            (Utc::now() - pattern.last_used).num_seconds() < 5,
            "a lookup hit must refresh last_used, not leave it at the aged timestamp"
        );

        // Past-TTL entries are left stale-aged (never refreshed by a miss),
        // so they still expire on the next lookup.
        {
            let mut state = store.state.write().unwrap();
            for pattern in state.patterns.values_mut() {
                pattern.last_used = Utc::now() - chrono::Duration::days(31);
            }
        }
        assert!(store.lookup(DecisionPoint::Triage, &fingerprint()).is_none());
    }

    #[test]
    fn export_import_round_trips() {
        let store = PatternStore::new(PatternStoreConfig::default());
        store.learn_from_outcome("m1", &outcome(true));
        let snapshot = store.export();

        let other = PatternStore::new(PatternStoreConfig::default());
        other.import(snapshot);
        assert_eq!(other.len(), store.len());
        assert!(other.lookup(DecisionPoint::Triage, &fingerprint()).is_some());
    }

    #[test]
    fn clear_all_empties_the_store() {
        let store = PatternStore::new(PatternStoreConfig::default());
        store.learn_from_outcome("m1", &outcome(true));
        store.clear_all();
        assert!(store.is_empty());
    }
}
