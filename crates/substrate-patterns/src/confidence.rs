//! Confidence scoring math (§4.3): initial values, update multipliers, decay,
//! and the blended "effective confidence" used at query time.

use chrono::{DateTime, Utc};

pub const MIN_CONFIDENCE: f64 = 0.1;
pub const MAX_CONFIDENCE: f64 = 1.0;

pub const INITIAL_CONFIDENCE_ON_SUCCESS: f64 = 0.8;
pub const INITIAL_CONFIDENCE_ON_FAILURE: f64 = 0.5;

/// The spec gives a range (1.03-1.05); a fixed midpoint is used so repeated
/// runs are reproducible (§9 design notes call out the sibling breaker-timer
/// open question similarly — determinism is preferred wherever the spec
/// gives a range instead of a single number). Documented in `DESIGN.md`.
pub const SUCCESS_MULTIPLIER: f64 = 1.04;
/// Midpoint of the spec's 0.85-0.90 range.
pub const FAILURE_MULTIPLIER: f64 = 0.875;

pub const DECAY: f64 = 0.99;

pub fn clamp(confidence: f64) -> f64 {
    confidence.clamp(MIN_CONFIDENCE, MAX_CONFIDENCE)
}

pub fn apply_success(confidence: f64) -> f64 {
    clamp(confidence * SUCCESS_MULTIPLIER)
}

pub fn apply_failure(confidence: f64) -> f64 {
    clamp(confidence * FAILURE_MULTIPLIER)
}

/// `(0.4 * stored_confidence + 0.6 * (success/(success+failure))) *
/// decay^ageDays` (§4.3). When a pattern has never been exercised, the
/// empirical-rate term falls back to the stored confidence itself so a
/// freshly imported pattern isn't penalized to zero.
pub fn effective_confidence(
    stored_confidence: f64,
    success_count: u32,
    failure_count: u32,
    last_used: DateTime<Utc>,
    now: DateTime<Utc>,
) -> f64 {
    let total = success_count + failure_count;
    let empirical = if total == 0 {
        stored_confidence
    } else {
        success_count as f64 / total as f64
    };
    let blended = 0.4 * stored_confidence + 0.6 * empirical;

    let age_days = (now - last_used).num_seconds().max(0) as f64 / 86_400.0;
    let decayed = blended * DECAY.powf(age_days);
    clamp(decayed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn confidence_stays_within_bounds_after_many_updates() {
        let mut c = INITIAL_CONFIDENCE_ON_SUCCESS;
        for _ in 0..1000 {
            c = apply_success(c);
            assert!((MIN_CONFIDENCE..=MAX_CONFIDENCE).contains(&c));
        }
        for _ in 0..1000 {
            c = apply_failure(c);
            assert!((MIN_CONFIDENCE..=MAX_CONFIDENCE).contains(&c));
        }
    }

    #[test]
    fn effective_confidence_monotonically_decreases_with_age() {
        let now = Utc::now();
        let last_used = now;
        let fresh = effective_confidence(0.9, 8, 2, last_used, now);
        let aged = effective_confidence(0.9, 8, 2, last_used, now + Duration::days(10));
        assert!(aged < fresh);
    }

    #[test]
    fn effective_confidence_falls_back_to_stored_when_unused() {
        let now = Utc::now();
        let conf = effective_confidence(0.8, 0, 0, now, now);
        assert!((conf - 0.8).abs() < 1e-9);
    }
}
