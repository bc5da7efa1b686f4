//! Unified error taxonomy shared by every layer of the substrate.
//!
//! Every layer (RPC client, streaming pipeline, pattern store, workflow
//! executor) wraps its lower-level errors in [`PlatformError`] so callers can
//! switch on [`Kind`] instead of parsing messages or downcasting.

use std::fmt;
use std::time::Duration;

/// The error taxonomy described for the platform core.
///
/// `Validation` and `Unavailable` never count as a circuit breaker failure;
/// `Transient` and `Permanent` do. `DataIntegrity` and `Cancelled` are
/// terminal for the item in question but are not breaker signals either way
/// (the two open questions in the design notes resolve this: see
/// `DESIGN.md`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    /// Inputs violate a contract. Fail fast; never touches the breaker.
    Validation,
    /// The circuit breaker is open. Returned immediately, recoverable.
    Unavailable,
    /// Network error, 5xx, or timeout. Retried up to the configured limit.
    Transient,
    /// 4xx other than auth. Not retried.
    Permanent,
    /// Stream sequence gap, DLQ exhausted, or unparseable payload.
    DataIntegrity,
    /// Deadline exceeded or supervisor stop. Never retried.
    Cancelled,
}

impl Kind {
    /// Whether an error of this kind should ever be retried by a client.
    pub fn is_retryable(self) -> bool {
        matches!(self, Kind::Transient)
    }

    /// Whether an outcome of this kind should be reported to a circuit
    /// breaker as a failure.
    pub fn counts_as_breaker_failure(self) -> bool {
        matches!(self, Kind::Transient | Kind::Permanent)
    }

    /// Whether this kind is recoverable from the caller's perspective.
    pub fn is_recoverable(self) -> bool {
        matches!(self, Kind::Unavailable | Kind::Transient)
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Kind::Validation => "validation",
            Kind::Unavailable => "unavailable",
            Kind::Transient => "transient",
            Kind::Permanent => "permanent",
            Kind::DataIntegrity => "data_integrity",
            Kind::Cancelled => "cancelled",
        };
        write!(f, "{s}")
    }
}

/// A typed error carrying a [`Kind`], a human-readable message, and an
/// optional application-level cause.
#[derive(Debug, thiserror::Error)]
pub struct PlatformError {
    kind: Kind,
    message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
    retry_after: Option<Duration>,
}

impl PlatformError {
    /// Builds a new error of the given kind.
    pub fn new(kind: Kind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
            retry_after: None,
        }
    }

    /// Attaches a lower-level cause, preserved via `std::error::Error::source`.
    pub fn with_source(
        mut self,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Attaches a suggested retry delay, surfaced to callers of `Unavailable`.
    pub fn with_retry_after(mut self, duration: Duration) -> Self {
        self.retry_after = Some(duration);
        self
    }

    /// Shorthand for a `Validation` error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(Kind::Validation, message)
    }

    /// Shorthand for an `Unavailable` error (breaker open).
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(Kind::Unavailable, message)
    }

    /// Shorthand for a `Transient` error.
    pub fn transient(message: impl Into<String>) -> Self {
        Self::new(Kind::Transient, message)
    }

    /// Shorthand for a `Permanent` error.
    pub fn permanent(message: impl Into<String>) -> Self {
        Self::new(Kind::Permanent, message)
    }

    /// Shorthand for a `DataIntegrity` error.
    pub fn data_integrity(message: impl Into<String>) -> Self {
        Self::new(Kind::DataIntegrity, message)
    }

    /// Shorthand for a `Cancelled` error.
    pub fn cancelled(message: impl Into<String>) -> Self {
        Self::new(Kind::Cancelled, message)
    }

    /// The error's taxonomy kind.
    pub fn kind(&self) -> Kind {
        self.kind
    }

    /// The suggested retry delay, if any.
    pub fn retry_after(&self) -> Option<Duration> {
        self.retry_after
    }

    /// Human-facing suggestion text derived from the error kind, used to
    /// populate `degraded` workflow results.
    pub fn suggestion(&self) -> &'static str {
        match self.kind {
            Kind::Validation => "correct the request and resubmit",
            Kind::Unavailable => "the downstream is temporarily unavailable; retry later",
            Kind::Transient => "a transient failure occurred; it may succeed on retry",
            Kind::Permanent => "the request cannot succeed as submitted",
            Kind::DataIntegrity => "the record could not be processed; it has been preserved for inspection",
            Kind::Cancelled => "the operation was cancelled before completion",
        }
    }
}

impl fmt::Display for PlatformError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_never_retryable() {
        let e = PlatformError::validation("bad input");
        assert!(!e.kind().is_retryable());
        assert!(!e.kind().counts_as_breaker_failure());
    }

    #[test]
    fn transient_is_retryable_and_counts() {
        let e = PlatformError::transient("connection reset");
        assert!(e.kind().is_retryable());
        assert!(e.kind().counts_as_breaker_failure());
        assert!(e.kind().is_recoverable());
    }

    #[test]
    fn permanent_counts_but_not_retryable() {
        let e = PlatformError::permanent("404");
        assert!(!e.kind().is_retryable());
        assert!(e.kind().counts_as_breaker_failure());
    }

    #[test]
    fn display_includes_kind() {
        let e = PlatformError::unavailable("breaker open");
        assert_eq!(e.to_string(), "[unavailable] breaker open");
    }

    #[test]
    fn source_is_preserved() {
        #[derive(Debug, thiserror::Error)]
        #[error("inner")]
        struct Inner;

        let e = PlatformError::transient("outer").with_source(Inner);
        assert!(std::error::Error::source(&e).is_some());
    }
}
