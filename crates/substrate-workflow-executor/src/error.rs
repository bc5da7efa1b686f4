//! Typed step failures (§4.5 "Error typing").

use substrate_core::{Kind, PlatformError};

/// The failure codes a step dispatch can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FailureCode {
    ServiceError,
    Timeout,
    ValidationFailed,
    Unavailable,
    StepException,
}

impl FailureCode {
    /// Whether this code is recoverable from the caller's perspective:
    /// timeouts, breaker-open, and transient network failures are;
    /// validation failures are not (§4.5).
    pub fn recoverable(self) -> bool {
        matches!(self, FailureCode::Timeout | FailureCode::Unavailable | FailureCode::ServiceError)
    }
}

/// A step's failure, tagged with a [`FailureCode`] and recoverability.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{code:?}: {message}")]
pub struct StepFailure {
    pub code: FailureCode,
    pub message: String,
}

impl StepFailure {
    pub fn new(code: FailureCode, message: impl Into<String>) -> Self {
        Self { code, message: message.into() }
    }

    pub fn recoverable(&self) -> bool {
        self.code.recoverable()
    }
}

impl From<&PlatformError> for StepFailure {
    fn from(err: &PlatformError) -> Self {
        let code = match err.kind() {
            Kind::Validation => FailureCode::ValidationFailed,
            Kind::Unavailable => FailureCode::Unavailable,
            Kind::Cancelled => FailureCode::Timeout,
            Kind::Transient | Kind::Permanent | Kind::DataIntegrity => FailureCode::ServiceError,
        };
        StepFailure::new(code, err.to_string())
    }
}
