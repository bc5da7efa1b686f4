//! Error types for the time limiter pattern.

use std::fmt;

/// Errors produced by a [`crate::TimeLimiter`] service.
#[derive(Debug, Clone)]
pub enum TimeLimiterError<E> {
    /// The inner service returned an error before the timeout elapsed.
    Inner(E),
    /// The call did not complete within the configured timeout.
    Timeout,
}

impl<E> TimeLimiterError<E> {
    /// Whether this error represents a timeout (as opposed to an inner error).
    pub fn is_timeout(&self) -> bool {
        matches!(self, TimeLimiterError::Timeout)
    }

    /// Extracts the wrapped inner error, if any.
    pub fn into_inner(self) -> Option<E> {
        match self {
            TimeLimiterError::Inner(e) => Some(e),
            TimeLimiterError::Timeout => None,
        }
    }
}

impl<E: fmt::Display> fmt::Display for TimeLimiterError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeLimiterError::Inner(e) => write!(f, "inner service error: {e}"),
            TimeLimiterError::Timeout => write!(f, "call did not complete within the configured timeout"),
        }
    }
}

impl<E: std::error::Error + 'static> std::error::Error for TimeLimiterError<E> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TimeLimiterError::Inner(e) => Some(e),
            TimeLimiterError::Timeout => None,
        }
    }
}
