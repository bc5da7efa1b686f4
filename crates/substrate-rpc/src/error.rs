//! Error taxonomy for the resilient RPC client.
//!
//! Every variant carries enough information to classify into
//! [`substrate_core::error::Kind`] without string matching, per §7 of the
//! design: validation failures are fatal and never touch the breaker; network
//! errors and 5xx responses are transient and retried; 4xx responses are
//! permanent and not retried; an open breaker is reported as unavailable.

use std::time::Duration;

use substrate_core::error::{Kind, PlatformError};

/// Errors a downstream transport implementation may report for a single
/// attempt, before the client classifies them against the breaker/retry
/// policy.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("network error: {0}")]
    Network(String),

    #[error("downstream returned {status} (client error)")]
    ClientError { status: u16, body: String },

    #[error("downstream returned {status} (server error)")]
    ServerError { status: u16, body: String },

    #[error("response body could not be decoded: {0}")]
    Decode(String),
}

impl TransportError {
    /// Whether this attempt should count toward the retry budget (network
    /// errors and 5xx, per §4.1 step 4).
    pub fn is_retryable(&self) -> bool {
        matches!(self, TransportError::Network(_) | TransportError::ServerError { .. })
    }
}

/// The error type returned by [`crate::client::ResilientRpcClient::execute`].
#[derive(Debug, thiserror::Error)]
pub enum RpcError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("circuit breaker is open for `{operation}`; retry after {retry_after:?}")]
    Unavailable {
        operation: String,
        retry_after: Duration,
    },

    #[error("request to `{operation}` timed out after {elapsed:?}")]
    Timeout {
        operation: String,
        elapsed: Duration,
    },

    #[error("request to `{operation}` failed after {attempts} attempt(s): {source}")]
    Transient {
        operation: String,
        attempts: u32,
        #[source]
        source: TransportError,
    },

    #[error("request to `{operation}` rejected by downstream: {source}")]
    Permanent {
        operation: String,
        #[source]
        source: TransportError,
    },
}

impl RpcError {
    /// Maps this error onto the platform-wide taxonomy.
    pub fn kind(&self) -> Kind {
        match self {
            RpcError::Validation(_) => Kind::Validation,
            RpcError::Unavailable { .. } => Kind::Unavailable,
            RpcError::Timeout { .. } => Kind::Cancelled,
            RpcError::Transient { .. } => Kind::Transient,
            RpcError::Permanent { .. } => Kind::Permanent,
        }
    }

    pub fn into_platform_error(self) -> PlatformError {
        let kind = self.kind();
        let retry_after = match &self {
            RpcError::Unavailable { retry_after, .. } => Some(*retry_after),
            _ => None,
        };
        let mut err = PlatformError::new(kind, self.to_string());
        if let Some(d) = retry_after {
            err = err.with_retry_after(d);
        }
        err
    }
}
