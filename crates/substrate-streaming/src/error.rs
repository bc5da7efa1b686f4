//! Error taxonomy for the streaming storage pipeline, mapped onto
//! [`substrate_core::Kind`] so callers can switch on kind without parsing
//! messages (§7).

use substrate_core::{Kind, PlatformError};

/// Errors a [`crate::pipeline::StreamingPipeline`] can return from `write`,
/// `close`, or `retry_dead_letters`.
#[derive(Debug, thiserror::Error)]
pub enum StreamingError {
    /// The pipeline has been closed; no further writes are admitted.
    #[error("stream `{stream_id}` is closed")]
    Closed { stream_id: String },

    /// A chunk with `is_final = true` was already written; logical admission
    /// is closed even though `close()` hasn't been called.
    #[error("stream `{stream_id}` already received its final chunk")]
    AlreadyFinalized { stream_id: String },

    /// The per-stream circuit breaker is open.
    #[error("stream `{stream_id}` breaker is open")]
    BreakerOpen { stream_id: String },

    /// The 30s back-pressure drain ceiling elapsed before the queue fell to
    /// 50% capacity (§4.2 scenario 3).
    #[error("stream `{stream_id}` back-pressure wait exceeded its ceiling")]
    BackpressureTimeout { stream_id: String },
}

impl StreamingError {
    pub fn kind(&self) -> Kind {
        match self {
            StreamingError::Closed { .. } => Kind::Cancelled,
            StreamingError::AlreadyFinalized { .. } => Kind::Validation,
            StreamingError::BreakerOpen { .. } => Kind::Unavailable,
            StreamingError::BackpressureTimeout { .. } => Kind::Cancelled,
        }
    }
}

impl From<StreamingError> for PlatformError {
    fn from(err: StreamingError) -> Self {
        let kind = err.kind();
        PlatformError::new(kind, err.to_string())
    }
}
