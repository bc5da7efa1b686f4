//! Error type for the pattern learning store.

use substrate_core::{Kind, PlatformError};

#[derive(Debug, thiserror::Error)]
pub enum PatternStoreError {
    /// The outcome event stream's transport failed (not the same as a
    /// parse failure, which is acknowledged and logged per §4.3).
    #[error("outcome event stream transport error: {0}")]
    Transport(String),

    /// A composite key referenced by `import` collided with conflicting
    /// decision-point metadata.
    #[error("pattern import rejected: {0}")]
    ImportRejected(String),
}

impl From<PatternStoreError> for PlatformError {
    fn from(err: PatternStoreError) -> Self {
        let kind = match &err {
            PatternStoreError::Transport(_) => Kind::Transient,
            PatternStoreError::ImportRejected(_) => Kind::DataIntegrity,
        };
        PlatformError::new(kind, err.to_string())
    }
}
