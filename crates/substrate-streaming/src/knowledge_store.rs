//! The persistence sink a streaming pipeline's consumer writes batches to.
//!
//! Content-specific storage (the actual knowledge/vector store) is out of
//! scope (§1); this crate depends only on the [`KnowledgeStore`] trait so a
//! real implementation can be substituted without touching the pipeline.

use std::sync::Arc;

use async_trait::async_trait;

use crate::chunk::StreamChunk;

/// A batched persistence sink. `persist` must be atomic: either the whole
/// batch lands or none of it does, so a failure never produces a partially
/// written batch that could be double-counted on retry.
#[async_trait]
pub trait KnowledgeStore: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    async fn persist(&self, chunks: &[StreamChunk]) -> Result<(), Self::Error>;
}

#[async_trait]
impl<T: KnowledgeStore> KnowledgeStore for Arc<T> {
    type Error = T::Error;

    async fn persist(&self, chunks: &[StreamChunk]) -> Result<(), Self::Error> {
        T::persist(self, chunks).await
    }
}

/// An in-memory store for tests and single-process deployments: records
/// every persisted batch and can be told to fail the next N calls.
#[derive(Default)]
pub struct InMemoryKnowledgeStore {
    persisted: std::sync::Mutex<Vec<StreamChunk>>,
    fail_next: std::sync::atomic::AtomicUsize,
}

#[derive(Debug, thiserror::Error)]
#[error("in-memory knowledge store: forced failure")]
pub struct InMemoryStoreError;

impl InMemoryKnowledgeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `n` calls to `persist` fail, for testing the
    /// consumer's breaker and dead-letter path.
    pub fn fail_next(&self, n: usize) {
        self.fail_next.store(n, std::sync::atomic::Ordering::SeqCst);
    }

    pub fn persisted_chunks(&self) -> Vec<StreamChunk> {
        self.persisted.lock().unwrap().clone()
    }
}

#[async_trait]
impl KnowledgeStore for InMemoryKnowledgeStore {
    type Error = InMemoryStoreError;

    async fn persist(&self, chunks: &[StreamChunk]) -> Result<(), Self::Error> {
        use std::sync::atomic::Ordering;
        let remaining = self.fail_next.load(Ordering::SeqCst);
        if remaining > 0 {
            self.fail_next.store(remaining - 1, Ordering::SeqCst);
            return Err(InMemoryStoreError);
        }
        self.persisted.lock().unwrap().extend_from_slice(chunks);
        Ok(())
    }
}
