//! Streaming storage pipeline (§4.2): turns an unbounded LLM token stream
//! into durable, chunked, back-pressured writes to a knowledge store.
//!
//! Each `streamId` gets one [`StreamingPipeline`], normally obtained from a
//! [`StreamPipelineRegistry`] so the "one consumer task per stream" property
//! in §5 holds process-wide. The producer side ([`StreamingPipeline::write`])
//! applies back-pressure once the in-memory queue reaches capacity; the
//! consumer side batches chunks into the [`KnowledgeStore`] sink, tracking
//! failures against a per-stream circuit breaker and routing exhausted
//! batches to a bounded [`dlq::DeadLetterQueue`].
//!
//! ```rust,no_run
//! use substrate_streaming::{StreamPipelineConfig, StreamPipelineRegistry};
//! use substrate_streaming::knowledge_store::InMemoryKnowledgeStore;
//! use substrate_core::{TenantContext, ContextSource};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = StreamPipelineRegistry::new(InMemoryKnowledgeStore::new(), StreamPipelineConfig::default());
//! let tenant = TenantContext::new("acme", "app-1", "req-1", ContextSource::Headers)?;
//! let pipeline = registry.get_or_create("stream-1", "chat", Some(tenant));
//!
//! pipeline.write(b"hello".to_vec(), 1, false).await?;
//! pipeline.write(b" world".to_vec(), 1, true).await?;
//! pipeline.close().await;
//! # Ok(())
//! # }
//! ```

pub mod chunk;
pub mod config;
pub mod dlq;
pub mod error;
pub mod events;
pub mod knowledge_store;
pub mod pipeline;
pub mod registry;

pub use chunk::StreamChunk;
pub use config::{StreamPipelineConfig, StreamPipelineConfigBuilder};
pub use dlq::{DeadLetter, DeadLetterQueue, DeadLetterReport};
pub use error::StreamingError;
pub use events::StreamingEvent;
pub use knowledge_store::{InMemoryKnowledgeStore, KnowledgeStore};
pub use pipeline::{PipelineMetrics, StreamingPipeline};
pub use registry::StreamPipelineRegistry;
