//! The unit of work flowing through a streaming pipeline (§3: `StreamChunk`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One slice of an in-flight LLM token stream, queued for durable persistence.
///
/// `sequence` is strictly increasing per `stream_id`, assigned by the
/// pipeline at write time — callers never set it themselves. `tokens` is
/// always positive (§3); a zero-token write is rejected before a chunk is
/// ever constructed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamChunk {
    pub chunk_id: Uuid,
    pub sequence: u64,
    pub content: Vec<u8>,
    pub tokens: u32,
    pub timestamp: DateTime<Utc>,
    pub stream_id: String,
    pub domain: String,
    pub agent_id: Option<String>,
    pub task_id: Option<String>,
    pub is_final: bool,
}

impl StreamChunk {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        sequence: u64,
        content: Vec<u8>,
        tokens: u32,
        stream_id: String,
        domain: String,
        agent_id: Option<String>,
        task_id: Option<String>,
        is_final: bool,
    ) -> Self {
        Self {
            chunk_id: Uuid::new_v4(),
            sequence,
            content,
            tokens,
            timestamp: Utc::now(),
            stream_id,
            domain,
            agent_id,
            task_id,
            is_final,
        }
    }
}
