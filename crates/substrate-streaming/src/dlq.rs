//! Bounded dead-letter queue for batches that failed persistence after the
//! consumer's retry budget (§4.2 "Dead-letter policy").

use std::collections::VecDeque;

use crate::chunk::StreamChunk;

/// One failed batch, with the number of retry attempts already spent on it.
#[derive(Debug, Clone)]
pub struct DeadLetter {
    pub chunks: Vec<StreamChunk>,
    pub attempts: u32,
}

/// A capacity-bounded FIFO holding dead letters. When full, the oldest entry
/// is dropped to admit the newest — an operator-visible queue is preferable
/// to an unbounded one that can exhaust memory under sustained downstream
/// outage (documented in `DESIGN.md`).
pub struct DeadLetterQueue {
    capacity: usize,
    entries: VecDeque<DeadLetter>,
    dropped: u64,
}

impl DeadLetterQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: VecDeque::new(),
            dropped: 0,
        }
    }

    pub fn push(&mut self, chunks: Vec<StreamChunk>) {
        if self.entries.len() >= self.capacity {
            self.entries.pop_front();
            self.dropped += 1;
        }
        self.entries.push_back(DeadLetter { chunks, attempts: 0 });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    /// Drains every current entry for a retry pass. Entries re-admitted by
    /// the caller (via [`DeadLetterQueue::push`] or
    /// [`DeadLetterQueue::requeue`]) are not visited again in the same pass.
    pub fn drain(&mut self) -> Vec<DeadLetter> {
        self.entries.drain(..).collect()
    }

    /// Puts a dead letter back after a failed retry, preserving its attempt
    /// count.
    pub fn requeue(&mut self, entry: DeadLetter) {
        if self.entries.len() >= self.capacity {
            self.entries.pop_front();
            self.dropped += 1;
        }
        self.entries.push_back(entry);
    }
}

/// The outcome of a [`crate::pipeline::StreamingPipeline::retry_dead_letters`]
/// call, surfaced to operator tooling even though that tooling is out of
/// scope here (§SUPPLEMENTED FEATURES).
#[derive(Debug, Clone, Default)]
pub struct DeadLetterReport {
    pub attempted: usize,
    pub succeeded: usize,
    pub permanently_failed: usize,
}
