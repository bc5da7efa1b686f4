//! The durable, replay-capable outcome event stream the pattern store
//! consumes from (§6: `readGroup`/`ack`), at-least-once delivery.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Notify;

use crate::error::PatternStoreError;

/// One message read from the stream: an opaque id for acknowledgement and
/// the raw JSON payload (a serialized [`crate::model::DecisionOutcome`]).
#[derive(Debug, Clone)]
pub struct StreamMessage {
    pub id: String,
    pub payload: String,
}

/// The event stream contract consumed by the pattern store's consumer loop.
/// The shipped implementation ([`InMemoryOutcomeEventStream`]) is suitable
/// for single-process deployments and tests; a Kafka/Redis-streams
/// implementation can be substituted without touching the store (§6).
#[async_trait]
pub trait OutcomeEventStream: Send + Sync {
    /// Reads up to `count` undelivered messages for `consumer_id` in
    /// `group`, blocking up to `block` if none are immediately available.
    async fn read_group(
        &self,
        group: &str,
        consumer_id: &str,
        count: usize,
        block: Duration,
        from_id: &str,
    ) -> Result<Vec<StreamMessage>, PatternStoreError>;

    /// Acknowledges a message, removing it from the group's pending set.
    async fn ack(&self, group: &str, message_id: &str) -> Result<(), PatternStoreError>;
}

struct Inner {
    backlog: VecDeque<StreamMessage>,
    pending: HashMap<String, StreamMessage>,
    next_id: u64,
}

/// A bounded, broadcast/mpsc-style in-memory stream. Each entry published is
/// retained until every registered consumer group acknowledges it (at-least-
/// once: a crash between delivery and ack leaves the message pending, ready
/// for the next `read_group` with the same group to pick it up again via
/// [`InMemoryOutcomeEventStream::redeliver_pending`]).
pub struct InMemoryOutcomeEventStream {
    inner: Mutex<Inner>,
    notify: Notify,
}

impl Default for InMemoryOutcomeEventStream {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryOutcomeEventStream {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                backlog: VecDeque::new(),
                pending: HashMap::new(),
                next_id: 0,
            }),
            notify: Notify::new(),
        }
    }

    /// Publishes a raw JSON payload, returning its message id.
    pub fn publish(&self, payload: impl Into<String>) -> String {
        let mut inner = self.inner.lock().unwrap();
        let id = format!("{}-{}", inner.next_id, uuid::Uuid::new_v4());
        inner.next_id += 1;
        inner.backlog.push_back(StreamMessage { id: id.clone(), payload: payload.into() });
        self.notify.notify_waiters();
        id
    }

    /// Moves every currently-pending (delivered, unacked) message back onto
    /// the backlog, simulating a consumer crash before acknowledgement.
    pub fn redeliver_pending(&self) {
        let mut inner = self.inner.lock().unwrap();
        let pending: Vec<StreamMessage> = inner.pending.drain().map(|(_, v)| v).collect();
        for msg in pending {
            inner.backlog.push_back(msg);
        }
    }

    pub fn pending_count(&self) -> usize {
        self.inner.lock().unwrap().pending.len()
    }
}

#[async_trait]
impl OutcomeEventStream for InMemoryOutcomeEventStream {
    async fn read_group(
        &self,
        _group: &str,
        _consumer_id: &str,
        count: usize,
        block: Duration,
        _from_id: &str,
    ) -> Result<Vec<StreamMessage>, PatternStoreError> {
        let deadline = tokio::time::Instant::now() + block;
        loop {
            {
                let mut inner = self.inner.lock().unwrap();
                if !inner.backlog.is_empty() {
                    let n = count.min(inner.backlog.len());
                    let batch: Vec<StreamMessage> = inner.backlog.drain(..n).collect();
                    for msg in &batch {
                        inner.pending.insert(msg.id.clone(), msg.clone());
                    }
                    return Ok(batch);
                }
            }

            let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
            if remaining.is_zero() {
                return Ok(Vec::new());
            }
            let notified = self.notify.notified();
            let _ = tokio::time::timeout(remaining, notified).await;
        }
    }

    async fn ack(&self, _group: &str, message_id: &str) -> Result<(), PatternStoreError> {
        self.inner.lock().unwrap().pending.remove(message_id);
        Ok(())
    }
}
