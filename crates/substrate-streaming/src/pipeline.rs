//! The per-stream producer/consumer pipeline (§4.2): bounded, back-pressured
//! writes on the producer side; batched, breaker-guarded persistence with a
//! dead-letter queue on the consumer side.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use substrate_circuitbreaker::{CircuitBreakerConfig, CircuitBreakerHandle, CircuitState};
use substrate_core::{EventListeners, TenantContext};
use substrate_retry::{ExponentialBackoff, IntervalFunction};
use tokio::sync::Notify;
use tokio::task::JoinHandle;

use crate::chunk::StreamChunk;
use crate::config::StreamPipelineConfig;
use crate::dlq::{DeadLetter, DeadLetterQueue, DeadLetterReport};
use crate::error::StreamingError;
use crate::events::StreamingEvent;
use crate::knowledge_store::KnowledgeStore;

/// A point-in-time snapshot of a pipeline's health, for dashboards and tests.
#[derive(Debug, Clone)]
pub struct PipelineMetrics {
    pub stream_id: String,
    pub queue_depth: usize,
    pub dead_letter_depth: usize,
    pub dead_letters_dropped: u64,
    pub persisted_total: u64,
    pub failed_total: u64,
    pub breaker_state: CircuitState,
    pub avg_persist_latency_ms: Option<f64>,
}

struct Shared<KS> {
    stream_id: String,
    domain: String,
    tenant: Option<TenantContext>,
    config: StreamPipelineConfig,
    queue: Mutex<VecDeque<StreamChunk>>,
    drain_notify: Notify,
    next_sequence: AtomicU64,
    finalized: AtomicBool,
    stopped: AtomicBool,
    breaker: CircuitBreakerHandle,
    dlq: Mutex<DeadLetterQueue>,
    latency_window: Mutex<VecDeque<f64>>,
    persisted_total: AtomicU64,
    failed_total: AtomicU64,
    event_listeners: EventListeners<StreamingEvent>,
    store: KS,
}

impl<KS> Shared<KS> {
    fn queue_len(&self) -> usize {
        self.queue.lock().unwrap().len()
    }

    fn record_latency(&self, ms: f64) {
        let mut window = self.latency_window.lock().unwrap();
        window.push_back(ms);
        if window.len() > self.config.latency_window {
            window.pop_front();
        }
    }

    fn avg_latency(&self) -> Option<f64> {
        let window = self.latency_window.lock().unwrap();
        if window.is_empty() {
            None
        } else {
            Some(window.iter().sum::<f64>() / window.len() as f64)
        }
    }

    fn emit(&self, event: StreamingEvent) {
        self.event_listeners.emit(&event);
    }
}

/// Single-consumer, multi-producer storage pipeline for one `streamId`.
///
/// Construction spawns the consumer task immediately; callers hold `Arc`
/// clones (via [`crate::registry::StreamPipelineRegistry`]) so the singleton
/// behaviour described in §5 ("one consumer task per stream") is a property
/// of the registry, not of this type.
pub struct StreamingPipeline<KS> {
    shared: Arc<Shared<KS>>,
    consumer: Mutex<Option<JoinHandle<()>>>,
}

impl<KS> StreamingPipeline<KS>
where
    KS: KnowledgeStore + Send + Sync + 'static,
{
    pub fn new(
        stream_id: impl Into<String>,
        domain: impl Into<String>,
        tenant: Option<TenantContext>,
        config: StreamPipelineConfig,
        store: KS,
    ) -> Arc<Self> {
        let stream_id = stream_id.into();
        let breaker = CircuitBreakerHandle::new(
            CircuitBreakerConfig::builder()
                .name(format!("stream:{stream_id}"))
                .failure_threshold(config.failure_threshold)
                .success_threshold(config.breaker_success_threshold)
                .cooldown(config.breaker_cooldown),
        );

        let shared = Arc::new(Shared {
            dlq: Mutex::new(DeadLetterQueue::new(config.dead_letter_capacity)),
            domain: domain.into(),
            tenant,
            config,
            queue: Mutex::new(VecDeque::new()),
            drain_notify: Notify::new(),
            next_sequence: AtomicU64::new(0),
            finalized: AtomicBool::new(false),
            stopped: AtomicBool::new(false),
            breaker,
            latency_window: Mutex::new(VecDeque::new()),
            persisted_total: AtomicU64::new(0),
            failed_total: AtomicU64::new(0),
            event_listeners: EventListeners::new(),
            store,
            stream_id,
        });

        let consumer_shared = Arc::clone(&shared);
        let handle = tokio::spawn(async move { consumer_loop(consumer_shared).await });

        Arc::new(Self {
            shared,
            consumer: Mutex::new(Some(handle)),
        })
    }

    pub fn stream_id(&self) -> &str {
        &self.shared.stream_id
    }

    pub fn breaker(&self) -> &CircuitBreakerHandle {
        &self.shared.breaker
    }

    /// Writes one chunk of content, applying back-pressure if the queue is
    /// at capacity (§4.2 scenario 3). `is_final = true` closes logical
    /// admission: any further write returns `AlreadyFinalized`.
    pub async fn write(&self, content: Vec<u8>, tokens: u32, is_final: bool) -> Result<u64, StreamingError> {
        if self.shared.stopped.load(Ordering::SeqCst) {
            self.shared.emit(StreamingEvent::WriteRejected {
                stream_id: self.shared.stream_id.clone(),
                reason: "stopped",
                timestamp: Instant::now(),
            });
            return Err(StreamingError::Closed {
                stream_id: self.shared.stream_id.clone(),
            });
        }
        if self.shared.finalized.load(Ordering::SeqCst) {
            self.shared.emit(StreamingEvent::WriteRejected {
                stream_id: self.shared.stream_id.clone(),
                reason: "finalized",
                timestamp: Instant::now(),
            });
            return Err(StreamingError::AlreadyFinalized {
                stream_id: self.shared.stream_id.clone(),
            });
        }
        if !self.shared.breaker.is_call_permitted() {
            self.shared.emit(StreamingEvent::WriteRejected {
                stream_id: self.shared.stream_id.clone(),
                reason: "breaker_open",
                timestamp: Instant::now(),
            });
            return Err(StreamingError::BreakerOpen {
                stream_id: self.shared.stream_id.clone(),
            });
        }

        if self.shared.queue_len() >= self.shared.config.max_queue_size {
            self.wait_for_drain().await?;
        }

        let sequence = self.shared.next_sequence.fetch_add(1, Ordering::SeqCst);
        if is_final {
            self.shared.finalized.store(true, Ordering::SeqCst);
        }

        let chunk = StreamChunk::new(
            sequence,
            content,
            tokens,
            self.shared.stream_id.clone(),
            self.shared.domain.clone(),
            None,
            None,
            is_final,
        );

        self.shared.queue.lock().unwrap().push_back(chunk);

        #[cfg(feature = "metrics")]
        substrate_core::metrics::record_stream_queue_depth(&self.shared.stream_id, self.shared.queue_len());

        self.shared.emit(StreamingEvent::WriteAccepted {
            stream_id: self.shared.stream_id.clone(),
            sequence,
            timestamp: Instant::now(),
        });

        Ok(sequence)
    }

    async fn wait_for_drain(&self) -> Result<(), StreamingError> {
        let target = self.shared.config.max_queue_size / 2;
        let deadline = Instant::now() + self.shared.config.backpressure_ceiling;
        loop {
            let notified = self.shared.drain_notify.notified();
            if self.shared.queue_len() <= target {
                return Ok(());
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(StreamingError::BackpressureTimeout {
                    stream_id: self.shared.stream_id.clone(),
                });
            }
            if tokio::time::timeout(remaining, notified).await.is_err() {
                return Err(StreamingError::BackpressureTimeout {
                    stream_id: self.shared.stream_id.clone(),
                });
            }
        }
    }

    /// A point-in-time metrics snapshot.
    pub fn metrics(&self) -> PipelineMetrics {
        let dlq = self.shared.dlq.lock().unwrap();
        PipelineMetrics {
            stream_id: self.shared.stream_id.clone(),
            queue_depth: self.shared.queue_len(),
            dead_letter_depth: dlq.len(),
            dead_letters_dropped: dlq.dropped(),
            persisted_total: self.shared.persisted_total.load(Ordering::SeqCst),
            failed_total: self.shared.failed_total.load(Ordering::SeqCst),
            breaker_state: self.shared.breaker.state(),
            avg_persist_latency_ms: self.shared.avg_latency(),
        }
    }

    /// Retries every current dead letter with `2^attempt` second backoff.
    /// Entries exceeding the configured attempt cap are surfaced as
    /// permanently failed rather than requeued.
    pub async fn retry_dead_letters(&self) -> DeadLetterReport {
        retry_dead_letters(&self.shared).await
    }

    /// Drains the main queue, retries the dead-letter queue once, then stops
    /// the consumer task and releases its handle (§4.2).
    pub async fn close(&self) {
        self.shared.stopped.store(true, Ordering::SeqCst);
        self.shared.drain_notify.notify_waiters();

        let handle = self.consumer.lock().unwrap().take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }

        let _ = self.retry_dead_letters().await;
    }
}

async fn consumer_loop<KS>(shared: Arc<Shared<KS>>)
where
    KS: KnowledgeStore + Send + Sync + 'static,
{
    let mut ticker = tokio::time::interval(shared.config.batch_interval);
    loop {
        ticker.tick().await;

        let batch: Vec<StreamChunk> = {
            let mut queue = shared.queue.lock().unwrap();
            let n = shared.config.batch_size.min(queue.len());
            queue.drain(..n).collect()
        };

        if batch.is_empty() {
            if shared.stopped.load(Ordering::SeqCst) && shared.queue_len() == 0 {
                return;
            }
            continue;
        }

        process_batch(&shared, batch).await;
        shared.drain_notify.notify_waiters();

        #[cfg(feature = "metrics")]
        substrate_core::metrics::record_stream_queue_depth(&shared.stream_id, shared.queue_len());

        if shared.stopped.load(Ordering::SeqCst) && shared.queue_len() == 0 {
            return;
        }
    }
}

async fn process_batch<KS>(shared: &Arc<Shared<KS>>, batch: Vec<StreamChunk>)
where
    KS: KnowledgeStore + Send + Sync + 'static,
{
    if shared.tenant.is_none() {
        #[cfg(feature = "tracing")]
        tracing::warn!(
            stream_id = %shared.stream_id,
            "dropping batch without persistence: stream has no tenant context"
        );
        return;
    }

    let started = Instant::now();
    let count = batch.len();
    match shared.store.persist(&batch).await {
        Ok(()) => {
            shared.breaker.record_success();
            shared.persisted_total.fetch_add(count as u64, Ordering::SeqCst);
            let latency_ms = started.elapsed().as_secs_f64() * 1000.0;
            shared.record_latency(latency_ms);

            #[cfg(feature = "metrics")]
            substrate_core::metrics::record_stream_persist_latency(&shared.stream_id, latency_ms);

            shared.emit(StreamingEvent::BatchPersisted {
                stream_id: shared.stream_id.clone(),
                count,
                latency_ms,
                timestamp: Instant::now(),
            });
        }
        Err(_err) => {
            shared.breaker.record_failure();
            shared.failed_total.fetch_add(count as u64, Ordering::SeqCst);

            shared.emit(StreamingEvent::BatchFailed {
                stream_id: shared.stream_id.clone(),
                count,
                consecutive_failures: shared.breaker.metrics().failure_count,
                timestamp: Instant::now(),
            });

            shared.dlq.lock().unwrap().push(batch);
            shared.emit(StreamingEvent::DeadLettered {
                stream_id: shared.stream_id.clone(),
                count,
                timestamp: Instant::now(),
            });
        }
    }
}

async fn retry_dead_letters<KS>(shared: &Arc<Shared<KS>>) -> DeadLetterReport
where
    KS: KnowledgeStore + Send + Sync + 'static,
{
    let entries: Vec<DeadLetter> = shared.dlq.lock().unwrap().drain();
    let backoff = ExponentialBackoff::new(Duration::from_secs(1)).multiplier(2.0);
    let mut report = DeadLetterReport::default();

    for mut entry in entries {
        report.attempted += 1;
        let delay = backoff.next_interval(entry.attempts as usize);
        tokio::time::sleep(delay).await;

        match shared.store.persist(&entry.chunks).await {
            Ok(()) => {
                report.succeeded += 1;
                shared.breaker.record_success();
                shared
                    .persisted_total
                    .fetch_add(entry.chunks.len() as u64, Ordering::SeqCst);
            }
            Err(_) => {
                entry.attempts += 1;
                if entry.attempts > shared.config.dead_letter_max_attempts {
                    report.permanently_failed += 1;
                    shared.emit(StreamingEvent::PermanentlyFailed {
                        stream_id: shared.stream_id.clone(),
                        count: entry.chunks.len(),
                        attempts: entry.attempts,
                        timestamp: Instant::now(),
                    });
                } else {
                    shared.dlq.lock().unwrap().requeue(entry);
                }
            }
        }
    }

    report
}
