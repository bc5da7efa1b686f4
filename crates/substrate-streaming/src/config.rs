//! Tunables for a streaming storage pipeline (§4.2, §6 "Configuration").

use std::time::Duration;

/// Per-pipeline configuration. Defaults match §4.2 exactly; every default is
/// called out at its field.
#[derive(Debug, Clone)]
pub struct StreamPipelineConfig {
    /// Producer-side queue capacity before back-pressure kicks in. Default 50.
    pub max_queue_size: usize,
    /// Chunks pulled per consumer batch. Default 5.
    pub batch_size: usize,
    /// Interval between consumer batch attempts. Default 100ms.
    pub batch_interval: Duration,
    /// Ceiling on a producer's back-pressure wait. Default 30s.
    pub backpressure_ceiling: Duration,
    /// Consecutive persistence failures before the stream's breaker opens.
    /// Default 5.
    pub failure_threshold: u32,
    /// Breaker cooldown before a half-open probe is admitted. Default 30s
    /// (shorter than the RPC client's 60s default, matching §4.2's own
    /// number, not §4.1's).
    pub breaker_cooldown: Duration,
    /// Consecutive successful batches to close a half-open breaker. Not
    /// specified numerically in §4.2; reuses the platform-wide default of 2
    /// (§4.1) since no stream-specific value is given.
    pub breaker_success_threshold: u32,
    /// Rolling window size for persistence latency tracking. Default 100.
    pub latency_window: usize,
    /// Bounded dead-letter queue capacity. Not given a numeric default in the
    /// spec; chosen generously relative to `max_queue_size` so a slow
    /// downstream doesn't lose dead letters before an operator notices
    /// (documented in `DESIGN.md`).
    pub dead_letter_capacity: usize,
    /// Attempts after which a dead letter is surfaced as permanently failed.
    /// Default 3.
    pub dead_letter_max_attempts: u32,
}

impl Default for StreamPipelineConfig {
    fn default() -> Self {
        Self {
            max_queue_size: 50,
            batch_size: 5,
            batch_interval: Duration::from_millis(100),
            backpressure_ceiling: Duration::from_secs(30),
            failure_threshold: 5,
            breaker_cooldown: Duration::from_secs(30),
            breaker_success_threshold: 2,
            latency_window: 100,
            dead_letter_capacity: 500,
            dead_letter_max_attempts: 3,
        }
    }
}

impl StreamPipelineConfig {
    pub fn builder() -> StreamPipelineConfigBuilder {
        StreamPipelineConfigBuilder::default()
    }
}

#[derive(Debug, Clone, Default)]
pub struct StreamPipelineConfigBuilder {
    config: StreamPipelineConfig,
}

impl StreamPipelineConfigBuilder {
    pub fn max_queue_size(mut self, n: usize) -> Self {
        self.config.max_queue_size = n;
        self
    }

    pub fn batch_size(mut self, n: usize) -> Self {
        self.config.batch_size = n;
        self
    }

    pub fn batch_interval(mut self, d: Duration) -> Self {
        self.config.batch_interval = d;
        self
    }

    pub fn backpressure_ceiling(mut self, d: Duration) -> Self {
        self.config.backpressure_ceiling = d;
        self
    }

    pub fn failure_threshold(mut self, n: u32) -> Self {
        self.config.failure_threshold = n;
        self
    }

    pub fn breaker_cooldown(mut self, d: Duration) -> Self {
        self.config.breaker_cooldown = d;
        self
    }

    pub fn dead_letter_capacity(mut self, n: usize) -> Self {
        self.config.dead_letter_capacity = n;
        self
    }

    pub fn dead_letter_max_attempts(mut self, n: u32) -> Self {
        self.config.dead_letter_max_attempts = n;
        self
    }

    pub fn build(self) -> StreamPipelineConfig {
        self.config
    }
}
