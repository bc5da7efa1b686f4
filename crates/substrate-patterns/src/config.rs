//! Tunables for the pattern learning store (§6 "Configuration").

#[derive(Debug, Clone)]
pub struct PatternStoreConfig {
    /// Entries idle longer than this are treated as expired on next lookup.
    /// Default 30 days.
    pub ttl_days: i64,
    /// Minimum effective confidence for `lookup` to report a hit. Default 0.7.
    pub min_confidence_threshold: f64,
    /// Messages pulled per `readGroup` call. Default 10.
    pub consumer_batch: usize,
    /// Block duration for `readGroup` when the stream is empty. Default 5s.
    pub consumer_block: std::time::Duration,
    /// Backoff after a transport failure in the consumer loop. Default 5s.
    pub consumer_backoff: std::time::Duration,
    /// Bound on the idempotency dedup cache of processed message ids.
    pub dedup_cache_size: usize,
}

impl Default for PatternStoreConfig {
    fn default() -> Self {
        Self {
            ttl_days: 30,
            min_confidence_threshold: 0.7,
            consumer_batch: 10,
            consumer_block: std::time::Duration::from_secs(5),
            consumer_backoff: std::time::Duration::from_secs(5),
            dedup_cache_size: 10_000,
        }
    }
}

impl PatternStoreConfig {
    pub fn builder() -> PatternStoreConfigBuilder {
        PatternStoreConfigBuilder::default()
    }
}

#[derive(Debug, Clone, Default)]
pub struct PatternStoreConfigBuilder {
    config: PatternStoreConfig,
}

impl PatternStoreConfigBuilder {
    pub fn ttl_days(mut self, n: i64) -> Self {
        self.config.ttl_days = n;
        self
    }

    pub fn min_confidence_threshold(mut self, n: f64) -> Self {
        self.config.min_confidence_threshold = n;
        self
    }

    pub fn consumer_batch(mut self, n: usize) -> Self {
        self.config.consumer_batch = n;
        self
    }

    pub fn consumer_block(mut self, d: std::time::Duration) -> Self {
        self.config.consumer_block = d;
        self
    }

    pub fn consumer_backoff(mut self, d: std::time::Duration) -> Self {
        self.config.consumer_backoff = d;
        self
    }

    pub fn build(self) -> PatternStoreConfig {
        self.config
    }
}
