//! Process-wide configuration (§5, §6: "per-downstream base URL, per-downstream
//! breaker parameters, streaming pipeline parameters ... all configurable at
//! process start; no hot reload required").
//!
//! Kept to explicit, manual environment parsing rather than a config crate —
//! there are few enough knobs that a derive macro would add indirection
//! without saving real code, and the teacher's own per-layer config is always
//! a hand-written builder.

use std::env;
use std::time::Duration;

use substrate_rpc::downstream::default_timeout_for_service;

/// One downstream's wiring: where it lives and how its breaker is tuned.
#[derive(Debug, Clone)]
pub struct DownstreamConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub failure_threshold: u32,
    pub success_threshold: u32,
    pub cooldown: Duration,
}

impl DownstreamConfig {
    fn from_env(service: &'static str, default_base_url: &str) -> Self {
        let prefix = format!("SUBSTRATE_{}", service.to_uppercase());
        Self {
            base_url: env::var(format!("{prefix}_URL")).unwrap_or_else(|_| default_base_url.to_string()),
            timeout: default_timeout_for_service(service).unwrap_or(Duration::from_secs(120)),
            failure_threshold: env_u32(&format!("{prefix}_FAILURE_THRESHOLD"), 5),
            success_threshold: env_u32(&format!("{prefix}_SUCCESS_THRESHOLD"), 2),
            cooldown: Duration::from_secs(env_u64(&format!("{prefix}_COOLDOWN_SECS"), 60)),
        }
    }
}

/// Streaming storage pipeline knobs (§4.2).
#[derive(Debug, Clone)]
pub struct StreamingConfig {
    pub max_queue_depth: usize,
    pub batch_size: usize,
}

/// Pattern learning store knobs (§4.3).
#[derive(Debug, Clone)]
pub struct PatternStoreConfigEnv {
    pub ttl_days: i64,
    pub min_confidence: f64,
}

/// Workflow planner/executor knobs (§4.4, §4.5).
#[derive(Debug, Clone)]
pub struct WorkflowConfig {
    pub max_concurrent_steps: usize,
    pub default_plan_timeout: Duration,
}

/// The whole process's assembled configuration; every field has a sane
/// default so a bare `PlatformConfig::from_env()` works against nothing but
/// environment defaults (useful for tests and local runs).
#[derive(Debug, Clone)]
pub struct PlatformConfig {
    pub sandbox: DownstreamConfig,
    pub fileprocess: DownstreamConfig,
    pub cyberagent: DownstreamConfig,
    pub mageagent: DownstreamConfig,
    pub graphrag: DownstreamConfig,
    pub streaming: StreamingConfig,
    pub pattern_store: PatternStoreConfigEnv,
    pub workflow: WorkflowConfig,
    /// Maximum in-flight workflows per tenant (§9 enrichment: bulkhead-based
    /// tenant isolation so one tenant cannot starve another's capacity).
    pub max_concurrent_workflows_per_tenant: usize,
}

impl PlatformConfig {
    /// Builds the configuration from environment variables, falling back to
    /// defaults for anything unset. Never panics; malformed numeric values
    /// fall back silently to their default rather than failing process
    /// start, matching §6's "no hot reload required" (startup is the only
    /// configuration event, and it should not be fragile).
    pub fn from_env() -> Self {
        Self {
            sandbox: DownstreamConfig::from_env("sandbox", "http://sandbox.internal"),
            fileprocess: DownstreamConfig::from_env("fileprocess", "http://fileprocess.internal"),
            cyberagent: DownstreamConfig::from_env("cyberagent", "http://cyberagent.internal"),
            mageagent: DownstreamConfig::from_env("mageagent", "http://mageagent.internal"),
            graphrag: DownstreamConfig::from_env("graphrag", "http://graphrag.internal"),
            streaming: StreamingConfig {
                max_queue_depth: env_usize("SUBSTRATE_STREAM_MAX_QUEUE_DEPTH", 1_000),
                batch_size: env_usize("SUBSTRATE_STREAM_BATCH_SIZE", 50),
            },
            pattern_store: PatternStoreConfigEnv {
                ttl_days: env_i64("SUBSTRATE_PATTERN_TTL_DAYS", 30),
                min_confidence: env_f64("SUBSTRATE_PATTERN_MIN_CONFIDENCE", 0.3),
            },
            workflow: WorkflowConfig {
                max_concurrent_steps: env_usize("SUBSTRATE_WORKFLOW_MAX_CONCURRENT_STEPS", 5),
                default_plan_timeout: Duration::from_secs(env_u64("SUBSTRATE_WORKFLOW_TIMEOUT_SECS", 600)),
            },
            max_concurrent_workflows_per_tenant: env_usize("SUBSTRATE_MAX_WORKFLOWS_PER_TENANT", 10),
        }
    }
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

fn env_u32(key: &str, default: u32) -> u32 {
    env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_u64(key: &str, default: u64) -> u64 {
    env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_i64(key: &str, default: i64) -> i64 {
    env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_usize(key: &str, default: usize) -> usize {
    env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_f64(key: &str, default: f64) -> f64 {
    env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}
