//! Core infrastructure shared by every substrate crate.
//!
//! This crate provides the machinery every pattern crate builds on:
//! - [`tenant`]: tenant/request identity propagation.
//! - [`error`]: the platform-wide error taxonomy.
//! - [`events`]: the observability event bus used by circuit breaker, retry,
//!   bulkhead, streaming, and pattern-store crates alike.
//! - [`metrics`]: typed metric emission helpers over the `metrics` facade.

pub mod error;
pub mod events;
#[cfg(feature = "metrics")]
pub mod metrics;
pub mod tenant;

pub use error::{Kind, PlatformError};
pub use events::{EventListener, EventListeners, FnListener, ResilienceEvent};
pub use tenant::{ContextSource, TenantContext, TenantContextError};
