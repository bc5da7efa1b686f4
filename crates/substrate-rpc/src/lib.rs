//! The resilient RPC client fronting every flaky downstream.
//!
//! Composes three platform primitives around a single generic operation,
//! `execute(request) -> result` (§4.1):
//!
//! 1. [`validation`] fails fast on malformed requests without ever touching
//!    the circuit breaker or retry budget.
//! 2. [`substrate_circuitbreaker::CircuitBreakerHandle`] gates admission —
//!    an open breaker returns [`error::RpcError::Unavailable`] without
//!    issuing a wire call.
//! 3. [`client::ResilientRpcClient`] retries transient failures (network
//!    errors, 5xx) up to three times with exponential backoff, then reports
//!    the call's final outcome to the breaker.
//!
//! The wire boundary itself is abstracted behind [`transport::DownstreamTransport`]
//! so the content-specific services (sandbox, file processor, cyber scanner,
//! knowledge store) stay out of this crate's scope — only their contracts
//! (see [`downstream`]) are modeled.
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use substrate_rpc::client::{ResilientRpcClient, RpcClientConfig};
//! use substrate_rpc::downstream::{SandboxRequest, SandboxResponse, ResourceLimits};
//! use substrate_rpc::transport::ReqwestTransport;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let transport: ReqwestTransport<SandboxRequest, SandboxResponse> =
//!     ReqwestTransport::new("https://sandbox.internal", "/execute", "/health");
//!
//! let config = RpcClientConfig::builder("sandbox.execute", Duration::from_secs(300)).build();
//! let client = ResilientRpcClient::new(transport, config);
//!
//! let request = SandboxRequest {
//!     code: "print('hi')".into(),
//!     language: "python".into(),
//!     packages: None,
//!     files: None,
//!     timeout_ms: 5_000,
//!     resource_limits: ResourceLimits { memory: "512Mi".into(), cpu_millis: None },
//!     metadata: None,
//! };
//!
//! let response = client.execute(&request).await?;
//! # let _ = response;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod downstream;
pub mod error;
pub mod transport;
pub mod validation;

pub use client::{ResilientRpcClient, RpcClientConfig, RpcClientConfigBuilder};
pub use error::{RpcError, TransportError};
pub use transport::{DownstreamTransport, ReqwestTransport};
pub use validation::Validate;
