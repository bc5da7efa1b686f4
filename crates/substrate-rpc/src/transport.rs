//! The wire boundary the resilient client dispatches through.
//!
//! [`DownstreamTransport`] is the seam the content-specific services (file
//! parsing, malware scanning, vector search) sit behind — they are out of
//! scope per §1, so the client depends only on this trait. [`ReqwestTransport`]
//! is the one shipped implementation: a single pooled `reqwest::Client` per
//! downstream with keep-alive and a hard cap on idle connections, matching
//! §4.1's "single pooled HTTP transport per downstream ... hard cap on
//! concurrent sockets (>= 50)".

use std::marker::PhantomData;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::TransportError;

/// Minimum number of idle connections `ReqwestTransport` keeps warm per
/// downstream, matching the ">= 50" floor in §4.1.
pub const MIN_POOL_IDLE_PER_HOST: usize = 50;

/// Issues one validated request/response round trip against a downstream.
///
/// Implementors need not retry or apply a circuit breaker themselves —
/// [`crate::client::ResilientRpcClient`] composes those around this trait,
/// per the design note that retry/backoff belongs in the RPC client alone
/// (§9: "upper layers must not retry on top of it").
#[async_trait]
pub trait DownstreamTransport<Req, Resp>: Send + Sync {
    /// Issues one request attempt with the given deadline. Implementations
    /// must honor the deadline and surface timeouts as
    /// [`TransportError::Network`].
    async fn send(&self, request: &Req, deadline: Duration) -> Result<Resp, TransportError>;

    /// Probes liveness via the downstream's health endpoint (§6: "`GET
    /// /health`; 200 means healthy"). Not gated behind breaker state — a
    /// separate, first-class concern usable by an operator dashboard.
    async fn health(&self) -> bool;
}

/// A `reqwest`-backed [`DownstreamTransport`] that POSTs `Req` as JSON to a
/// fixed path on a fixed base URL and decodes `Resp` from the JSON body.
pub struct ReqwestTransport<Req, Resp> {
    client: reqwest::Client,
    base_url: String,
    execute_path: &'static str,
    health_path: &'static str,
    _phantom: PhantomData<fn(Req) -> Resp>,
}

impl<Req, Resp> ReqwestTransport<Req, Resp> {
    /// Builds a transport with a dedicated connection pool for `base_url`.
    ///
    /// `execute_path` and `health_path` are the downstream's operation and
    /// health-check routes (e.g. `/execute`, `/health` for the sandbox, §6).
    pub fn new(base_url: impl Into<String>, execute_path: &'static str, health_path: &'static str) -> Self {
        let client = reqwest::Client::builder()
            .pool_max_idle_per_host(MIN_POOL_IDLE_PER_HOST)
            .tcp_keepalive(Duration::from_secs(30))
            .build()
            .expect("reqwest client configuration is valid");

        Self {
            client,
            base_url: base_url.into(),
            execute_path,
            health_path,
            _phantom: PhantomData,
        }
    }
}

#[async_trait]
impl<Req, Resp> DownstreamTransport<Req, Resp> for ReqwestTransport<Req, Resp>
where
    Req: Serialize + Send + Sync,
    Resp: DeserializeOwned + Send + Sync,
{
    async fn send(&self, request: &Req, deadline: Duration) -> Result<Resp, TransportError> {
        let url = format!("{}{}", self.base_url, self.execute_path);

        let response = self
            .client
            .post(&url)
            .json(request)
            .timeout(deadline)
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            response
                .json::<Resp>()
                .await
                .map_err(|e| TransportError::Decode(e.to_string()))
        } else {
            let body = response.text().await.unwrap_or_default();
            if status.is_server_error() {
                Err(TransportError::ServerError {
                    status: status.as_u16(),
                    body,
                })
            } else {
                Err(TransportError::ClientError {
                    status: status.as_u16(),
                    body,
                })
            }
        }
    }

    async fn health(&self) -> bool {
        let url = format!("{}{}", self.base_url, self.health_path);
        matches!(self.client.get(&url).send().await, Ok(resp) if resp.status().is_success())
    }
}
