//! HTTP transport for JSON-RPC envelopes
//!
//! All transports built with default timeouts share one pooled
//! `reqwest::Client` so concurrent calls reuse connections.

use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, warn};

use super::config::ClientConfig;
use super::constants::{
    CONNECTION_TIMEOUT, DEFAULT_REQUEST_TIMEOUT, POOL_IDLE_TIMEOUT, POOL_MAX_IDLE_PER_HOST,
};
use super::types::{JsonRpcRequest, JsonRpcResponse};
use crate::error::{Error, Result};

/// Moves one request envelope to the remote app and brings back its response
///
/// Implementations report connection, timeout, status and envelope decoding
/// failures as [`Error::Transport`]. A response carrying an `error` object is
/// a successful transport outcome.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send `request` and wait for its response
    async fn send(&self, request: &JsonRpcRequest) -> Result<JsonRpcResponse>;
}

/// Shared HTTP client instance with connection pooling
static HTTP_CLIENT: LazyLock<Client> = LazyLock::new(|| {
    build_client(
        Duration::from_secs(DEFAULT_REQUEST_TIMEOUT),
        Duration::from_secs(CONNECTION_TIMEOUT),
    )
});

fn build_client(timeout: Duration, connect_timeout: Duration) -> Client {
    Client::builder()
        .pool_idle_timeout(Duration::from_secs(POOL_IDLE_TIMEOUT))
        .pool_max_idle_per_host(POOL_MAX_IDLE_PER_HOST)
        .timeout(timeout)
        .connect_timeout(connect_timeout)
        .build()
        .unwrap_or_else(|_| Client::new())
}

/// JSON-RPC over HTTP POST
#[derive(Debug, Clone)]
pub struct HttpTransport {
    url:    String,
    client: Client,
}

impl HttpTransport {
    /// Transport for the endpoint described by `config`
    pub fn new(config: &ClientConfig) -> Self {
        let defaults = ClientConfig::default();
        let client = if config.timeout == defaults.timeout
            && config.connect_timeout == defaults.connect_timeout
        {
            HTTP_CLIENT.clone()
        } else {
            build_client(config.timeout, config.connect_timeout)
        };
        Self {
            url: config.url(),
            client,
        }
    }

    /// Endpoint this transport posts to
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Check if the HTTP response status is successful
    fn check_status(&self, request: &JsonRpcRequest, response: &reqwest::Response) -> Result<()> {
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        warn!("{}: HTTP status error - status={status}", request.method);
        Err(error_stack::Report::new(Error::transport_failed(
            &request.method,
            format!(
                "HTTP error {}: {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("Unknown error")
            ),
        ))
        .attach(format!("URL: {}", self.url)))
    }

    /// Classify a reqwest failure
    fn handle_error(&self, request: &JsonRpcRequest, e: &reqwest::Error) -> error_stack::Report<Error> {
        warn!("{}: HTTP request failed - error={e}", request.method);

        let error_type = if e.is_timeout() {
            "Timeout"
        } else if e.is_connect() {
            "Connection failed"
        } else if e.is_request() {
            "Request error"
        } else if e.is_body() {
            "Body error"
        } else if e.is_decode() {
            "Decode error"
        } else {
            "Unknown error type"
        };

        error_stack::Report::new(Error::transport_failed(
            &request.method,
            format!("{error_type}: {e}"),
        ))
        .attach(format!("URL: {}, Request id: {}", self.url, request.id))
        .attach(format!("Full error: {e:?}"))
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: &JsonRpcRequest) -> Result<JsonRpcResponse> {
        debug!(
            "{}: sending request id={} to {}",
            request.method, request.id, self.url
        );

        let response = self
            .client
            .post(&self.url)
            .json(request)
            .send()
            .await
            .map_err(|e| self.handle_error(request, &e))?;

        self.check_status(request, &response)?;

        response
            .json::<JsonRpcResponse>()
            .await
            .map_err(|e| self.handle_error(request, &e))
    }
}
