//! In-memory transport with canned replies per method

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use super::constants::JSON_RPC_ERROR_METHOD_NOT_FOUND;
use super::method::RpcMethod;
use super::transport::Transport;
use super::types::{JsonRpcRequest, JsonRpcResponse};
use crate::error::{RemoteError, Result};

#[derive(Clone)]
struct Reply {
    outcome: core::result::Result<Value, RemoteError>,
    delay:   Duration,
}

/// Transport answering from a table of canned replies and recording requests
///
/// Clones share the reply table and the request log.
#[derive(Clone, Default)]
pub struct MockTransport {
    replies:   Arc<Mutex<HashMap<String, Reply>>>,
    requests:  Arc<Mutex<Vec<JsonRpcRequest>>>,
    delay:     Duration,
    id_offset: u64,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `method` with `result`
    #[must_use]
    pub fn respond(self, method: RpcMethod, result: Value) -> Self {
        self.set_reply(method, Ok(result), self.delay);
        self
    }

    /// Answer `method` with a remote error
    #[must_use]
    pub fn fail(self, method: RpcMethod, error: RemoteError) -> Self {
        self.set_reply(method, Err(error), self.delay);
        self
    }

    /// Delay every reply registered after this call
    #[must_use]
    pub const fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Answer with ids that do not match the request
    #[must_use]
    pub const fn with_id_offset(mut self, offset: u64) -> Self {
        self.id_offset = offset;
        self
    }

    /// Replace the reply for `method` while the transport is in use
    pub fn set_reply(
        &self,
        method: RpcMethod,
        outcome: core::result::Result<Value, RemoteError>,
        delay: Duration,
    ) {
        self.replies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(method.as_str().to_string(), Reply { outcome, delay });
    }

    /// Every request seen so far, in arrival order
    pub fn requests(&self) -> Vec<JsonRpcRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Requests seen for `method`
    pub fn requests_for(&self, method: RpcMethod) -> Vec<JsonRpcRequest> {
        self.requests()
            .into_iter()
            .filter(|request| request.method == method.as_str())
            .collect()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: &JsonRpcRequest) -> Result<JsonRpcResponse> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request.clone());

        let reply = self
            .replies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&request.method)
            .cloned();

        let id = request.id + self.id_offset;
        let Some(reply) = reply else {
            return Ok(JsonRpcResponse::failure(
                id,
                RemoteError {
                    code:    JSON_RPC_ERROR_METHOD_NOT_FOUND,
                    message: format!("Method `{}` not found", request.method),
                    data:    None,
                },
            ));
        };

        if !reply.delay.is_zero() {
            tokio::time::sleep(reply.delay).await;
        }

        Ok(match reply.outcome {
            Ok(result) => JsonRpcResponse::success(id, result),
            Err(error) => JsonRpcResponse::failure(id, error),
        })
    }
}
