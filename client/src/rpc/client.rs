//! JSON-RPC client with request correlation and cooperative cancellation
//!
//! `RpcClient` is cheap to clone; clones share the transport and the id
//! counter, so calls issued concurrently from many tasks stay independently
//! resolvable.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use error_stack::Report;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::config::ClientConfig;
use super::constants::JSON_RPC_ERROR_METHOD_NOT_FOUND;
use super::method::RpcMethod;
use super::transport::{HttpTransport, Transport};
use super::types::{JsonRpcRequest, JsonRpcResponse};
use crate::error::{Error, Result};

/// Client for invoking methods on a remote app
#[derive(Clone)]
pub struct RpcClient {
    transport: Arc<dyn Transport>,
    next_id:   Arc<AtomicU64>,
}

impl std::fmt::Debug for RpcClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcClient")
            .field("next_id", &self.next_id.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl RpcClient {
    /// Client speaking HTTP to the endpoint in `config`
    pub fn new(config: &ClientConfig) -> Self {
        Self::with_transport(HttpTransport::new(config))
    }

    /// Client over an arbitrary transport
    pub fn with_transport(transport: impl Transport + 'static) -> Self {
        Self {
            transport: Arc::new(transport),
            next_id:   Arc::new(AtomicU64::new(1)),
        }
    }

    /// Serialize parameters, dropping `null`
    pub fn prepare_params<P: Serialize + ?Sized>(params: &P) -> Result<Option<Value>> {
        let value = serde_json::to_value(params).map_err(|e| {
            Report::new(Error::InvalidArgument(format!(
                "Failed to serialize parameters: {e}"
            )))
        })?;
        Ok((!value.is_null()).then_some(value))
    }

    /// Invoke `method` and decode its result as `R`
    pub async fn invoke<P, R>(&self, method: RpcMethod, params: &P) -> Result<R>
    where
        P: Serialize + ?Sized + Sync,
        R: DeserializeOwned,
    {
        let params = Self::prepare_params(params)?;
        let result = self.invoke_raw(method.as_str(), params).await?;
        decode_result(method.as_str(), result)
    }

    /// [`Self::invoke`], abandoned with [`Error::Cancelled`] once `cancel` fires
    pub async fn invoke_cancellable<P, R>(
        &self,
        method: RpcMethod,
        params: &P,
        cancel: &CancellationToken,
    ) -> Result<R>
    where
        P: Serialize + ?Sized + Sync,
        R: DeserializeOwned,
    {
        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                debug!("{method}: cancelled by caller");
                Err(Report::new(Error::Cancelled).attach(format!("Method: {method}")))
            }
            result = self.invoke(method, params) => result,
        }
    }

    /// [`Self::invoke_cancellable`] when a token is given, [`Self::invoke`] otherwise
    pub async fn call<P, R>(
        &self,
        method: RpcMethod,
        params: &P,
        cancel: Option<&CancellationToken>,
    ) -> Result<R>
    where
        P: Serialize + ?Sized + Sync,
        R: DeserializeOwned,
    {
        match cancel {
            Some(cancel) => self.invoke_cancellable(method, params, cancel).await,
            None => self.invoke(method, params).await,
        }
    }

    /// Invoke any method by name and return the raw result
    ///
    /// A missing `result` comes back as `Value::Null`.
    pub async fn invoke_raw(&self, method: &str, params: Option<Value>) -> Result<Value> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = JsonRpcRequest::new(method, id, params);
        let response = self.transport.send(&request).await?;
        Self::unwrap_response(&request, response)
    }

    fn unwrap_response(request: &JsonRpcRequest, response: JsonRpcResponse) -> Result<Value> {
        if let Some(error) = response.error {
            warn!(
                "{}: remote returned error - code={}, message={}",
                request.method, error.code, error.message
            );
            let hint_needed = error.code == JSON_RPC_ERROR_METHOD_NOT_FOUND
                && request
                    .method
                    .parse::<RpcMethod>()
                    .is_ok_and(RpcMethod::is_inspector_method);
            let report = Report::new(Error::Remote(error))
                .attach(format!("Method: {}, Request id: {}", request.method, request.id));
            return Err(if hint_needed {
                report.attach("This method requires the inspector plugin in the remote app")
            } else {
                report
            });
        }

        if let Some(id) = response.id
            && id != request.id
        {
            warn!(
                "{}: response id {id} does not match request id {}",
                request.method, request.id
            );
            return Err(Report::new(Error::transport_failed(
                &request.method,
                format!("response id {id} does not match request id {}", request.id),
            )));
        }

        Ok(response.result.unwrap_or(Value::Null))
    }
}

fn decode_result<R: DeserializeOwned>(method: &str, result: Value) -> Result<R> {
    serde_json::from_value(result).map_err(|e| {
        warn!("{method}: result decoding failed - error={e}");
        Report::new(Error::unexpected("result shape", e)).attach(format!("Method: {method}"))
    })
}
