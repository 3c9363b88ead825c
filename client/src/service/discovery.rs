//! `rpc.discover`

use serde_json::{Map, Value};
use tokio_util::sync::CancellationToken;

use crate::error::Result;
use crate::rpc::{RpcClient, RpcMethod, Specification};

/// Entry point for the remote method catalog
#[derive(Debug, Clone)]
pub struct RpcService {
    client: RpcClient,
}

impl RpcService {
    /// Service over `client`
    pub const fn new(client: RpcClient) -> Self {
        Self { client }
    }

    /// The OpenRPC document describing every method the app serves
    pub async fn discover(&self) -> Result<Specification> {
        self.discover_with(None).await
    }

    /// [`Self::discover`], abandoned when `cancel` fires
    pub async fn discover_cancellable(&self, cancel: &CancellationToken) -> Result<Specification> {
        self.discover_with(Some(cancel)).await
    }

    async fn discover_with(&self, cancel: Option<&CancellationToken>) -> Result<Specification> {
        let params = Value::Object(Map::new());
        self.client.call(RpcMethod::Discover, &params, cancel).await
    }
}
