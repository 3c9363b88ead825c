//! Service façade over the JSON-RPC client
//!
//! Each service is a thin wrapper around a shared [`RpcClient`]; cloning any
//! of them is cheap and every clone talks to the same endpoint.

mod discovery;
mod inspector;
mod registry;
mod world;

pub use discovery::RpcService;
pub use inspector::InspectorService;
pub use registry::{RegistryService, SchemaFilter, TypeLimit};
pub use world::{ComponentService, ComponentValues, EntityService, ResourceService, WorldService};

use crate::error::Result;
use crate::rpc::{ClientConfig, RpcClient, Transport};
use crate::schema::SchemaStore;

/// Connection to one remote app
#[derive(Debug, Clone)]
pub struct BevyRemoteClient {
    client: RpcClient,
}

impl BevyRemoteClient {
    /// Client for the endpoint in `config`
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            client: RpcClient::new(config),
        }
    }

    /// Client for the endpoint named by `BRP_HOST` and `BRP_PORT`
    pub fn from_env() -> Result<Self> {
        Ok(Self::new(&ClientConfig::from_env()?))
    }

    /// Client over a custom transport
    pub fn with_transport(transport: impl Transport + 'static) -> Self {
        Self {
            client: RpcClient::with_transport(transport),
        }
    }

    /// `rpc.*` methods
    pub fn rpc(&self) -> RpcService {
        RpcService::new(self.client.clone())
    }

    /// `registry.*` methods
    pub fn registry(&self) -> RegistryService {
        RegistryService::new(self.client.clone())
    }

    /// `world.*` methods
    pub fn world(&self) -> WorldService {
        WorldService::new(self.client.clone())
    }

    /// `inspector.*` methods
    pub fn inspector(&self) -> InspectorService {
        InspectorService::new(self.client.clone())
    }

    /// Schema store fed by this connection
    pub fn schema_store(&self) -> SchemaStore {
        SchemaStore::new(self.registry(), self.rpc())
    }

    /// The underlying JSON-RPC client
    pub const fn client(&self) -> &RpcClient {
        &self.client
    }
}

impl Default for BevyRemoteClient {
    fn default() -> Self {
        Self::new(&ClientConfig::default())
    }
}
