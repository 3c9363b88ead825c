//! `registry.schema` access

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::Result;
use crate::rpc::{RpcClient, RpcMethod};
use crate::schema::RawSchema;
use crate::type_path::TypePath;

/// Filters for `registry.schema`, passed through as given
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaFilter {
    /// Include only types from these crates; empty means every crate
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub with_crates:    Vec<String>,
    /// Exclude types from these crates
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub without_crates: Vec<String>,
    /// Reflect-marker constraints
    #[serde(default)]
    pub type_limit:     TypeLimit,
}

/// Reflect markers a type must or must not carry
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeLimit {
    /// Every listed marker must be present, e.g. `Component`
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub with:    Vec<String>,
    /// No listed marker may be present
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub without: Vec<String>,
}

impl SchemaFilter {
    /// Only types from crate `name`
    #[must_use]
    pub fn with_crate(mut self, name: impl Into<String>) -> Self {
        self.with_crates.push(name.into());
        self
    }

    /// No types from crate `name`
    #[must_use]
    pub fn without_crate(mut self, name: impl Into<String>) -> Self {
        self.without_crates.push(name.into());
        self
    }

    /// Only types reflecting `marker`
    #[must_use]
    pub fn with_marker(mut self, marker: impl Into<String>) -> Self {
        self.type_limit.with.push(marker.into());
        self
    }

    /// No types reflecting `marker`
    #[must_use]
    pub fn without_marker(mut self, marker: impl Into<String>) -> Self {
        self.type_limit.without.push(marker.into());
        self
    }
}

/// Entry point for the remote type registry
#[derive(Debug, Clone)]
pub struct RegistryService {
    client: RpcClient,
}

impl RegistryService {
    /// Service over `client`
    pub const fn new(client: RpcClient) -> Self {
        Self { client }
    }

    /// Raw schemas of every matching type, keyed by identifier
    pub async fn schema(&self, filter: &SchemaFilter) -> Result<BTreeMap<TypePath, RawSchema>> {
        self.schema_with(filter, None).await
    }

    /// [`Self::schema`], abandoned when `cancel` fires
    pub async fn schema_cancellable(
        &self,
        filter: &SchemaFilter,
        cancel: &CancellationToken,
    ) -> Result<BTreeMap<TypePath, RawSchema>> {
        self.schema_with(filter, Some(cancel)).await
    }

    async fn schema_with(
        &self,
        filter: &SchemaFilter,
        cancel: Option<&CancellationToken>,
    ) -> Result<BTreeMap<TypePath, RawSchema>> {
        let registry: BTreeMap<TypePath, RawSchema> = self
            .client
            .call(RpcMethod::RegistrySchema, filter, cancel)
            .await?;
        debug!("registry.schema returned {} types", registry.len());
        Ok(registry)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::rpc::mock::MockTransport;

    #[test]
    fn test_filter_wire_form() {
        assert_eq!(
            serde_json::to_value(SchemaFilter::default()).unwrap(),
            json!({"type_limit": {}})
        );
        let filter = SchemaFilter::default()
            .with_crate("game")
            .without_crate("bevy_render")
            .with_marker("Component")
            .without_marker("Resource");
        assert_eq!(
            serde_json::to_value(filter).unwrap(),
            json!({
                "with_crates": ["game"],
                "without_crates": ["bevy_render"],
                "type_limit": {"with": ["Component"], "without": ["Resource"]}
            })
        );
    }

    #[tokio::test]
    async fn test_schema_decodes_registry() {
        let mock = MockTransport::new().respond(
            RpcMethod::RegistrySchema,
            json!({
                "game::Health": {"shortPath": "Health", "kind": "Value", "reflectTypes": ["Component"]}
            }),
        );
        let service = RegistryService::new(RpcClient::with_transport(mock.clone()));
        let registry = service
            .schema(&SchemaFilter::default().with_crate("game"))
            .await
            .unwrap();
        assert_eq!(registry.len(), 1);
        assert_eq!(
            registry[&TypePath::from("game::Health")].short_path.as_deref(),
            Some("Health")
        );

        let request = &mock.requests_for(RpcMethod::RegistrySchema)[0];
        assert_eq!(
            request.params,
            Some(json!({"with_crates": ["game"], "type_limit": {}}))
        );
    }

    #[tokio::test]
    async fn test_non_object_registry_is_an_error() {
        let mock = MockTransport::new().respond(RpcMethod::RegistrySchema, json!([1, 2]));
        let service = RegistryService::new(RpcClient::with_transport(mock));
        assert!(service.schema(&SchemaFilter::default()).await.is_err());
    }
}
