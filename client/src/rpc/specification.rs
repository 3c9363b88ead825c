//! OpenRPC document returned by `rpc.discover`

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::json::Json;

/// Catalog of the methods a remote app serves
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Specification {
    /// OpenRPC version of the document
    pub openrpc:       String,
    /// Title and version of the remote server
    pub info:          Info,
    /// Endpoints the server advertises
    #[serde(default)]
    pub servers:       Vec<Server>,
    /// Every callable method
    #[serde(default)]
    pub methods:       Vec<Method>,
    /// Shared schema definitions
    #[serde(default)]
    pub components:    Components,
    /// Link to external documentation, kept opaque
    #[serde(default, skip_serializing_if = "Json::is_undefined")]
    pub external_docs: Json,
}

/// Server identification
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Info {
    /// Server title
    pub title:   String,
    /// Server version
    pub version: String,
}

/// An advertised endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Server {
    /// Display name
    pub name: String,
    /// Endpoint URL
    pub url:  String,
}

/// One callable method
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Method {
    /// Method name, e.g. `world.query`
    pub name:   String,
    /// Parameter descriptors, kept opaque
    #[serde(default)]
    pub params: Vec<Json>,
}

/// Shared schema definitions keyed by name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Components {
    /// Schemas referenced by methods
    #[serde(default)]
    pub schemas: BTreeMap<String, Json>,
}

impl Specification {
    /// Look up a method by name
    pub fn method(&self, name: &str) -> Option<&Method> {
        self.methods.iter().find(|method| method.name == name)
    }

    /// Method names in alphabetical order
    pub fn method_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.methods.iter().map(|m| m.name.as_str()).collect();
        names.sort_unstable();
        names
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_decode_minimal_document() {
        let spec: Specification = serde_json::from_value(json!({
            "openrpc": "1.3.2",
            "info": {"title": "Bevy Remote Protocol", "version": "0.17.0"},
            "methods": [
                {"name": "world.query", "params": []},
                {"name": "rpc.discover", "params": []}
            ]
        }))
        .unwrap();
        assert_eq!(spec.info.title, "Bevy Remote Protocol");
        assert!(spec.servers.is_empty());
        assert!(spec.components.schemas.is_empty());
        assert!(spec.external_docs.is_undefined());
        assert_eq!(spec.method_names(), vec!["rpc.discover", "world.query"]);
        assert!(spec.method("world.query").is_some());
        assert!(spec.method("world.spawn_entity").is_none());
    }
}
