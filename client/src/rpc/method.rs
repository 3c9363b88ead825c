//! Catalog of remote methods and their wire names

use strum::{AsRefStr, Display, EnumIter, EnumString, IntoStaticStr};

use super::constants::INSPECTOR_METHOD_PREFIX;

/// Remote methods this client knows how to call
///
/// Serialized names match the method strings registered by `bevy_remote` and
/// the inspector plugin.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr, EnumString, EnumIter, IntoStaticStr,
)]
pub enum RpcMethod {
    /// `rpc.discover`: OpenRPC description of every method
    #[strum(serialize = "rpc.discover")]
    Discover,
    /// `registry.schema`: reflection schema of registered types
    #[strum(serialize = "registry.schema")]
    RegistrySchema,
    /// `world.query`: entities matching a query
    #[strum(serialize = "world.query")]
    WorldQuery,
    /// `world.list_components`: component names on an entity
    #[strum(serialize = "world.list_components")]
    ListComponents,
    /// `world.get_components`: component values on an entity
    #[strum(serialize = "world.get_components")]
    GetComponents,
    /// `world.list_resources`: registered resource names
    #[strum(serialize = "world.list_resources")]
    ListResources,
    /// `world.get_resources`: value of one resource
    #[strum(serialize = "world.get_resources")]
    GetResources,
    /// `inspector.trigger_event`: trigger an event by type name
    #[strum(serialize = "inspector.trigger_event")]
    TriggerEvent,
}

impl RpcMethod {
    /// The wire method name
    pub fn as_str(self) -> &'static str {
        self.into()
    }

    /// Whether the method is served by the inspector plugin rather than `bevy_remote`
    pub fn is_inspector_method(self) -> bool {
        self.as_str().starts_with(INSPECTOR_METHOD_PREFIX)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn test_method_names_round_trip() {
        for method in RpcMethod::iter() {
            assert_eq!(method.as_str().parse::<RpcMethod>().unwrap(), method);
            assert_eq!(method.to_string(), method.as_str());
        }
        assert_eq!(RpcMethod::GetComponents.as_str(), "world.get_components");
    }

    #[test]
    fn test_inspector_methods() {
        assert!(RpcMethod::TriggerEvent.is_inspector_method());
        assert!(!RpcMethod::WorldQuery.is_inspector_method());
    }
}
