//! `inspector.*` methods served by the inspector plugin in the remote app

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::Result;
use crate::json::Json;
use crate::rpc::{RpcClient, RpcMethod};
use crate::type_path::TypePath;

#[derive(Serialize)]
struct TriggerEventParams<'a> {
    event:   &'a TypePath,
    #[serde(skip_serializing_if = "is_undefined")]
    payload: &'a Json,
}

fn is_undefined(payload: &&Json) -> bool {
    payload.is_undefined()
}

/// Entry point for inspector-only methods
#[derive(Debug, Clone)]
pub struct InspectorService {
    client: RpcClient,
}

impl InspectorService {
    /// Service over `client`
    pub const fn new(client: RpcClient) -> Self {
        Self { client }
    }

    /// Trigger `event` with `payload`; an undefined payload is left out
    pub async fn trigger(&self, event: &TypePath, payload: &Json) -> Result<()> {
        self.trigger_with(event, payload, None).await
    }

    /// Trigger a unit event
    pub async fn trigger_unit(&self, event: &TypePath) -> Result<()> {
        self.trigger_with(event, &Json::Undefined, None).await
    }

    /// [`Self::trigger`], abandoned when `cancel` fires
    pub async fn trigger_cancellable(
        &self,
        event: &TypePath,
        payload: &Json,
        cancel: &CancellationToken,
    ) -> Result<()> {
        self.trigger_with(event, payload, Some(cancel)).await
    }

    async fn trigger_with(
        &self,
        event: &TypePath,
        payload: &Json,
        cancel: Option<&CancellationToken>,
    ) -> Result<()> {
        debug!("Triggering {event}");
        let params = TriggerEventParams { event, payload };
        let _: Option<serde::de::IgnoredAny> = self
            .client
            .call(RpcMethod::TriggerEvent, &params, cancel)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::error::RemoteError;
    use crate::rpc::mock::MockTransport;

    #[tokio::test]
    async fn test_trigger_payload_forms() {
        let mock = MockTransport::new().respond(RpcMethod::TriggerEvent, serde_json::Value::Null);
        let inspector = InspectorService::new(RpcClient::with_transport(mock.clone()));
        let event = TypePath::from("game::Explode");

        inspector
            .trigger(&event, &serde_json::from_value(json!({"radius": 2.5})).unwrap())
            .await
            .unwrap();
        inspector.trigger_unit(&event).await.unwrap();
        inspector.trigger(&event, &Json::Null).await.unwrap();

        let params: Vec<_> = mock
            .requests()
            .into_iter()
            .map(|request| request.params.unwrap())
            .collect();
        assert_eq!(params[0], json!({"event": "game::Explode", "payload": {"radius": 2.5}}));
        assert_eq!(params[1], json!({"event": "game::Explode"}));
        assert_eq!(params[2], json!({"event": "game::Explode", "payload": null}));
    }

    #[tokio::test]
    async fn test_missing_plugin_surfaces_remote_error() {
        let mock = MockTransport::new();
        let inspector = InspectorService::new(RpcClient::with_transport(mock));
        let error = inspector
            .trigger_unit(&TypePath::from("game::Explode"))
            .await
            .unwrap_err();
        let remote: &RemoteError = error.current_context().remote().unwrap();
        assert_eq!(remote.code, crate::rpc::constants::JSON_RPC_ERROR_METHOD_NOT_FOUND);
    }
}
