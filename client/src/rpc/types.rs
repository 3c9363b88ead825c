//! JSON-RPC 2.0 envelopes

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::constants::JSONRPC_VERSION;
use crate::error::RemoteError;

/// Request envelope posted to the remote app
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    /// Always `"2.0"`
    pub jsonrpc: String,
    /// Method name, e.g. `world.query`
    pub method:  String,
    /// Correlates the response with this request
    pub id:      u64,
    /// Method parameters, omitted when the method takes none
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params:  Option<Value>,
}

impl JsonRpcRequest {
    /// Build a request envelope
    pub fn new(method: impl Into<String>, id: u64, params: Option<Value>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            method: method.into(),
            id,
            params,
        }
    }
}

/// Response envelope; exactly one of `result` and `error` is meaningful
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    /// Protocol version reported by the server
    #[serde(default)]
    pub jsonrpc: String,
    /// Id of the request this answers; `null` for some protocol errors
    #[serde(default)]
    pub id:      Option<u64>,
    /// Successful result
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result:  Option<Value>,
    /// Error object replacing `result`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error:   Option<RemoteError>,
}

impl JsonRpcResponse {
    /// A successful response to request `id`
    pub fn success(id: u64, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id:      Some(id),
            result:  Some(result),
            error:   None,
        }
    }

    /// An error response to request `id`
    pub fn failure(id: u64, error: RemoteError) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id:      Some(id),
            result:  None,
            error:   Some(error),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_request_omits_missing_params() {
        let request = JsonRpcRequest::new("rpc.discover", 3, None);
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({"jsonrpc": "2.0", "method": "rpc.discover", "id": 3})
        );
    }

    #[test]
    fn test_response_with_error() {
        let response: JsonRpcResponse = serde_json::from_value(json!({
            "jsonrpc": "2.0",
            "id": null,
            "error": {"code": -32601, "message": "Method not found"}
        }))
        .unwrap();
        assert_eq!(response.id, None);
        assert_eq!(response.result, None);
        assert_eq!(response.error.unwrap().code, -32601);
    }

    #[test]
    fn test_null_result_is_absent() {
        let response: JsonRpcResponse =
            serde_json::from_value(json!({"jsonrpc": "2.0", "id": 1, "result": null})).unwrap();
        assert_eq!(response.result, None);
        assert_eq!(response.error, None);
    }
}
