//! Protocol and connection constants

use std::ops::RangeInclusive;

/// Default port the remote app listens on
pub const DEFAULT_BRP_PORT: u16 = 15702;

/// Default host for BRP connections
pub const BRP_DEFAULT_HOST: &str = "127.0.0.1";

/// Protocol used to reach the remote app
pub const BRP_HTTP_PROTOCOL: &str = "http";

/// Path of the JSON-RPC endpoint
pub const BRP_JSONRPC_PATH: &str = "/";

/// Environment variable overriding the port
pub const BRP_PORT_ENV_VAR: &str = "BRP_PORT";

/// Environment variable overriding the host
pub const BRP_HOST_ENV_VAR: &str = "BRP_HOST";

/// Ports accepted by [`super::Port`]
pub const VALID_PORT_RANGE: RangeInclusive<u16> = 1024..=65534;

/// JSON-RPC protocol version sent with every request
pub const JSONRPC_VERSION: &str = "2.0";

/// Idle timeout for connection pool in seconds
pub const POOL_IDLE_TIMEOUT: u64 = 300;

/// Maximum idle connections per host
pub const POOL_MAX_IDLE_PER_HOST: usize = 5;

/// Default request timeout in seconds
pub const DEFAULT_REQUEST_TIMEOUT: u64 = 30;

/// Connection timeout in seconds
pub const CONNECTION_TIMEOUT: u64 = 30;

/// JSON-RPC code for an unknown method
pub const JSON_RPC_ERROR_METHOD_NOT_FOUND: i32 = -32601;

/// Prefix of methods served by the inspector plugin rather than `bevy_remote`
pub const INSPECTOR_METHOD_PREFIX: &str = "inspector.";
