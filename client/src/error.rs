//! Crate-wide error type and result alias

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

// Error message prefixes
const MSG_FAILED_TO_PREFIX: &str = "Failed to";
const MSG_INVALID_PREFIX: &str = "Invalid";
const MSG_MISSING_PREFIX: &str = "Missing";
const MSG_UNEXPECTED_PREFIX: &str = "Unexpected";

/// Result type for the `bevy_inspector_client` library
pub type Result<T> = core::result::Result<T, error_stack::Report<Error>>;

/// Structured error object returned by the remote app in place of a `result`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteError {
    /// JSON-RPC or BRP specific error code
    pub code:    i32,
    /// Human readable message, surfaced verbatim
    pub message: String,
    /// Optional extra payload attached by the server
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data:    Option<Value>,
}

impl std::fmt::Display for RemoteError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (error {})", self.message, self.code)
    }
}

/// Error categories for the inspector client
#[derive(Error, Debug)]
pub enum Error {
    /// The call was cancelled by its caller; never shown to a user
    #[error("Operation was cancelled")]
    Cancelled,

    /// A bare `$ref` schema showed up where only a resolved type is valid
    #[error("Contract violation: {0}")]
    ContractViolation(String),

    /// A structurally required value could not be decoded
    #[error("Decode failed: {0}")]
    Decode(String),

    /// Catch-all with a pre-formatted message
    #[error("{0}")]
    General(String),

    /// A caller supplied value was rejected before anything was sent
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The remote app answered with a JSON-RPC error object
    #[error("Remote error: {0}")]
    Remote(RemoteError),

    /// The schema registry could not be imported
    #[error("Schema import failed: {0}")]
    SchemaImport(String),

    /// Connection, timeout, HTTP status or envelope failures
    #[error("Transport failed: {0}")]
    Transport(String),
}

impl Error {
    /// Create a "Failed to X" error
    pub fn failed_to(action: &str, details: impl std::fmt::Display) -> Self {
        Self::General(format!("{MSG_FAILED_TO_PREFIX} {action}: {details}"))
    }

    /// Create an "Invalid X" error
    pub fn invalid(what: &str, details: impl std::fmt::Display) -> Self {
        Self::InvalidArgument(format!("{MSG_INVALID_PREFIX} {what}: {details}"))
    }

    /// Create a "Missing X" decode error
    pub fn missing(what: &str) -> Self {
        Self::Decode(format!("{MSG_MISSING_PREFIX} {what}"))
    }

    /// Create an "Unexpected X" decode error
    pub fn unexpected(what: &str, details: impl std::fmt::Display) -> Self {
        Self::Decode(format!("{MSG_UNEXPECTED_PREFIX} {what}: {details}"))
    }

    /// Create error for transport failures of a given RPC method
    pub fn transport_failed(method: &str, error: impl std::fmt::Display) -> Self {
        Self::Transport(format!("{MSG_FAILED_TO_PREFIX} send {method} request: {error}"))
    }

    /// Whether this error represents a caller-initiated cancellation
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// The remote error object, if the server rejected the call
    pub const fn remote(&self) -> Option<&RemoteError> {
        match self {
            Self::Remote(error) => Some(error),
            _ => None,
        }
    }
}

/// Extension for results whose cancellation should be silently dropped
///
/// Cancelled calls become `Ok(None)`; every other failure is kept.
pub trait DiscardCancelled<T> {
    /// Map a cancellation to `Ok(None)` and a success to `Ok(Some(_))`
    fn discard_cancelled(self) -> Result<Option<T>>;
}

impl<T> DiscardCancelled<T> for Result<T> {
    fn discard_cancelled(self) -> Result<Option<T>> {
        match self {
            Ok(value) => Ok(Some(value)),
            Err(report) if report.current_context().is_cancelled() => {
                tracing::debug!("Discarding cancelled operation");
                Ok(None)
            },
            Err(report) => Err(report),
        }
    }
}
