//! JSON-RPC plumbing: configuration, transport, envelopes and the method catalog

mod client;
mod config;
pub mod constants;
mod method;
#[cfg(test)]
pub(crate) mod mock;
mod port;
mod specification;
mod transport;
mod types;

pub use client::RpcClient;
pub use config::ClientConfig;
pub use method::RpcMethod;
pub use port::Port;
pub use specification::{Components, Info, Method, Server, Specification};
pub use transport::{HttpTransport, Transport};
pub use types::{JsonRpcRequest, JsonRpcResponse};
