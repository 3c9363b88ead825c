//! Client library for inspecting a running Bevy app over the Bevy Remote Protocol
//!
//! The remote app serves JSON-RPC 2.0 over HTTP (`bevy_remote`, port 15702 by
//! default). This crate wraps that endpoint in typed services, imports the
//! reflected type registry into a linked [`SchemaGraph`], and runs ECS queries
//! whose results can be walked as an entity hierarchy.
//!
//! # Usage
//!
//! ```no_run
//! use bevy_inspector_client::BevyRemoteClient;
//!
//! #[tokio::main]
//! async fn main() -> bevy_inspector_client::Result<()> {
//!     let client = BevyRemoteClient::from_env()?;
//!
//!     let store = client.schema_store();
//!     let snapshot = store.load().await?;
//!     for ty in snapshot.graph().types_reflecting("Component") {
//!         println!("{}", ty.name);
//!     }
//!
//!     let world = client.world();
//!     let result = world
//!         .query_builder()
//!         .component("bevy_transform::components::transform::Transform")
//!         .execute_structured(&world)
//!         .await?;
//!     for root in result.hierarchy().roots() {
//!         println!("{} ({} children)", root.entity(), root.children().count());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Logging
//!
//! Every network call and importer decision is reported through `tracing`.
//! Hosts without a subscriber of their own can call
//! [`logging::init_file_tracing`]; the level is read from
//! `BEVY_INSPECTOR_LOG` and can be changed later with
//! [`logging::set_tracing_level`].

mod entity;
mod error;
pub mod json;
pub mod logging;
pub mod query;
pub mod rpc;
pub mod schema;
pub mod service;
mod type_path;

pub use entity::Entity;
pub use error::{DiscardCancelled, Error, RemoteError, Result};
pub use json::Json;
pub use query::{Query, QueryBuilder, QueryResult, QueryRow};
pub use rpc::{ClientConfig, RpcClient, RpcMethod};
pub use schema::{BevyType, SchemaGraph, SchemaStore};
pub use service::BevyRemoteClient;
pub use type_path::{TypePath, simplify_type};
