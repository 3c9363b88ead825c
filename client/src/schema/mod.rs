//! Type registry import
//!
//! `registry.schema` returns one JSON schema per reflected type. [`import`]
//! turns that map into a [`SchemaGraph`] where every reference is resolved to
//! a [`TypeId`], including cyclic ones. [`SchemaStore`] keeps the current
//! graph and replaces it atomically on refresh.

mod graph;
mod importer;
mod raw;
mod store;

pub use graph::{BevyType, Property, SchemaGraph, Structure, TypeId, Variant};
pub use importer::{ImportProgress, import, import_with_progress};
pub use raw::{
    RawSchema, RawVariant, SCHEMA_REF_PREFIX, SchemaKind, SchemaRef, SchemaShape, ShapeFields,
};
pub use store::{ImportStatus, SchemaSnapshot, SchemaStore};
