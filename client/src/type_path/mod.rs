//! A newtype wrapper for fully-qualified type identifiers
//!
//! Every component, resource and schema node is keyed by its type path, e.g.
//! `bevy_transform::components::transform::Transform`. `TypePath` keeps that
//! string as-is and derives the shorter forms used for display.

mod parser;

use serde::{Deserialize, Serialize};

pub use parser::simplify_type;

/// Fully-qualified type identifier, unique per reflected type
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default, PartialOrd, Ord)]
#[serde(transparent)]
pub struct TypePath(String);

impl TypePath {
    /// Wrap an identifier
    pub fn new(identifier: impl Into<String>) -> Self {
        Self(identifier.into())
    }

    /// Get the underlying string reference
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Last path segment with generics dropped
    ///
    /// `bevy_transform::components::transform::Transform` returns `Transform`,
    /// `core::option::Option<glam::Vec3>` returns `Option`. Arrays and tuples
    /// have no single name and fall back to [`Self::display_name`].
    pub fn short_name(&self) -> String {
        match parser::parse_type_path(&self.0) {
            Ok(expr) => expr
                .name()
                .map_or_else(|| expr.to_string(), ToString::to_string),
            Err(_) => {
                let base = self.0.split('<').next().unwrap_or(&self.0);
                base.rsplit("::").next().unwrap_or(base).to_string()
            },
        }
    }

    /// Module paths stripped everywhere, generics kept
    ///
    /// `core::option::Option<bevy_asset::handle::Handle<bevy_mesh::mesh::Mesh>>`
    /// returns `Option<Handle<Mesh>>`.
    pub fn display_name(&self) -> String {
        simplify_type(&self.0)
    }

    /// Everything before the type name, `None` for top-level or structural types
    pub fn module_path(&self) -> Option<String> {
        let expr = parser::parse_type_path(&self.0).ok()?;
        let module = expr.module_segments()?;
        (!module.is_empty()).then(|| module.join("::"))
    }

    /// Leading crate segment, if the path has a module
    pub fn crate_name(&self) -> Option<&str> {
        let (first, _) = self.0.split_once("::")?;
        (!first.contains(['<', '[', '('])).then_some(first)
    }

    /// Identifier of the payload type synthesized for variant `variant`
    pub fn variant_payload(&self, variant: &str) -> Self {
        Self(format!("{}::{variant}", self.0))
    }
}

impl From<&str> for TypePath {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for TypePath {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&String> for TypePath {
    fn from(s: &String) -> Self {
        Self(s.clone())
    }
}

impl From<TypePath> for String {
    fn from(type_path: TypePath) -> Self {
        type_path.0
    }
}

impl AsRef<str> for TypePath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::borrow::Borrow<str> for TypePath {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TypePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
