//! Entity queries: request model, results and the hierarchy view

mod builder;
mod hierarchy;
mod model;
mod result;

pub use builder::{QueryBuilder, StructuredQuery};
pub use hierarchy::{Hierarchy, HierarchyNode};
pub use model::{ComponentSelector, Query, QueryData, QueryFilter};
pub use result::{QueryColumn, QueryResult, QueryRow};

/// Component type paths the hierarchy view relies on
pub mod columns {
    /// `Name`, a plain string
    pub const NAME: &str = "bevy_ecs::name::Name";
    /// `ChildOf`, the parent entity
    pub const CHILD_OF: &str = "bevy_ecs::hierarchy::ChildOf";
    /// `Children`, an array of entities
    pub const CHILDREN: &str = "bevy_ecs::hierarchy::Children";

    /// Columns injected by `Query::with_structure`, in injection order
    pub const STRUCTURAL: [&str; 3] = [NAME, CHILDREN, CHILD_OF];
}
