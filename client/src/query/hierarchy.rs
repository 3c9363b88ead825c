//! Parent/child view over a [`QueryResult`]
//!
//! Built from the `ChildOf` and `Children` columns. A row is a root when it
//! has no parent or its parent did not match the query. Children that did not
//! match are skipped.

use super::result::{QueryResult, QueryRow};
use crate::entity::Entity;

/// Borrowed hierarchy over the rows of one result
#[derive(Debug, Clone, Copy)]
pub struct Hierarchy<'a> {
    result: &'a QueryResult,
}

impl<'a> Hierarchy<'a> {
    pub(super) const fn new(result: &'a QueryResult) -> Self {
        Self { result }
    }

    /// Top-level rows, in server order
    pub fn roots(&self) -> impl Iterator<Item = HierarchyNode<'a>> + use<'a> {
        let result = self.result;
        result
            .iter()
            .filter(move |row| is_root(result, row))
            .map(move |row| HierarchyNode { row, result })
    }

    /// Node for `entity`, if it matched
    pub fn node(&self, entity: Entity) -> Option<HierarchyNode<'a>> {
        let result = self.result;
        result.row(entity).map(|row| HierarchyNode { row, result })
    }

    /// Whether `entity` is a root of this view
    pub fn is_root(&self, entity: Entity) -> bool {
        self.result
            .row(entity)
            .is_some_and(|row| is_root(self.result, row))
    }
}

fn is_root(result: &QueryResult, row: &QueryRow) -> bool {
    row.parent().is_none_or(|parent| !result.contains(parent))
}

/// One row positioned in the hierarchy
#[derive(Debug, Clone, Copy)]
pub struct HierarchyNode<'a> {
    row:    &'a QueryRow,
    result: &'a QueryResult,
}

impl<'a> HierarchyNode<'a> {
    /// The underlying row
    pub const fn row(&self) -> &'a QueryRow {
        self.row
    }

    /// Entity of the row
    pub const fn entity(&self) -> Entity {
        self.row.entity
    }

    /// Children present in the result, in `Children` order
    pub fn children(&self) -> impl Iterator<Item = HierarchyNode<'a>> + use<'a> {
        let result = self.result;
        self.row
            .children()
            .into_iter()
            .filter_map(move |child| result.row(child).map(|row| HierarchyNode { row, result }))
    }

    /// Whether any child is present in the result
    pub fn has_children(&self) -> bool {
        self.children().next().is_some()
    }

    /// Parent node, if the parent matched
    pub fn parent(&self) -> Option<HierarchyNode<'a>> {
        let result = self.result;
        self.row
            .parent()
            .and_then(|parent| result.row(parent))
            .map(|row| HierarchyNode { row, result })
    }
}
