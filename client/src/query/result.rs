//! Rows returned by `world.query` and the column set derived from them

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::columns::{CHILD_OF, CHILDREN, NAME};
use super::hierarchy::Hierarchy;
use crate::entity::Entity;
use crate::json::Json;
use crate::type_path::TypePath;

/// One matched entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryRow {
    /// The matched entity
    pub entity:     Entity,
    /// Values of the fetched components present on the entity
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub components: HashMap<TypePath, Json>,
    /// Presence of each component listed in the query's `has`
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub has:        HashMap<TypePath, bool>,
}

impl QueryRow {
    /// A row with no component data
    pub fn new(entity: Entity) -> Self {
        Self {
            entity,
            components: HashMap::new(),
            has: HashMap::new(),
        }
    }

    /// Value of `column`, if fetched and present
    pub fn value(&self, column: &str) -> Option<&Json> {
        self.components.get(column)
    }

    /// Presence flag for `column`, if it was part of `has`
    pub fn has(&self, column: &str) -> Option<bool> {
        self.has.get(column).copied()
    }

    /// Whether `column` appears in either map
    pub fn contains(&self, column: &str) -> bool {
        self.components.contains_key(column) || self.has.contains_key(column)
    }

    /// The entity's `Name`, if fetched
    pub fn name(&self) -> Option<&str> {
        self.value(NAME).and_then(Json::as_str)
    }

    /// The entity's parent from `ChildOf`, if fetched
    pub fn parent(&self) -> Option<Entity> {
        self.value(CHILD_OF)
            .and_then(Json::as_u64)
            .map(Entity::from_bits)
    }

    /// The entity's children from `Children`, in listed order; empty if not fetched
    pub fn children(&self) -> Vec<Entity> {
        self.value(CHILDREN)
            .and_then(Json::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Json::as_u64)
                    .map(Entity::from_bits)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Columns of this row, sorted for display
    pub fn columns(&self) -> Vec<QueryColumn> {
        let mut columns: Vec<QueryColumn> = self
            .components
            .keys()
            .chain(self.has.keys())
            .collect::<HashSet<_>>()
            .into_iter()
            .map(|id| QueryColumn::new(id.clone()))
            .collect();
        columns.sort();
        columns
    }
}

/// A component column, ordered by its display name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryColumn {
    id:   TypePath,
    name: String,
}

impl QueryColumn {
    /// Column for component `id`
    pub fn new(id: impl Into<TypePath>) -> Self {
        let id = id.into();
        let name = id.display_name();
        Self { id, name }
    }

    /// Full component type path
    pub const fn id(&self) -> &TypePath {
        &self.id
    }

    /// Type path with module prefixes stripped
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Module of the component type
    pub fn path(&self) -> Option<String> {
        self.id.module_path()
    }
}

impl Ord for QueryColumn {
    fn cmp(&self, other: &Self) -> Ordering {
        self.name
            .cmp(&other.name)
            .then_with(|| self.id.cmp(&other.id))
    }
}

impl PartialOrd for QueryColumn {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl std::fmt::Display for QueryColumn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}

/// Rows from one query execution
///
/// The entity index and the column set are built on first use and cached;
/// the rows themselves never change after construction.
#[derive(Debug, Clone, Default)]
pub struct QueryResult {
    rows:     Vec<QueryRow>,
    excluded: HashSet<TypePath>,
    index:    OnceLock<HashMap<Entity, usize>>,
    columns:  OnceLock<Vec<QueryColumn>>,
}

impl QueryResult {
    /// Wrap rows in server order
    pub fn new(rows: Vec<QueryRow>) -> Self {
        Self {
            rows,
            ..Self::default()
        }
    }

    /// Hide `excluded` from [`Self::display_columns`]; the data stays available
    #[must_use]
    pub fn excluding(mut self, excluded: HashSet<TypePath>) -> Self {
        self.excluded = excluded;
        self
    }

    /// Columns hidden from display
    pub const fn excluded(&self) -> &HashSet<TypePath> {
        &self.excluded
    }

    /// Rows in server order
    pub fn rows(&self) -> &[QueryRow] {
        &self.rows
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the query matched nothing
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Iterate rows in server order
    pub fn iter(&self) -> std::slice::Iter<'_, QueryRow> {
        self.rows.iter()
    }

    fn index(&self) -> &HashMap<Entity, usize> {
        self.index.get_or_init(|| {
            let mut index = HashMap::with_capacity(self.rows.len());
            for (position, row) in self.rows.iter().enumerate() {
                index.entry(row.entity).or_insert(position);
            }
            index
        })
    }

    /// Row of `entity`, if it matched
    pub fn row(&self, entity: Entity) -> Option<&QueryRow> {
        self.index().get(&entity).map(|&position| &self.rows[position])
    }

    /// Whether `entity` matched
    pub fn contains(&self, entity: Entity) -> bool {
        self.index().contains_key(&entity)
    }

    /// First row whose `Name` equals `name`
    pub fn row_named(&self, name: &str) -> Option<&QueryRow> {
        self.rows.iter().find(|row| row.name() == Some(name))
    }

    /// Union of every row's columns, sorted
    pub fn columns(&self) -> &[QueryColumn] {
        self.columns.get_or_init(|| {
            let mut ids: HashSet<&TypePath> = HashSet::with_capacity(8.max(self.rows.len() * 2));
            for row in &self.rows {
                ids.extend(row.components.keys());
                ids.extend(row.has.keys());
            }
            let mut columns: Vec<QueryColumn> =
                ids.into_iter().cloned().map(QueryColumn::new).collect();
            columns.sort();
            columns
        })
    }

    /// [`Self::columns`] without `excluded`
    pub fn columns_excluding(&self, excluded: &HashSet<TypePath>) -> Vec<QueryColumn> {
        self.columns()
            .iter()
            .filter(|column| !excluded.contains(column.id()))
            .cloned()
            .collect()
    }

    /// Columns meant for display, without those fetched only for structure
    pub fn display_columns(&self) -> Vec<QueryColumn> {
        self.columns_excluding(&self.excluded)
    }

    /// Parent/child view over these rows
    pub const fn hierarchy(&self) -> Hierarchy<'_> {
        Hierarchy::new(self)
    }
}

impl<'a> IntoIterator for &'a QueryResult {
    type IntoIter = std::slice::Iter<'a, QueryRow>;
    type Item = &'a QueryRow;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

impl Serialize for QueryResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> core::result::Result<S::Ok, S::Error> {
        self.rows.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for QueryResult {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> core::result::Result<Self, D::Error> {
        Vec::<QueryRow>::deserialize(deserializer).map(Self::new)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn result() -> QueryResult {
        serde_json::from_value(json!([
            {
                "entity": Entity::new(1, 1).to_bits(),
                "components": {
                    "bevy_ecs::name::Name": "Root",
                    "bevy_transform::components::transform::Transform": {"translation": [0.0, 0.0, 0.0]}
                },
                "has": {"a::Marker": true}
            },
            {
                "entity": Entity::new(2, 1).to_bits(),
                "components": {"z::Alpha": 1}
            }
        ]))
        .unwrap()
    }

    #[test]
    fn test_entity_is_required() {
        let missing = serde_json::from_value::<QueryResult>(json!([{"components": {}}]));
        assert!(missing.is_err());
    }

    #[test]
    fn test_optional_maps_default_to_empty() {
        let result: QueryResult = serde_json::from_value(json!([{"entity": 5}])).unwrap();
        let row = &result.rows()[0];
        assert!(row.components.is_empty());
        assert!(row.has.is_empty());
        assert_eq!(row.name(), None);
        assert!(row.children().is_empty());
    }

    #[test]
    fn test_columns_union_sorted_by_display_name() {
        let result = result();
        let names: Vec<&str> = result.columns().iter().map(QueryColumn::name).collect();
        assert_eq!(names, vec!["Alpha", "Marker", "Name", "Transform"]);
        assert_eq!(
            result.columns()[3].path().as_deref(),
            Some("bevy_transform::components::transform")
        );
    }

    #[test]
    fn test_columns_excluding() {
        let result = result().excluding(HashSet::from([TypePath::from("bevy_ecs::name::Name")]));
        let names: Vec<String> = result
            .display_columns()
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(names, vec!["Alpha", "Marker", "Transform"]);
        assert_eq!(result.row_named("Root").unwrap().entity, Entity::new(1, 1));
    }

    #[test]
    fn test_row_lookup() {
        let result = result();
        let row = result.row(Entity::new(2, 1)).unwrap();
        assert_eq!(row.value("z::Alpha"), Some(&Json::from(1_u8)));
        assert!(row.contains("z::Alpha"));
        assert!(result.row(Entity::new(9, 1)).is_none());

        let root = result.row(Entity::new(1, 1)).unwrap();
        assert_eq!(root.has("a::Marker"), Some(true));
        assert!(root.contains("a::Marker"));
        assert_eq!(root.columns().len(), 3);
    }
}
