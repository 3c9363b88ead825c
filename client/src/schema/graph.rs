//! Cross-referenced type graph
//!
//! Nodes live in an arena and refer to each other by [`TypeId`]. Each
//! identifier maps to exactly one node, so self-referential and cyclic types
//! are plain id cycles.

use std::collections::HashMap;
use std::ops::Index;

use itertools::Itertools;

use super::raw::SchemaKind;
use crate::type_path::TypePath;

/// Handle of a node within one [`SchemaGraph`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(usize);

impl TypeId {
    /// Position of the node in the arena
    pub const fn index(self) -> usize {
        self.0
    }
}

/// A named field of a struct-like type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Property {
    /// Field name, unique within the parent
    pub name:     String,
    /// Value type
    pub ty:       TypeId,
    /// Listed in the parent's `required`
    pub required: bool,
}

/// An alternative of an enum
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variant {
    /// Variant name, unique within the enum
    pub name:      String,
    /// Fully qualified variant path, when the registry provides one
    pub type_path: Option<TypePath>,
    /// Payload type; `None` for unit variants
    pub ty:        Option<TypeId>,
}

/// Relationships of a node, matching its [`SchemaKind`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Structure {
    /// Value kind, or a type referenced but never described
    #[default]
    Leaf,
    /// Struct and Object
    Fields(Vec<Property>),
    /// Enum
    Variants(Vec<Variant>),
    /// Array, List and Set
    Items(TypeId),
    /// Tuple and `TupleStruct`
    Elements(Vec<TypeId>),
    /// Map
    Entries {
        /// Key type
        key:   TypeId,
        /// Value type
        value: TypeId,
    },
}

/// One reflected type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BevyType {
    /// Fully qualified type path, unique within the graph
    pub identifier:    TypePath,
    /// Short human name
    pub name:          String,
    /// Module path, e.g. `bevy_transform::components::transform`
    pub module:        Option<String>,
    /// Owning crate
    pub crate_name:    Option<String>,
    /// Reflect markers, e.g. `Component` or `Event`
    pub reflect_types: Vec<String>,
    /// Registry kind
    pub kind:          SchemaKind,
    /// Linked relationships, populated according to `kind`
    pub structure:     Structure,
}

impl BevyType {
    pub(super) fn new(identifier: TypePath) -> Self {
        Self {
            name: identifier.display_name(),
            identifier,
            module: None,
            crate_name: None,
            reflect_types: Vec::new(),
            kind: SchemaKind::Value,
            structure: Structure::Leaf,
        }
    }

    /// Fields of a struct or object, empty otherwise
    pub fn properties(&self) -> &[Property] {
        match &self.structure {
            Structure::Fields(properties) => properties,
            _ => &[],
        }
    }

    /// Alternatives of an enum, empty otherwise
    pub fn variants(&self) -> &[Variant] {
        match &self.structure {
            Structure::Variants(variants) => variants,
            _ => &[],
        }
    }

    /// Element types of a tuple or tuple struct, empty otherwise
    pub fn elements(&self) -> &[TypeId] {
        match &self.structure {
            Structure::Elements(elements) => elements,
            _ => &[],
        }
    }

    /// Element type of a sequence, or value type of a map
    pub const fn items(&self) -> Option<TypeId> {
        match self.structure {
            Structure::Items(items) | Structure::Entries { value: items, .. } => Some(items),
            _ => None,
        }
    }

    /// Key type of a map
    pub const fn key(&self) -> Option<TypeId> {
        match self.structure {
            Structure::Entries { key, .. } => Some(key),
            _ => None,
        }
    }

    /// Field named `name`
    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties().iter().find(|property| property.name == name)
    }

    /// Variant named `name`
    pub fn variant(&self, name: &str) -> Option<&Variant> {
        self.variants().iter().find(|variant| variant.name == name)
    }

    /// Whether the type has any marker named `marker`
    pub fn reflects(&self, marker: &str) -> bool {
        self.reflect_types.iter().any(|r| r == marker)
    }

    /// Struct without properties, tuple without elements, enum without variants, or a value
    pub fn is_empty(&self) -> bool {
        match self.kind {
            SchemaKind::Struct | SchemaKind::Object => self.properties().is_empty(),
            SchemaKind::Tuple | SchemaKind::TupleStruct => self.elements().is_empty(),
            SchemaKind::Enum => self.variants().is_empty(),
            SchemaKind::Value => true,
            SchemaKind::Map | SchemaKind::Array | SchemaKind::List | SchemaKind::Set => false,
        }
    }
}

/// All imported types, keyed by identifier
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaGraph {
    types: Vec<BevyType>,
    index: HashMap<TypePath, TypeId>,
}

impl SchemaGraph {
    /// Number of nodes
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Whether no type was imported
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Id of the node named `identifier`
    pub fn id(&self, identifier: &str) -> Option<TypeId> {
        self.index.get(identifier).copied()
    }

    /// Node named `identifier`
    pub fn get(&self, identifier: &str) -> Option<&BevyType> {
        self.id(identifier).and_then(|id| self.resolve(id))
    }

    /// Node behind `id`, if it belongs to this graph
    pub fn resolve(&self, id: TypeId) -> Option<&BevyType> {
        self.types.get(id.0)
    }

    /// Nodes in creation order
    pub fn iter(&self) -> std::slice::Iter<'_, BevyType> {
        self.types.iter()
    }

    /// Nodes ordered by name, then identifier
    pub fn sorted(&self) -> Vec<&BevyType> {
        self.types
            .iter()
            .sorted_by(|a, b| {
                a.name
                    .cmp(&b.name)
                    .then_with(|| a.identifier.cmp(&b.identifier))
            })
            .collect()
    }

    /// Types carrying the reflect marker `marker`, ordered by name
    pub fn types_reflecting(&self, marker: &str) -> Vec<&BevyType> {
        self.sorted()
            .into_iter()
            .filter(|ty| ty.reflects(marker))
            .collect()
    }

    /// Look up or create the node named `identifier`
    pub(super) fn intern(&mut self, identifier: &TypePath) -> TypeId {
        if let Some(&id) = self.index.get(identifier) {
            return id;
        }
        let id = TypeId(self.types.len());
        self.types.push(BevyType::new(identifier.clone()));
        self.index.insert(identifier.clone(), id);
        id
    }

    pub(super) fn node_mut(&mut self, id: TypeId) -> Option<&mut BevyType> {
        self.types.get_mut(id.0)
    }
}

/// Node behind an id handed out by this graph
///
/// # Panics
///
/// Panics when `id` came from another graph, such as an older snapshot, and is
/// out of range here. Use [`SchemaGraph::resolve`] for ids of unknown origin.
impl Index<TypeId> for SchemaGraph {
    type Output = BevyType;

    fn index(&self, id: TypeId) -> &Self::Output {
        &self.types[id.0]
    }
}

impl<'a> IntoIterator for &'a SchemaGraph {
    type IntoIter = std::slice::Iter<'a, BevyType>;
    type Item = &'a BevyType;

    fn into_iter(self) -> Self::IntoIter {
        self.types.iter()
    }
}
