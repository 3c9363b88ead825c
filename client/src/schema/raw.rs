//! Wire form of `registry.schema` entries
//!
//! A raw schema is decoded once into [`SchemaShape`]; everything downstream
//! matches on the shape instead of re-reading JSON.

use error_stack::Report;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use strum::{AsRefStr, Display, EnumString};

use crate::error::{Error, Result};
use crate::type_path::TypePath;

/// Prefix of every `$ref` pointer in the registry
pub const SCHEMA_REF_PREFIX: &str = "#/$defs/";

/// Structural category of a type
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, AsRefStr, EnumString,
)]
#[serde(rename_all = "PascalCase")]
#[strum(serialize_all = "PascalCase")]
pub enum SchemaKind {
    /// Struct with named fields
    Struct,
    /// Struct accepting additional properties
    Object,
    /// Enum with unit, tuple or struct variants
    Enum,
    /// `HashMap`, `BTreeMap` and friends
    Map,
    /// Fixed-size array
    Array,
    /// `Vec`, `VecDeque`
    List,
    /// `HashSet`, `BTreeSet`
    Set,
    /// Anonymous tuple
    Tuple,
    /// Struct with positional fields
    TupleStruct,
    /// Opaque leaf such as `f32` or `String`
    #[default]
    Value,
}

/// `{"type": {"$ref": "#/$defs/<identifier>"}}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaRef {
    #[serde(rename = "type")]
    target: RefTarget,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct RefTarget {
    #[serde(rename = "$ref")]
    pointer: String,
}

impl SchemaRef {
    /// Reference to the type named `identifier`
    pub fn new(identifier: &str) -> Self {
        Self {
            target: RefTarget {
                pointer: format!("{SCHEMA_REF_PREFIX}{identifier}"),
            },
        }
    }

    /// Identifier of the referenced type
    pub fn identifier(&self) -> TypePath {
        let pointer = &self.target.pointer;
        TypePath::from(pointer.strip_prefix(SCHEMA_REF_PREFIX).unwrap_or(pointer))
    }
}

/// Shape-bearing fields shared by top-level schemas and enum variants
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShapeFields {
    #[serde(default)]
    kind:                  Option<String>,
    #[serde(default, rename = "type")]
    type_field:            Option<Value>,
    #[serde(default)]
    properties:            Map<String, Value>,
    #[serde(default)]
    required:              Vec<String>,
    #[serde(default)]
    additional_properties: Option<Value>,
    #[serde(default)]
    one_of:                Vec<RawVariant>,
    #[serde(default)]
    prefix_items:          Vec<Value>,
    #[serde(default)]
    items:                 Option<Value>,
    #[serde(default)]
    key_type:              Option<Value>,
    #[serde(default)]
    value_type:            Option<Value>,
}

/// One `registry.schema` entry
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSchema {
    /// Type name without module path
    #[serde(default)]
    pub short_path:    Option<String>,
    /// Fully qualified type path
    #[serde(default)]
    pub type_path:     Option<String>,
    /// Module path without the type name
    #[serde(default)]
    pub module_path:   Option<String>,
    /// Owning crate
    #[serde(default)]
    pub crate_name:    Option<String>,
    /// Reflect markers such as `Component`, `Resource` or `Event`
    #[serde(default)]
    pub reflect_types: Vec<String>,
    /// Structural fields, decoded by [`Self::shape`]
    #[serde(flatten)]
    pub fields:        ShapeFields,
}

impl RawSchema {
    /// Decode the structural part
    pub fn shape(&self) -> Result<SchemaShape> {
        self.fields.shape()
    }
}

/// An `oneOf` entry: a bare name for unit variants, an object otherwise
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawVariant {
    /// Unit variant, given by name
    Unit(String),
    /// Variant carrying a payload
    Detailed {
        /// Variant name
        #[serde(rename = "shortPath")]
        short_path: String,
        /// Fully qualified variant path
        #[serde(default, rename = "typePath")]
        type_path:  Option<String>,
        /// Payload structure
        #[serde(flatten)]
        fields:     ShapeFields,
    },
}

impl RawVariant {
    /// Variant name
    pub fn name(&self) -> &str {
        match self {
            Self::Unit(name) | Self::Detailed { short_path: name, .. } => name,
        }
    }
}

/// Decoded structure of a schema
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaShape {
    /// Named fields
    Struct {
        /// Property name to its undecoded `$ref` object, in declaration order
        properties: Map<String, Value>,
        /// Names of the properties that must be present
        required:   Vec<String>,
        /// `additionalProperties: true`
        open:       bool,
    },
    /// Variants in declaration order
    Enum(Vec<RawVariant>),
    /// Key and value types
    Map {
        /// `keyType`
        key:   SchemaRef,
        /// `valueType`
        value: SchemaRef,
    },
    /// Element type of a fixed-size array
    Array(SchemaRef),
    /// Element type of a list
    List(SchemaRef),
    /// Element type of a set
    Set(SchemaRef),
    /// `prefixItems` of a tuple
    Tuple(Vec<SchemaRef>),
    /// `prefixItems` of a tuple struct
    TupleStruct(Vec<SchemaRef>),
    /// Leaf without structure
    Value,
    /// A bare reference with no structure of its own
    Ref(TypePath),
}

impl SchemaShape {
    /// Kind recorded on the node; `None` for a bare reference
    pub const fn kind(&self) -> Option<SchemaKind> {
        Some(match self {
            Self::Struct { open: true, .. } => SchemaKind::Object,
            Self::Struct { .. } => SchemaKind::Struct,
            Self::Enum(_) => SchemaKind::Enum,
            Self::Map { .. } => SchemaKind::Map,
            Self::Array(_) => SchemaKind::Array,
            Self::List(_) => SchemaKind::List,
            Self::Set(_) => SchemaKind::Set,
            Self::Tuple(_) => SchemaKind::Tuple,
            Self::TupleStruct(_) => SchemaKind::TupleStruct,
            Self::Value => SchemaKind::Value,
            Self::Ref(_) => return None,
        })
    }

    /// Whether the shape carries no payload worth a node of its own
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Struct { properties, .. } => properties.is_empty(),
            Self::Enum(variants) => variants.is_empty(),
            Self::Tuple(elements) | Self::TupleStruct(elements) => elements.is_empty(),
            Self::Value => true,
            Self::Map { .. } | Self::Array(_) | Self::List(_) | Self::Set(_) | Self::Ref(_) => false,
        }
    }
}

fn decode_ref(field: &str, value: Option<&Value>) -> Result<SchemaRef> {
    let value = value.ok_or_else(|| Report::new(Error::missing(field)))?;
    SchemaRef::deserialize(value)
        .map_err(|e| Report::new(Error::unexpected(field, e)).attach(format!("Value: {value}")))
}

fn decode_target(value: &Value) -> Result<TypePath> {
    RefTarget::deserialize(value)
        .map(|target| SchemaRef { target }.identifier())
        .map_err(|e| Report::new(Error::unexpected("type", e)).attach(format!("Value: {value}")))
}

impl ShapeFields {
    /// Decode the structural discriminant and its payload
    ///
    /// Without `kind`, an object-valued `type` holding `$ref` is a bare
    /// reference and anything else is a value.
    pub fn shape(&self) -> Result<SchemaShape> {
        let Some(kind) = self.kind.as_deref() else {
            return Ok(match &self.type_field {
                Some(target @ Value::Object(_)) => SchemaShape::Ref(decode_target(target)?),
                _ => SchemaShape::Value,
            });
        };

        if kind == "Ref" {
            let target = self
                .type_field
                .as_ref()
                .ok_or_else(|| Report::new(Error::missing("type")))?;
            return Ok(SchemaShape::Ref(decode_target(target)?));
        }

        let kind: SchemaKind = kind.parse().map_err(|_| {
            Report::new(Error::unexpected("kind", format!("unknown schema kind `{kind}`")))
        })?;

        let sequence = || decode_ref("items", self.items.as_ref());
        let elements = || {
            self.prefix_items
                .iter()
                .map(|item| decode_ref("prefixItems", Some(item)))
                .collect::<Result<Vec<_>>>()
        };

        Ok(match kind {
            SchemaKind::Struct | SchemaKind::Object => SchemaShape::Struct {
                properties: self.properties.clone(),
                required:   self.required.clone(),
                open:       kind == SchemaKind::Object
                    || matches!(self.additional_properties, Some(Value::Bool(true))),
            },
            SchemaKind::Enum => SchemaShape::Enum(self.one_of.clone()),
            SchemaKind::Map => SchemaShape::Map {
                key:   decode_ref("keyType", self.key_type.as_ref())?,
                value: decode_ref("valueType", self.value_type.as_ref())?,
            },
            SchemaKind::Array => SchemaShape::Array(sequence()?),
            SchemaKind::List => SchemaShape::List(sequence()?),
            SchemaKind::Set => SchemaShape::Set(sequence()?),
            SchemaKind::Tuple => SchemaShape::Tuple(elements()?),
            SchemaKind::TupleStruct => SchemaShape::TupleStruct(elements()?),
            SchemaKind::Value => SchemaShape::Value,
        })
    }
}
