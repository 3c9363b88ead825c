//! Dynamic JSON values exchanged with the remote app
//!
//! `Json` is the single representation of schema-less data in this crate. It
//! differs from `serde_json::Value` in two ways that matter to the inspector:
//! - `Undefined` marks a value that was never received. It is distinct from
//!   `Null`, and object members holding it are omitted when encoding.
//! - Integers keep the full `i64::MIN..=u64::MAX` range, so packed entity ids
//!   survive a round trip untouched.
//!
//! Decoding never fails on a shape it cannot classify; such values become
//! `Undefined`. Typed projections (`get`, `decode`, the `as_*` numeric views)
//! check the shape before succeeding.

mod codec;
mod index;
mod numeric;
mod path;

use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};

pub use path::{JsonPath, PathSegment};

/// Members of a JSON object; key order carries no meaning
pub type JsonObject = BTreeMap<String, Json>;

/// A JSON value with an explicit "never received" state
#[derive(Debug, Clone, Default)]
pub enum Json {
    /// A JSON string
    String(String),
    /// An integer within `i64::MIN..=u64::MAX`
    Integer(i128),
    /// A floating point number
    Number(f64),
    /// `true` or `false`
    Boolean(bool),
    /// Absent; distinct from `Null`
    #[default]
    Undefined,
    /// An explicit `null`
    Null,
    /// Ordered sequence of values
    Array(Vec<Self>),
    /// String keyed members
    Object(JsonObject),
}

impl Json {
    /// Whether this value was never received
    pub const fn is_undefined(&self) -> bool {
        matches!(self, Self::Undefined)
    }

    /// Whether this value is an explicit `null`
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// True for an array or object without elements
    pub fn is_empty_collection(&self) -> bool {
        match self {
            Self::Array(items) => items.is_empty(),
            Self::Object(members) => members.is_empty(),
            _ => false,
        }
    }

    /// String view
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(value) => Some(value),
            _ => None,
        }
    }

    /// Boolean view
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(value) => Some(*value),
            _ => None,
        }
    }

    /// Array view
    pub fn as_array(&self) -> Option<&[Self]> {
        match self {
            Self::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Mutable array view
    pub const fn as_array_mut(&mut self) -> Option<&mut Vec<Self>> {
        match self {
            Self::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Object view
    pub const fn as_object(&self) -> Option<&JsonObject> {
        match self {
            Self::Object(members) => Some(members),
            _ => None,
        }
    }

    /// Mutable object view
    pub const fn as_object_mut(&mut self) -> Option<&mut JsonObject> {
        match self {
            Self::Object(members) => Some(members),
            _ => None,
        }
    }

    /// Replace this value with `value` when it is `Some`, leave it untouched otherwise
    pub fn replace_with<T: Into<Self>>(&mut self, value: Option<T>) {
        if let Some(value) = value {
            *self = value.into();
        }
    }
}

/// Bits used for equality and hashing of floats: `-0.0` folds into `0.0`
/// and every NaN into one canonical NaN
fn canonical_bits(value: f64) -> u64 {
    if value == 0.0 {
        0.0_f64.to_bits()
    } else if value.is_nan() {
        f64::NAN.to_bits()
    } else {
        value.to_bits()
    }
}

impl PartialEq for Json {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Integer(a), Self::Integer(b)) => a == b,
            (Self::Number(a), Self::Number(b)) => canonical_bits(*a) == canonical_bits(*b),
            (Self::Boolean(a), Self::Boolean(b)) => a == b,
            (Self::Undefined, Self::Undefined) | (Self::Null, Self::Null) => true,
            (Self::Array(a), Self::Array(b)) => a == b,
            (Self::Object(a), Self::Object(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Json {}

impl Hash for Json {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Self::String(value) => value.hash(state),
            Self::Integer(value) => value.hash(state),
            Self::Number(value) => canonical_bits(*value).hash(state),
            Self::Boolean(value) => value.hash(state),
            Self::Undefined | Self::Null => {},
            Self::Array(items) => items.hash(state),
            Self::Object(members) => members.hash(state),
        }
    }
}

impl std::fmt::Display for Json {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::String(value) => write!(f, "\"{}\"", value.replace('"', "\\\"")),
            Self::Integer(value) => write!(f, "{value}"),
            Self::Number(value) => write!(f, "{value}"),
            Self::Boolean(value) => write!(f, "{value}"),
            Self::Undefined => f.write_str("undefined"),
            Self::Null => f.write_str("null"),
            Self::Array(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            },
            Self::Object(members) => {
                f.write_str("{")?;
                for (i, (key, value)) in members.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{key}: {value}")?;
                }
                f.write_str("}")
            },
        }
    }
}

impl From<String> for Json {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<&str> for Json {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<bool> for Json {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<f64> for Json {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<f32> for Json {
    fn from(value: f32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<Vec<Self>> for Json {
    fn from(items: Vec<Self>) -> Self {
        Self::Array(items)
    }
}

impl From<JsonObject> for Json {
    fn from(members: JsonObject) -> Self {
        Self::Object(members)
    }
}

impl<T: Into<Self>> From<Option<T>> for Json {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

impl FromIterator<Self> for Json {
    fn from_iter<I: IntoIterator<Item = Self>>(iter: I) -> Self {
        Self::Array(iter.into_iter().collect())
    }
}

impl<K: Into<String>> FromIterator<(K, Self)> for Json {
    fn from_iter<I: IntoIterator<Item = (K, Self)>>(iter: I) -> Self {
        Self::Object(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_undefined_is_distinct_from_null() {
        assert_ne!(Json::Undefined, Json::Null);
        assert!(Json::default().is_undefined());
        assert!(!Json::Null.is_undefined());
    }

    #[test]
    fn test_structural_equality_and_hashing() {
        let a: Json = [("x", Json::from(1_u8)), ("y", Json::from("two"))]
            .into_iter()
            .collect();
        let b: Json = [("y", Json::from("two")), ("x", Json::from(1_u8))]
            .into_iter()
            .collect();
        assert_eq!(a, b);

        let set: HashSet<Json> = [a, b, Json::Number(0.0), Json::Number(-0.0)]
            .into_iter()
            .collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_integer_and_number_are_different_shapes() {
        assert_ne!(Json::from(1_i64), Json::Number(1.0));
    }

    #[test]
    fn test_display() {
        let value: Json = [
            ("name", Json::from("say \"hi\"")),
            ("list", Json::from(vec![Json::from(1_i32), Json::Null])),
            ("gone", Json::Undefined),
        ]
        .into_iter()
        .collect();
        assert_eq!(
            value.to_string(),
            "{gone: undefined, list: [1, null], name: \"say \\\"hi\\\"\"}"
        );
    }

    #[test]
    fn test_empty_collection() {
        assert!(Json::Array(vec![]).is_empty_collection());
        assert!(Json::Object(JsonObject::new()).is_empty_collection());
        assert!(!Json::from("").is_empty_collection());
    }

    #[test]
    fn test_replace_with_ignores_none() {
        let mut value = Json::from("keep");
        value.replace_with(None::<bool>);
        assert_eq!(value, Json::from("keep"));
        value.replace_with(Some(true));
        assert_eq!(value, Json::Boolean(true));
    }
}
