//! `world.query` request descriptor
//!
//! The wire form omits empty lists and an empty filter; `option` is either the
//! string `"all"` or an array of type paths. `Display` renders the query as the
//! equivalent Rust system parameter, e.g.
//! `Query<(Entity, &Transform, Option<&Name>), With<Camera>>`.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::type_path::TypePath;

/// Rust caps trait implementations for tuples at this many elements
const MAX_TUPLE_SIZE: usize = 15;

/// Keyword selecting every reflectable component
const OPTION_ALL: &str = "all";

/// Selector for optional components in a query
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ComponentSelector {
    /// Fetch every reflectable component present on the entity
    All,
    /// Fetch these components when present
    Paths(Vec<TypePath>),
}

impl ComponentSelector {
    /// No optional components at all
    pub const fn is_empty(&self) -> bool {
        match self {
            Self::All => false,
            Self::Paths(paths) => paths.is_empty(),
        }
    }

    /// Whether `component` would be fetched by this selector
    pub fn selects(&self, component: &str) -> bool {
        match self {
            Self::All => true,
            Self::Paths(paths) => paths.iter().any(|path| path.as_str() == component),
        }
    }
}

impl Default for ComponentSelector {
    fn default() -> Self {
        Self::Paths(vec![])
    }
}

impl Serialize for ComponentSelector {
    fn serialize<S: Serializer>(&self, serializer: S) -> core::result::Result<S::Ok, S::Error> {
        match self {
            Self::All => serializer.serialize_str(OPTION_ALL),
            Self::Paths(paths) => paths.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for ComponentSelector {
    fn deserialize<D>(deserializer: D) -> core::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Wire {
            Keyword(String),
            Paths(Vec<TypePath>),
        }

        match Wire::deserialize(deserializer)? {
            Wire::Keyword(keyword) if keyword == OPTION_ALL => Ok(Self::All),
            Wire::Keyword(keyword) => Err(serde::de::Error::custom(format!(
                "option must be \"{OPTION_ALL}\" or an array of component type paths, got \"{keyword}\""
            ))),
            Wire::Paths(paths) => Ok(Self::Paths(paths)),
        }
    }
}

/// What component data to retrieve
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryData {
    /// Required components; entities without all of them do not match
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub components: Vec<TypePath>,
    /// Components fetched when present
    #[serde(default, skip_serializing_if = "ComponentSelector::is_empty")]
    pub option:     ComponentSelector,
    /// Components whose presence is reported as a boolean
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub has:        Vec<TypePath>,
}

impl QueryData {
    /// Whether every reflectable component is fetched
    pub const fn all(&self) -> bool {
        matches!(self.option, ComponentSelector::All)
    }

    /// Whether `component` is fetched, mandatorily or optionally
    pub fn fetches(&self, component: &str) -> bool {
        self.components.iter().any(|c| c.as_str() == component) || self.option.selects(component)
    }
}

/// Which entities to include
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryFilter {
    /// Entities must have all of these components
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub with:    Vec<TypePath>,
    /// Entities must have none of these components
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub without: Vec<TypePath>,
}

impl QueryFilter {
    /// No constraint at all
    pub const fn is_empty(&self) -> bool {
        self.with.is_empty() && self.without.is_empty()
    }
}

/// A complete `world.query` request
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    /// Data to retrieve
    #[serde(default)]
    pub data:   QueryData,
    /// Entity filter
    #[serde(default, skip_serializing_if = "QueryFilter::is_empty")]
    pub filter: QueryFilter,
    /// Fail the whole query when a requested component is missing or not reflectable
    #[serde(default)]
    pub strict: bool,
}

/// Join `params` as a Rust tuple, nesting the tail when it exceeds the arity limit
fn rust_tuple(mut params: Vec<String>, max_size: usize) -> String {
    if params.len() <= 1 {
        return params.pop().unwrap_or_else(|| "()".to_string());
    }
    while params.len() > max_size {
        let tail = params.split_off(params.len() - max_size);
        params.push(format!("({})", tail.join(", ")));
    }
    format!("({})", params.join(", "))
}

impl fmt::Display for QueryData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let entity = if self.all() { "EntityRef" } else { "Entity" };
        let mut params = vec![entity.to_string()];
        params.extend(self.components.iter().map(|c| format!("&{}", c.display_name())));
        if let ComponentSelector::Paths(paths) = &self.option {
            params.extend(paths.iter().map(|c| format!("Option<&{}>", c.display_name())));
        }
        f.write_str(&rust_tuple(params, MAX_TUPLE_SIZE))
    }
}

impl fmt::Display for QueryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let params = self
            .with
            .iter()
            .map(|c| format!("With<{}>", c.display_name()))
            .chain(
                self.without
                    .iter()
                    .map(|c| format!("Without<{}>", c.display_name())),
            )
            .collect();
        f.write_str(&rust_tuple(params, MAX_TUPLE_SIZE))
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.filter.is_empty() {
            write!(f, "Query<{}>", self.data)
        } else {
            write!(f, "Query<{}, {}>", self.data, self.filter)
        }
    }
}
