//! Key and position access
//!
//! Reads never fail: a missing member, an out of range position or a shape
//! mismatch all yield `Undefined`. Writes against the wrong shape are no-ops.

use std::ops::Index;

use super::Json;

static UNDEFINED: Json = Json::Undefined;

impl Json {
    /// Member `key` of an object, `Undefined` otherwise
    pub fn get_key(&self, key: &str) -> &Self {
        match self {
            Self::Object(members) => members.get(key).unwrap_or(&UNDEFINED),
            _ => &UNDEFINED,
        }
    }

    /// Element `index` of an array, `Undefined` otherwise
    pub fn get_index(&self, index: usize) -> &Self {
        match self {
            Self::Array(items) => items.get(index).unwrap_or(&UNDEFINED),
            _ => &UNDEFINED,
        }
    }

    /// Insert or replace member `key`; ignored unless this is an object
    pub fn set_key(&mut self, key: impl Into<String>, value: impl Into<Self>) {
        if let Self::Object(members) = self {
            members.insert(key.into(), value.into());
        }
    }

    /// Remove member `key`, returning it if present
    pub fn remove_key(&mut self, key: &str) -> Option<Self> {
        match self {
            Self::Object(members) => members.remove(key),
            _ => None,
        }
    }

    /// Replace element `index`; writing past the end pads with `Undefined`.
    /// Ignored unless this is an array
    pub fn set_index(&mut self, index: usize, value: impl Into<Self>) {
        if let Self::Array(items) = self {
            if index >= items.len() {
                let Some(len) = index.checked_add(1) else {
                    return;
                };
                items.resize(len, Self::Undefined);
            }
            items[index] = value.into();
        }
    }

    /// Append to an array; ignored for other shapes
    pub fn push(&mut self, value: impl Into<Self>) {
        if let Self::Array(items) = self {
            items.push(value.into());
        }
    }
}

impl Index<&str> for Json {
    type Output = Self;

    fn index(&self, key: &str) -> &Self {
        self.get_key(key)
    }
}

impl Index<usize> for Json {
    type Output = Self;

    fn index(&self, index: usize) -> &Self {
        self.get_index(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::json::JsonObject;

    fn transform() -> Json {
        [(
            "translation",
            Json::from(vec![Json::from(1.0), Json::from(2.0), Json::from(3.0)]),
        )]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_reads_never_fail() {
        let value = transform();
        assert_eq!(value["translation"][1], Json::Number(2.0));
        assert!(value["translation"][9].is_undefined());
        assert!(value["missing"]["deeper"].is_undefined());
        assert!(Json::from(3_u8)["key"].is_undefined());
        assert!(Json::Null[0].is_undefined());
    }

    #[test]
    fn test_set_index_pads_with_undefined() {
        let mut value = Json::Array(vec![Json::from(1_u8)]);
        value.set_index(3, "last");
        assert_eq!(
            value,
            Json::Array(vec![
                Json::from(1_u8),
                Json::Undefined,
                Json::Undefined,
                Json::from("last"),
            ])
        );
    }

    #[test]
    fn test_set_index_at_usize_max_is_ignored() {
        let mut value = Json::Array(vec![Json::from(1_u8)]);
        value.set_index(usize::MAX, "unreachable");
        assert_eq!(value, Json::Array(vec![Json::from(1_u8)]));
    }

    #[test]
    fn test_writes_on_wrong_shape_are_ignored() {
        let mut value = Json::from("text");
        value.set_key("a", 1_u8);
        value.set_index(0, 1_u8);
        value.push(true);
        assert_eq!(value, Json::from("text"));
    }

    #[test]
    fn test_set_and_remove_key() {
        let mut value = Json::Object(JsonObject::new());
        value.set_key("visible", true);
        assert_eq!(value["visible"], Json::Boolean(true));
        assert_eq!(value.remove_key("visible"), Some(Json::Boolean(true)));
        assert!(value["visible"].is_undefined());
    }
}
