//! Wire encoding and typed projection
//!
//! Encoding drops object members that are `Undefined` and writes `null` for
//! undefined array elements or a top-level undefined value. Decoding accepts
//! any JSON document and never fails on shape.

use std::fmt;

use error_stack::Report;
use serde::de::{DeserializeOwned, MapAccess, SeqAccess, Visitor};
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use super::{Json, JsonObject};
use crate::error::{Error, Result};

impl Serialize for Json {
    fn serialize<S: Serializer>(&self, serializer: S) -> core::result::Result<S::Ok, S::Error> {
        match self {
            Self::String(value) => serializer.serialize_str(value),
            Self::Integer(value) => {
                if let Ok(value) = u64::try_from(*value) {
                    serializer.serialize_u64(value)
                } else if let Ok(value) = i64::try_from(*value) {
                    serializer.serialize_i64(value)
                } else {
                    serializer.serialize_i128(*value)
                }
            },
            Self::Number(value) => serializer.serialize_f64(*value),
            Self::Boolean(value) => serializer.serialize_bool(*value),
            Self::Undefined | Self::Null => serializer.serialize_unit(),
            Self::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            },
            Self::Object(members) => {
                let defined = members.iter().filter(|(_, value)| !value.is_undefined());
                let mut map = serializer.serialize_map(None)?;
                for (key, value) in defined {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            },
        }
    }
}

struct JsonVisitor;

impl<'de> Visitor<'de> for JsonVisitor {
    type Value = Json;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("any JSON value")
    }

    fn visit_bool<E: serde::de::Error>(self, value: bool) -> core::result::Result<Json, E> {
        Ok(Json::Boolean(value))
    }

    fn visit_i64<E: serde::de::Error>(self, value: i64) -> core::result::Result<Json, E> {
        Ok(Json::from(value))
    }

    fn visit_u64<E: serde::de::Error>(self, value: u64) -> core::result::Result<Json, E> {
        Ok(Json::from(value))
    }

    #[allow(
        clippy::cast_precision_loss,
        reason = "integers beyond the supported range degrade to floats"
    )]
    fn visit_i128<E: serde::de::Error>(self, value: i128) -> core::result::Result<Json, E> {
        Ok(Json::integer(value).unwrap_or(Json::Number(value as f64)))
    }

    fn visit_u128<E: serde::de::Error>(self, value: u128) -> core::result::Result<Json, E> {
        Ok(u64::try_from(value).map_or(Json::Undefined, Json::from))
    }

    fn visit_f64<E: serde::de::Error>(self, value: f64) -> core::result::Result<Json, E> {
        Ok(Json::Number(value))
    }

    fn visit_char<E: serde::de::Error>(self, value: char) -> core::result::Result<Json, E> {
        Ok(Json::String(value.to_string()))
    }

    fn visit_str<E: serde::de::Error>(self, value: &str) -> core::result::Result<Json, E> {
        Ok(Json::String(value.to_string()))
    }

    fn visit_string<E: serde::de::Error>(self, value: String) -> core::result::Result<Json, E> {
        Ok(Json::String(value))
    }

    fn visit_bytes<E: serde::de::Error>(self, _: &[u8]) -> core::result::Result<Json, E> {
        Ok(Json::Undefined)
    }

    fn visit_none<E: serde::de::Error>(self) -> core::result::Result<Json, E> {
        Ok(Json::Null)
    }

    fn visit_unit<E: serde::de::Error>(self) -> core::result::Result<Json, E> {
        Ok(Json::Null)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> core::result::Result<Json, D::Error> {
        Json::deserialize(deserializer)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> core::result::Result<Json, A::Error> {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(item) = seq.next_element::<Json>()? {
            items.push(item);
        }
        Ok(Json::Array(items))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> core::result::Result<Json, A::Error> {
        let mut members = JsonObject::new();
        while let Some((key, value)) = map.next_entry::<String, Json>()? {
            members.insert(key, value);
        }
        Ok(Json::Object(members))
    }
}

impl<'de> Deserialize<'de> for Json {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> core::result::Result<Self, D::Error> {
        deserializer.deserialize_any(JsonVisitor)
    }
}

impl From<Value> for Json {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(value) => Self::Boolean(value),
            Value::Number(number) => {
                if let Some(value) = number.as_u64() {
                    Self::from(value)
                } else if let Some(value) = number.as_i64() {
                    Self::from(value)
                } else {
                    number.as_f64().map_or(Self::Undefined, Self::Number)
                }
            },
            Value::String(value) => Self::String(value),
            Value::Array(items) => Self::Array(items.into_iter().map(Self::from).collect()),
            Value::Object(members) => Self::Object(
                members
                    .into_iter()
                    .map(|(key, value)| (key, Self::from(value)))
                    .collect(),
            ),
        }
    }
}

impl From<&Json> for Value {
    fn from(value: &Json) -> Self {
        match value {
            Json::String(value) => Self::String(value.clone()),
            Json::Integer(value) => u64::try_from(*value)
                .map(Self::from)
                .or_else(|_| i64::try_from(*value).map(Self::from))
                .unwrap_or(Self::Null),
            Json::Number(value) => Self::from(*value),
            Json::Boolean(value) => Self::Bool(*value),
            Json::Undefined | Json::Null => Self::Null,
            Json::Array(items) => Self::Array(items.iter().map(Self::from).collect()),
            Json::Object(members) => Self::Object(
                members
                    .iter()
                    .filter(|(_, value)| !value.is_undefined())
                    .map(|(key, value)| (key.clone(), Self::from(value)))
                    .collect(),
            ),
        }
    }
}

impl Json {
    /// Decode a document received from the wire
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes)
            .map_err(|e| Report::new(Error::unexpected("JSON document", e)))
    }

    /// Encode for the wire
    pub fn to_vec(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| Report::new(Error::failed_to("encode JSON", e)))
    }

    /// Convert to a `serde_json::Value`, applying the same undefined rules as encoding
    pub fn to_value(&self) -> Value {
        Value::from(self)
    }

    /// Build a value from anything serializable
    pub fn encode_from<T: Serialize + ?Sized>(value: &T) -> Result<Self> {
        serde_json::to_value(value)
            .map(Self::from)
            .map_err(|e| Report::new(Error::failed_to("encode value", e)))
    }

    /// Decode this value into `T` by round-tripping through the wire encoding
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_value(self.to_value())
            .map_err(|e| {
                Report::new(Error::unexpected("value shape", e)).attach(format!("Value: {self}"))
            })
    }

    /// Typed view; `None` when the value does not decode as `T`
    pub fn get<T: DeserializeOwned>(&self) -> Option<T> {
        if self.is_undefined() {
            return None;
        }
        serde_json::from_value(self.to_value()).ok()
    }

    /// Typed view with a fallback for shape mismatches
    pub fn get_or<T: DeserializeOwned>(&self, default: T) -> T {
        self.get().unwrap_or(default)
    }

    /// Replace this value with the encoding of `value`
    ///
    /// Values that cannot be encoded leave this value `Undefined`.
    pub fn set<T: Serialize + ?Sized>(&mut self, value: &T) {
        *self = Self::encode_from(value).unwrap_or_default();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_undefined_members_are_omitted() {
        let value: Json = [
            ("visible", Json::Boolean(true)),
            ("parent", Json::Undefined),
            ("list", Json::Array(vec![Json::Undefined, Json::from(2_u8)])),
        ]
        .into_iter()
        .collect();
        let encoded = String::from_utf8(value.to_vec().unwrap()).unwrap();
        assert_eq!(encoded, r#"{"list":[null,2],"visible":true}"#);
        assert_eq!(Json::Undefined.to_vec().unwrap(), b"null");
    }

    #[test]
    fn test_round_trip_without_undefined() {
        let text = r#"{"a":[1,-2,3.5,"x",true,null],"b":{"c":18446744073709551615}}"#;
        let value = Json::from_slice(text.as_bytes()).unwrap();
        assert_eq!(value["b"]["c"].as_u64(), Some(u64::MAX));
        assert_eq!(value["a"][1].as_i64(), Some(-2));
        let again = Json::from_slice(&value.to_vec().unwrap()).unwrap();
        assert_eq!(value, again);
    }

    #[test]
    fn test_decode_rejects_wrong_shape() {
        #[derive(Deserialize, Debug, PartialEq)]
        struct Vec3 {
            x: f32,
            y: f32,
        }

        let value = Json::from_slice(br#"{"x": 1.0, "y": 2}"#).unwrap();
        assert_eq!(value.decode::<Vec3>().unwrap(), Vec3 { x: 1.0, y: 2.0 });

        let error = Json::from("text").decode::<Vec3>().unwrap_err();
        assert!(matches!(error.current_context(), Error::Decode(_)));
    }

    #[test]
    fn test_get_and_set() {
        let mut value = Json::default();
        assert_eq!(value.get::<u32>(), None);
        assert_eq!(value.get_or(7_u32), 7);

        value.set(&["a", "b"]);
        assert_eq!(value.get::<Vec<String>>(), Some(vec!["a".into(), "b".into()]));
        assert_eq!(value.get::<u32>(), None);
    }

    #[test]
    fn test_value_conversion() {
        let value = serde_json::json!({"n": -5, "f": 0.25, "s": "t"});
        let converted = Json::from(value.clone());
        assert_eq!(converted["n"], Json::Integer(-5));
        assert_eq!(converted.to_value(), value);
    }
}
