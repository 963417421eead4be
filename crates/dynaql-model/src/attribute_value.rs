//! `AttributeValue` and its DynamoDB-JSON representation.
//!
//! Every value is encoded as an object with exactly one key naming its type,
//! e.g. `{"S": "hello"}` or `{"L": [{"N": "1"}]}`. Numbers stay string-encoded
//! so that arbitrary precision survives a round-trip through the model.

use std::collections::HashMap;
use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use bytes::Bytes;
use serde::de::{self, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A record: attribute name to value.
pub type Item = HashMap<String, AttributeValue>;

/// Type keys accepted on the wire, in descriptor order.
const TYPE_KEYS: &[&str] = &["S", "N", "B", "SS", "NS", "BS", "BOOL", "NULL", "L", "M"];

/// A typed attribute value.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    /// String.
    S(String),
    /// Number, kept in its textual form.
    N(String),
    /// Binary blob (base64 on the wire).
    B(Bytes),
    /// String set.
    Ss(Vec<String>),
    /// Number set.
    Ns(Vec<String>),
    /// Binary set.
    Bs(Vec<Bytes>),
    /// Boolean.
    Bool(bool),
    /// Null marker.
    Null(bool),
    /// Ordered list of values.
    L(Vec<AttributeValue>),
    /// Nested map of values.
    M(HashMap<String, AttributeValue>),
}

impl AttributeValue {
    /// Build a number value from anything printable as a number.
    #[must_use]
    pub fn number(n: impl fmt::Display) -> Self {
        Self::N(n.to_string())
    }

    /// Build a string value.
    #[must_use]
    pub fn string(s: impl Into<String>) -> Self {
        Self::S(s.into())
    }

    /// Returns the string if this is an `S` value.
    #[must_use]
    pub fn as_s(&self) -> Option<&str> {
        match self {
            Self::S(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the textual number if this is an `N` value.
    #[must_use]
    pub fn as_n(&self) -> Option<&str> {
        match self {
            Self::N(n) => Some(n),
            _ => None,
        }
    }

    /// Returns the boolean if this is a `BOOL` value.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the elements if this is an `L` value.
    #[must_use]
    pub fn as_l(&self) -> Option<&[AttributeValue]> {
        match self {
            Self::L(l) => Some(l),
            _ => None,
        }
    }

    /// Returns the entries if this is an `M` value.
    #[must_use]
    pub fn as_m(&self) -> Option<&HashMap<String, AttributeValue>> {
        match self {
            Self::M(m) => Some(m),
            _ => None,
        }
    }

    /// The type descriptor used both as the wire key and by `attribute_type()`.
    #[must_use]
    pub fn type_descriptor(&self) -> &'static str {
        match self {
            Self::S(_) => "S",
            Self::N(_) => "N",
            Self::B(_) => "B",
            Self::Ss(_) => "SS",
            Self::Ns(_) => "NS",
            Self::Bs(_) => "BS",
            Self::Bool(_) => "BOOL",
            Self::Null(_) => "NULL",
            Self::L(_) => "L",
            Self::M(_) => "M",
        }
    }

    /// Returns `true` if `descriptor` names a known attribute type.
    #[must_use]
    pub fn is_type_descriptor(descriptor: &str) -> bool {
        TYPE_KEYS.contains(&descriptor)
    }
}

impl From<bool> for AttributeValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<&str> for AttributeValue {
    fn from(s: &str) -> Self {
        Self::S(s.to_owned())
    }
}

impl From<String> for AttributeValue {
    fn from(s: String) -> Self {
        Self::S(s)
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ty = self.type_descriptor();
        match self {
            Self::S(s) => write!(f, "{ty} {s:?}"),
            Self::N(n) => write!(f, "{ty} {n}"),
            Self::Bool(b) => write!(f, "{ty} {b}"),
            Self::Null(_) => f.write_str(ty),
            Self::B(b) => write!(f, "{ty} ({} bytes)", b.len()),
            Self::Ss(v) | Self::Ns(v) => write!(f, "{ty} {v:?}"),
            Self::Bs(v) => write!(f, "{ty} ({} items)", v.len()),
            Self::L(v) => write!(f, "{ty} ({} items)", v.len()),
            Self::M(m) => write!(f, "{ty} ({} keys)", m.len()),
        }
    }
}

impl Serialize for AttributeValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let key = self.type_descriptor();
        let mut map = serializer.serialize_map(Some(1))?;
        match self {
            Self::S(s) | Self::N(s) => map.serialize_entry(key, s)?,
            Self::B(b) => map.serialize_entry(key, &BASE64.encode(b))?,
            Self::Ss(v) | Self::Ns(v) => map.serialize_entry(key, v)?,
            Self::Bs(v) => {
                let encoded: Vec<String> = v.iter().map(|b| BASE64.encode(b)).collect();
                map.serialize_entry(key, &encoded)?;
            }
            Self::Bool(b) | Self::Null(b) => map.serialize_entry(key, b)?,
            Self::L(list) => map.serialize_entry(key, list)?,
            Self::M(m) => map.serialize_entry(key, m)?,
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for AttributeValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(AttributeValueVisitor)
    }
}

struct AttributeValueVisitor;

impl<'de> Visitor<'de> for AttributeValueVisitor {
    type Value = AttributeValue;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("an attribute value object with a single type key")
    }

    fn visit_map<M: MapAccess<'de>>(self, mut map: M) -> Result<Self::Value, M::Error> {
        let Some(key) = map.next_key::<String>()? else {
            return Err(de::Error::custom("attribute value object has no type key"));
        };

        let value = match key.as_str() {
            "S" => AttributeValue::S(map.next_value()?),
            "N" => AttributeValue::N(map.next_value()?),
            "B" => {
                let encoded: String = map.next_value()?;
                AttributeValue::B(decode_binary(&encoded)?)
            }
            "SS" => AttributeValue::Ss(map.next_value()?),
            "NS" => AttributeValue::Ns(map.next_value()?),
            "BS" => {
                let encoded: Vec<String> = map.next_value()?;
                let decoded = encoded
                    .iter()
                    .map(|e| decode_binary(e))
                    .collect::<Result<Vec<_>, M::Error>>()?;
                AttributeValue::Bs(decoded)
            }
            "BOOL" => AttributeValue::Bool(map.next_value()?),
            "NULL" => AttributeValue::Null(map.next_value()?),
            "L" => AttributeValue::L(map.next_value()?),
            "M" => AttributeValue::M(map.next_value()?),
            other => return Err(de::Error::unknown_field(other, TYPE_KEYS)),
        };

        if map.next_key::<String>()?.is_some() {
            return Err(de::Error::custom(
                "attribute value object must have exactly one type key",
            ));
        }

        Ok(value)
    }
}

fn decode_binary<E: de::Error>(encoded: &str) -> Result<Bytes, E> {
    BASE64
        .decode(encoded)
        .map(Bytes::from)
        .map_err(de::Error::custom)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_serialize_scalar_values() {
        let cases = [
            (AttributeValue::string("hello"), r#"{"S":"hello"}"#),
            (AttributeValue::number(42), r#"{"N":"42"}"#),
            (AttributeValue::Bool(true), r#"{"BOOL":true}"#),
            (AttributeValue::Null(true), r#"{"NULL":true}"#),
        ];
        for (value, expected) in cases {
            assert_eq!(serde_json::to_string(&value).unwrap(), expected);
        }
    }

    #[test]
    fn test_should_serialize_nested_list() {
        let val = AttributeValue::L(vec![
            AttributeValue::string("a"),
            AttributeValue::L(vec![AttributeValue::number(1)]),
        ]);
        let json = serde_json::to_string(&val).unwrap();
        assert_eq!(json, r#"{"L":[{"S":"a"},{"L":[{"N":"1"}]}]}"#);
    }

    #[test]
    fn test_should_deserialize_item() {
        let json = r#"{
            "id": {"S": "user-1"},
            "age": {"N": "31"},
            "tags": {"SS": ["a", "b"]},
            "profile": {"M": {"city": {"S": "Oslo"}}}
        }"#;
        let item: Item = serde_json::from_str(json).unwrap();
        assert_eq!(item.len(), 4);
        assert_eq!(item["age"].as_n(), Some("31"));
        assert!(matches!(&item["tags"], AttributeValue::Ss(v) if v.len() == 2));
        let profile = item["profile"].as_m().unwrap();
        assert_eq!(profile["city"].as_s(), Some("Oslo"));
    }

    #[test]
    fn test_should_decode_binary_value() {
        let val: AttributeValue = serde_json::from_str(r#"{"B":"aGk="}"#).unwrap();
        assert_eq!(val, AttributeValue::B(Bytes::from_static(b"hi")));
        assert_eq!(serde_json::to_string(&val).unwrap(), r#"{"B":"aGk="}"#);
    }

    #[test]
    fn test_should_reject_unknown_type_key() {
        let err = serde_json::from_str::<AttributeValue>(r#"{"X":"1"}"#).unwrap_err();
        assert!(err.to_string().contains("unknown field"));
    }

    #[test]
    fn test_should_reject_empty_and_multi_key_objects() {
        assert!(serde_json::from_str::<AttributeValue>("{}").is_err());
        assert!(serde_json::from_str::<AttributeValue>(r#"{"S":"a","N":"1"}"#).is_err());
    }

    #[test]
    fn test_should_report_type_descriptors() {
        assert_eq!(AttributeValue::string("x").type_descriptor(), "S");
        assert_eq!(AttributeValue::M(HashMap::new()).type_descriptor(), "M");
        assert!(AttributeValue::is_type_descriptor("BOOL"));
        assert!(!AttributeValue::is_type_descriptor("bool"));
    }

    #[test]
    fn test_should_expose_typed_accessors() {
        let list = AttributeValue::L(vec![AttributeValue::Bool(false)]);
        let map = AttributeValue::M(HashMap::from([(
            "k".to_owned(),
            AttributeValue::string("v"),
        )]));
        assert_eq!(AttributeValue::Bool(true).as_bool(), Some(true));
        assert_eq!(list.as_l().map(<[_]>::len), Some(1));
        assert_eq!(
            map.as_m().and_then(|m| m.get("k")),
            Some(&AttributeValue::string("v"))
        );
        assert_eq!(list.as_bool(), None);
        assert!(map.as_l().is_none());
        assert!(list.as_m().is_none());
    }

    #[test]
    fn test_should_display_values_for_diagnostics() {
        assert_eq!(AttributeValue::string("a b").to_string(), r#"S "a b""#);
        assert_eq!(AttributeValue::number("1.5").to_string(), "N 1.5");
        assert_eq!(AttributeValue::Null(true).to_string(), "NULL");
    }
}
