//! Session value model.
//!
//! Sessions hold a map from [`Key`] to [`Value`]. Both are closed enums so
//! the binary codec can round-trip them exactly; the JSON codec additionally
//! requires every key to be a [`Key::Str`].

use crate::error::SerializationError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Values stored in a session, keyed by [`Key`].
pub type Values = HashMap<Key, Value>;

/// Session map key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Key {
    /// String key (the only kind the JSON codec accepts)
    Str(String),
    /// Integer key
    Int(i64),
}

impl Key {
    /// Returns the key as a string slice if it is a string key.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            Self::Int(_) => None,
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(s) => write!(f, "{s:?}"),
            Self::Int(i) => write!(f, "{i}"),
        }
    }
}

impl From<&str> for Key {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for Key {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<i64> for Key {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

/// Session value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// Absent value
    Null,
    /// Boolean
    Bool(bool),
    /// Signed integer
    Int(i64),
    /// Floating point number
    Float(f64),
    /// UTF-8 string
    String(String),
    /// Ordered list
    List(Vec<Value>),
    /// Nested string-keyed map
    Map(BTreeMap<String, Value>),
}

impl Value {
    /// Returns the integer if this is an [`Value::Int`].
    #[must_use]
    pub const fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Returns the string slice if this is a [`Value::String`].
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the boolean if this is a [`Value::Bool`].
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Converts into the equivalent JSON value.
    ///
    /// # Errors
    ///
    /// Returns [`SerializationError::Json`] if the value holds a NaN or
    /// infinite float anywhere, since JSON cannot represent it.
    pub fn into_json(self) -> Result<serde_json::Value, SerializationError> {
        Ok(match self {
            Self::Null => serde_json::Value::Null,
            Self::Bool(b) => serde_json::Value::Bool(b),
            Self::Int(i) => serde_json::Value::from(i),
            Self::Float(f) => serde_json::Number::from_f64(f)
                .map(serde_json::Value::Number)
                .ok_or_else(|| {
                    SerializationError::Json(format!("non-finite float {f} has no JSON representation"))
                })?,
            Self::String(s) => serde_json::Value::String(s),
            Self::List(items) => serde_json::Value::Array(
                items
                    .into_iter()
                    .map(Self::into_json)
                    .collect::<Result<_, _>>()?,
            ),
            Self::Map(map) => serde_json::Value::Object(
                map.into_iter()
                    .map(|(k, v)| Ok((k, v.into_json()?)))
                    .collect::<Result<_, SerializationError>>()?,
            ),
        })
    }

    /// Converts from a JSON value.
    ///
    /// Integral numbers that fit in an `i64` become [`Value::Int`], every
    /// other number becomes [`Value::Float`].
    #[must_use]
    pub fn from_json(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Self::Int(i),
                None => n.as_f64().map_or(Self::Null, Self::Float),
            },
            serde_json::Value::String(s) => Self::String(s),
            serde_json::Value::Array(items) => {
                Self::List(items.into_iter().map(Self::from_json).collect())
            }
            serde_json::Value::Object(map) => Self::Map(
                map.into_iter().map(|(k, v)| (k, Self::from_json(v))).collect(),
            ),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Self::List(value)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_json_number_mapping() {
        assert_eq!(Value::from_json(serde_json::json!(7)), Value::Int(7));
        assert_eq!(Value::from_json(serde_json::json!(2.5)), Value::Float(2.5));
        assert_eq!(Value::from_json(serde_json::json!(u64::MAX)), Value::Float(u64::MAX as f64));
    }

    #[test]
    fn test_non_finite_float_is_rejected() {
        for f in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            assert!(matches!(Value::Float(f).into_json(), Err(SerializationError::Json(_))));
        }

        let nested = Value::Map(BTreeMap::from([(
            "scores".to_string(),
            Value::List(vec![Value::Int(1), Value::Float(f64::NAN)]),
        )]));
        assert!(nested.into_json().is_err());
    }

    #[test]
    fn test_nested_json_conversion() {
        let value = Value::Map(BTreeMap::from([
            ("tags".to_string(), Value::List(vec![Value::from("a"), Value::Int(1)])),
            ("ok".to_string(), Value::Bool(true)),
        ]));

        let json = value.clone().into_json().unwrap();
        assert_eq!(json, serde_json::json!({"tags": ["a", 1], "ok": true}));
        assert_eq!(Value::from_json(json), value);
    }

    #[test]
    fn test_key_display() {
        assert_eq!(Key::from("user").to_string(), "\"user\"");
        assert_eq!(Key::from(42).to_string(), "42");
        assert_eq!(Key::from(42).as_str(), None);
    }
}
