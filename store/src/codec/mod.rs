//! Session payload codecs.
//!
//! A [`Serializer`] turns a session's [`Values`] into the bytes stored in the
//! cache and back. Two strategies are available:
//!
//! - **Bincode** (default): compact and exact for every [`Value`](crate::Value),
//!   but private to this crate's types and not readable from other languages
//! - **JSON**: human-readable, requires every key to be a string
//!
//! Deserialization merges into the destination map; it never clears it.

mod binary;
mod json;

use crate::error::SerializationError;
use crate::value::Values;

/// Payload serialization strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Serializer {
    /// Self-describing JSON object, string keys only
    Json,
    /// `bincode` encoding of the full key/value map
    #[default]
    Bincode,
}

impl Serializer {
    /// Get the strategy name.
    ///
    /// ```
    /// use redistore::Serializer;
    ///
    /// assert_eq!(Serializer::Json.name(), "json");
    /// assert_eq!(Serializer::default().name(), "bincode");
    /// ```
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Bincode => "bincode",
        }
    }

    /// Serialize session values.
    ///
    /// # Errors
    ///
    /// Returns [`SerializationError::NonStringKey`] when the JSON strategy
    /// meets a non-string key, or the underlying encoder error.
    pub fn serialize(&self, values: &Values) -> Result<Vec<u8>, SerializationError> {
        match self {
            Self::Json => json::serialize(values),
            Self::Bincode => binary::serialize(values),
        }
    }

    /// Deserialize a payload, merging the decoded entries into `values`.
    ///
    /// # Errors
    ///
    /// Returns the decoder error if the payload is not valid for this strategy.
    pub fn deserialize(&self, payload: &[u8], values: &mut Values) -> Result<(), SerializationError> {
        match self {
            Self::Json => json::deserialize(payload, values),
            Self::Bincode => binary::deserialize(payload, values),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{Key, Value};
    use proptest::prelude::*;
    use std::collections::BTreeMap;

    fn arb_value() -> impl Strategy<Value = Value> {
        let leaf = prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            any::<i64>().prop_map(Value::Int),
            (-1.0e12f64..1.0e12).prop_map(Value::Float),
            "[a-zA-Z0-9 _-]{0,16}".prop_map(Value::String),
        ];
        leaf.prop_recursive(3, 32, 4, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..4).prop_map(Value::List),
                prop::collection::btree_map("[a-z]{1,8}", inner, 0..4).prop_map(Value::Map),
            ]
        })
    }

    fn arb_string_keyed() -> impl Strategy<Value = Values> {
        prop::collection::hash_map("[a-z_]{1,10}".prop_map(Key::Str), arb_value(), 0..8)
    }

    proptest! {
        #[test]
        fn prop_json_round_trip(values in arb_string_keyed()) {
            let bytes = Serializer::Json.serialize(&values)?;
            let mut decoded = Values::new();
            Serializer::Json.deserialize(&bytes, &mut decoded)?;
            prop_assert_eq!(decoded, values);
        }

        #[test]
        fn prop_bincode_round_trip(values in arb_string_keyed(), ints in prop::collection::vec(any::<i64>(), 0..4)) {
            let mut values = values;
            for i in ints {
                values.insert(Key::Int(i), Value::Int(i));
            }

            let bytes = Serializer::Bincode.serialize(&values)?;
            let mut decoded = Values::new();
            Serializer::Bincode.deserialize(&bytes, &mut decoded)?;
            prop_assert_eq!(decoded, values);
        }
    }

    #[test]
    fn test_json_rejects_non_string_key() {
        let values = Values::from([
            (Key::from("name"), Value::from("alice")),
            (Key::Int(7), Value::Bool(true)),
        ]);

        let result = Serializer::Json.serialize(&values);
        assert_eq!(
            result,
            Err(SerializationError::NonStringKey { key: "7".to_string() })
        );
    }

    #[test]
    fn test_json_rejects_non_finite_float() {
        let flat = Values::from([(Key::from("f"), Value::Float(f64::NAN))]);
        assert!(matches!(
            Serializer::Json.serialize(&flat),
            Err(SerializationError::Json(_))
        ));

        let nested = Values::from([(
            Key::from("stats"),
            Value::Map(BTreeMap::from([(
                "ratios".to_string(),
                Value::List(vec![Value::Float(0.5), Value::Float(f64::INFINITY)]),
            )])),
        )]);
        assert!(matches!(
            Serializer::Json.serialize(&nested),
            Err(SerializationError::Json(_))
        ));

        // Bincode stores them exactly
        assert!(Serializer::Bincode.serialize(&flat).is_ok());
    }

    #[test]
    fn test_bincode_accepts_non_string_key() {
        let values = Values::from([(Key::Int(7), Value::Bool(true))]);
        assert!(Serializer::Bincode.serialize(&values).is_ok());
    }

    #[test]
    #[allow(clippy::unwrap_used)]
    fn test_deserialize_merges_into_existing_values() {
        let stored = Values::from([(Key::from("a"), Value::Int(1))]);

        for serializer in [Serializer::Json, Serializer::Bincode] {
            let bytes = serializer.serialize(&stored).unwrap();

            let mut target = Values::from([(Key::from("b"), Value::from("x"))]);
            serializer.deserialize(&bytes, &mut target).unwrap();

            assert_eq!(target.len(), 2, "{} must merge", serializer.name());
            assert_eq!(target.get(&Key::from("a")), Some(&Value::Int(1)));
            assert_eq!(target.get(&Key::from("b")), Some(&Value::from("x")));
        }
    }

    #[test]
    #[allow(clippy::unwrap_used)]
    fn test_json_is_human_readable() {
        let values = Values::from([(
            Key::from("prefs"),
            Value::Map(BTreeMap::from([("theme".to_string(), Value::from("dark"))])),
        )]);

        let bytes = Serializer::Json.serialize(&values).unwrap();
        assert_eq!(String::from_utf8(bytes).unwrap(), r#"{"prefs":{"theme":"dark"}}"#);
    }

    #[test]
    fn test_garbage_payload_is_rejected() {
        let mut values = Values::new();
        assert!(matches!(
            Serializer::Json.deserialize(b"[1,2,3]", &mut values),
            Err(SerializationError::Json(_))
        ));
        assert!(matches!(
            Serializer::Bincode.deserialize(&[0xff; 3], &mut values),
            Err(SerializationError::Binary(_))
        ));
        assert!(values.is_empty());
    }
}
