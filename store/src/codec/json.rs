//! JSON payload codec.

use crate::error::SerializationError;
use crate::value::{Key, Value, Values};

pub(super) fn serialize(values: &Values) -> Result<Vec<u8>, SerializationError> {
    let mut object = serde_json::Map::with_capacity(values.len());
    for (key, value) in values {
        let Key::Str(name) = key else {
            return Err(SerializationError::NonStringKey {
                key: key.to_string(),
            });
        };
        object.insert(name.clone(), value.clone().into_json()?);
    }

    serde_json::to_vec(&object).map_err(|e| SerializationError::Json(e.to_string()))
}

pub(super) fn deserialize(payload: &[u8], values: &mut Values) -> Result<(), SerializationError> {
    let object: serde_json::Map<String, serde_json::Value> =
        serde_json::from_slice(payload).map_err(|e| SerializationError::Json(e.to_string()))?;

    values.extend(
        object
            .into_iter()
            .map(|(k, v)| (Key::Str(k), Value::from_json(v))),
    );
    Ok(())
}
