//! Bincode payload codec.
//!
//! The encoding mirrors the Rust definitions of [`Key`](crate::Key) and
//! [`Value`](crate::Value); payloads are not meant to be read by other languages.

use crate::error::SerializationError;
use crate::value::Values;

pub(super) fn serialize(values: &Values) -> Result<Vec<u8>, SerializationError> {
    bincode::serialize(values).map_err(|e| SerializationError::Binary(e.to_string()))
}

pub(super) fn deserialize(payload: &[u8], values: &mut Values) -> Result<(), SerializationError> {
    let decoded: Values =
        bincode::deserialize(payload).map_err(|e| SerializationError::Binary(e.to_string()))?;
    values.extend(decoded);
    Ok(())
}
