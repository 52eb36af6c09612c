//! Identity allocation.
//!
//! Ids come from an atomic per-type counter at `{type}:mid`. An id taken by
//! an attempt that later loses a conflict is never handed out again.

use crate::entity::EntityId;
use crate::error::{ModelError, ModelResult};
use crate::index::counter_key;
use redmodel_store::{Store, StoreError};

/// Advances the counter of `entity_type` and returns the new id.
///
/// # Errors
///
/// Returns [`ModelError::CorruptData`] if the counter holds something other
/// than a non-negative integer.
pub fn allocate(store: &mut dyn Store, entity_type: &str) -> ModelResult<EntityId> {
    let key = counter_key(entity_type);
    let value = match store.incr(&key) {
        Ok(value) => value,
        Err(StoreError::NotInteger { .. } | StoreError::WrongType { .. }) => {
            return Err(ModelError::corrupt(key, "id counter is not an integer"));
        }
        Err(e) => return Err(e.into()),
    };
    EntityId::from_counter(value)
        .ok_or_else(|| ModelError::corrupt(key, format!("id counter produced {value}")))
}

/// Reads the counter of `entity_type` without advancing it. An absent
/// counter reads as 0.
///
/// # Errors
///
/// Returns [`ModelError::CorruptData`] if the counter is not a non-negative
/// integer.
pub fn peek(store: &mut dyn Store, entity_type: &str) -> ModelResult<u64> {
    let key = counter_key(entity_type);
    let bytes = match store.get(&key) {
        Ok(Some(bytes)) => bytes,
        Ok(None) => return Ok(0),
        Err(StoreError::WrongType { .. }) => {
            return Err(ModelError::corrupt(key, "id counter is not a string"));
        }
        Err(e) => return Err(e.into()),
    };
    std::str::from_utf8(&bytes)
        .ok()
        .and_then(|text| text.parse::<u64>().ok())
        .ok_or_else(|| ModelError::corrupt(key, "id counter is not an integer"))
}
