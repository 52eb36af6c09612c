//! Store key layout.

use crate::entity::EntityId;
use redmodel_codec::Value;

/// Returns the id counter key of a type.
#[must_use]
pub fn counter_key(entity_type: &str) -> String {
    format!("{entity_type}:mid")
}

/// Returns the data key of an entity.
#[must_use]
pub fn data_key(entity_type: &str, id: EntityId) -> String {
    format!("{entity_type}:{id}")
}

/// Returns the reverse key set key of an entity.
#[must_use]
pub fn reverse_key_set_key(entity_type: &str, id: EntityId) -> String {
    format!("{entity_type}:{id}:rks")
}

/// Returns the key claiming `value` for a unique field.
#[must_use]
pub fn unique_key(entity_type: &str, field: &str, value: &Value) -> String {
    format!("{entity_type}:{field}:{value}")
}

/// A unique key together with the field it was derived from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UniqueKey {
    field: String,
    key: String,
}

impl UniqueKey {
    /// Derives the unique key for one field value.
    #[must_use]
    pub fn new(entity_type: &str, field: &str, value: &Value) -> Self {
        Self {
            field: field.to_owned(),
            key: unique_key(entity_type, field, value),
        }
    }

    /// Returns the field name.
    #[must_use]
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Returns the store key.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }
}
