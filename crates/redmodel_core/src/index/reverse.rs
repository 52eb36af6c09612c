//! Reverse key sets.

use super::keys::reverse_key_set_key;
use crate::entity::EntityId;
use redmodel_store::{Store, StoreResult, WriteBatch};
use std::collections::BTreeSet;

/// The unique keys one entity claims, as last read from the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReverseKeySet {
    key: String,
    members: BTreeSet<String>,
}

impl ReverseKeySet {
    /// Reads the reverse key set of an entity. A missing set reads as empty.
    ///
    /// # Errors
    ///
    /// Returns the store error if the read fails.
    pub fn load(store: &mut dyn Store, entity_type: &str, id: EntityId) -> StoreResult<Self> {
        let key = reverse_key_set_key(entity_type, id);
        let members = store.smembers(&key)?;
        Ok(Self { key, members })
    }

    /// Returns the store key of the set.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Returns the members.
    #[must_use]
    pub fn members(&self) -> &BTreeSet<String> {
        &self.members
    }

    /// Returns true if `unique_key` is a member.
    #[must_use]
    pub fn contains(&self, unique_key: &str) -> bool {
        self.members.contains(unique_key)
    }

    /// Returns the number of members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Returns true if the set has no members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Buffers deletion of every member key.
    pub fn stage_release(&self, batch: &mut WriteBatch) {
        for member in &self.members {
            batch.delete(member.as_str());
        }
    }

    /// Buffers replacing the set at `key` with exactly `keys`.
    pub fn stage_replace(batch: &mut WriteBatch, key: &str, keys: &[String]) {
        batch.delete(key);
        batch.sadd(key, keys.iter().cloned());
    }
}
