//! Insert, update and delete cycles.

use super::allocator;
use super::retry::{self, Attempt};
use crate::config::RepositoryConfig;
use crate::entity::{EntityId, Extraction};
use crate::error::{ModelError, ModelResult};
use crate::index::{data_key, reverse_key_set_key, ReverseKeySet, UniqueKey};
use redmodel_store::{CommitOutcome, OpReply, Store, WriteBatch};
use tracing::{debug, info};

/// Runs write protocols for one entity type over one connection.
///
/// A coordinator borrows its connection for a single repository call. Any
/// attempt that ends in an error releases its watches before returning.
pub struct Coordinator<'a> {
    store: &'a mut dyn Store,
    entity_type: &'a str,
    config: &'a RepositoryConfig,
}

/// What a committed delete removed.
struct Removal {
    released: Vec<String>,
    replies: Vec<OpReply>,
}

impl<'a> Coordinator<'a> {
    /// Creates a coordinator.
    pub fn new(
        store: &'a mut dyn Store,
        entity_type: &'a str,
        config: &'a RepositoryConfig,
    ) -> Self {
        Self {
            store,
            entity_type,
            config,
        }
    }

    /// Inserts a new entity and returns its freshly allocated id.
    ///
    /// A unique value already claimed before any watch is set fails without
    /// opening a transaction or consuming an id.
    ///
    /// # Errors
    ///
    /// - [`ModelError::UniquePropertyViolation`] if a unique value is taken
    /// - [`ModelError::Contention`] if a bounded retry policy runs out
    pub fn insert(&mut self, extraction: &Extraction, payload: &[u8]) -> ModelResult<EntityId> {
        if let Some(taken) = self.first_claimed(&extraction.unique_keys, None)? {
            debug!(
                entity_type = self.entity_type,
                field = taken.field(),
                "unique value already claimed"
            );
            return Err(ModelError::unique_violation(taken.field()));
        }

        let config = self.config;
        let entity_type = self.entity_type;
        let keys = extraction.key_strings();
        let id = retry::run(&config.retry, "insert", entity_type, |attempt| {
            let result = self.try_insert(extraction, &keys, payload, attempt);
            self.release_on_error(result)
        })?;
        Ok(id)
    }

    /// Rewrites an existing entity, moving its unique claims to the values
    /// in `extraction`.
    ///
    /// # Errors
    ///
    /// - [`ModelError::UniquePropertyViolation`] if a new unique value is
    ///   claimed by another entity
    /// - [`ModelError::Contention`] if a bounded retry policy runs out
    pub fn update(
        &mut self,
        id: EntityId,
        extraction: &Extraction,
        payload: &[u8],
    ) -> ModelResult<()> {
        let config = self.config;
        let entity_type = self.entity_type;
        let keys = extraction.key_strings();
        retry::run(&config.retry, "update", entity_type, |attempt| {
            let result = self.try_update(id, extraction, &keys, payload, attempt);
            self.release_on_error(result)
        })
    }

    /// Deletes an entity with its reverse key set and every unique key the
    /// set lists.
    ///
    /// # Errors
    ///
    /// - [`ModelError::Integrity`] in strict mode when a deletion found
    ///   nothing to remove
    /// - [`ModelError::Contention`] if a bounded retry policy runs out
    pub fn delete(&mut self, id: EntityId) -> ModelResult<()> {
        let config = self.config;
        let entity_type = self.entity_type;
        let removal = retry::run(&config.retry, "delete", entity_type, |attempt| {
            let result = self.try_delete(id, attempt);
            self.release_on_error(result)
        })?;

        if config.strict_delete {
            self.verify_removal(id, &removal)?;
        }
        Ok(())
    }

    fn try_insert(
        &mut self,
        extraction: &Extraction,
        keys: &[String],
        payload: &[u8],
        attempt: u32,
    ) -> ModelResult<Attempt<EntityId>> {
        if !keys.is_empty() {
            self.store.watch(keys)?;
        }
        if let Some(taken) = self.first_claimed(&extraction.unique_keys, None)? {
            return Err(ModelError::unique_violation(taken.field()));
        }

        let id = allocator::allocate(&mut *self.store, self.entity_type)?;

        let mut batch = WriteBatch::new();
        for key in keys {
            batch.set(key.as_str(), id.to_stored());
        }
        batch.set(data_key(self.entity_type, id), payload.to_vec());
        ReverseKeySet::stage_replace(
            &mut batch,
            &reverse_key_set_key(self.entity_type, id),
            keys,
        );

        Ok(match self.store.commit(batch)? {
            CommitOutcome::Committed(_) => {
                info!(entity_type = self.entity_type, id = %id, attempt, "inserted");
                Attempt::Committed(id)
            }
            CommitOutcome::Conflict => Attempt::Conflict,
        })
    }

    fn try_update(
        &mut self,
        id: EntityId,
        extraction: &Extraction,
        keys: &[String],
        payload: &[u8],
        attempt: u32,
    ) -> ModelResult<Attempt<()>> {
        let rks_key = reverse_key_set_key(self.entity_type, id);
        let mut watched = Vec::with_capacity(keys.len() + 1);
        watched.push(rks_key.clone());
        watched.extend_from_slice(keys);
        self.store.watch(&watched)?;

        let owned = ReverseKeySet::load(&mut *self.store, self.entity_type, id)?;
        if let Some(taken) = self.first_claimed(&extraction.unique_keys, Some(&owned))? {
            return Err(ModelError::unique_violation(taken.field()));
        }

        let mut batch = WriteBatch::new();
        owned.stage_release(&mut batch);
        for key in keys {
            batch.set(key.as_str(), id.to_stored());
        }
        batch.set(data_key(self.entity_type, id), payload.to_vec());
        ReverseKeySet::stage_replace(&mut batch, &rks_key, keys);

        Ok(match self.store.commit(batch)? {
            CommitOutcome::Committed(_) => {
                info!(entity_type = self.entity_type, id = %id, attempt, "updated");
                Attempt::Committed(())
            }
            CommitOutcome::Conflict => Attempt::Conflict,
        })
    }

    fn try_delete(&mut self, id: EntityId, attempt: u32) -> ModelResult<Attempt<Removal>> {
        let rks_key = reverse_key_set_key(self.entity_type, id);
        self.store.watch(std::slice::from_ref(&rks_key))?;

        let owned = ReverseKeySet::load(&mut *self.store, self.entity_type, id)?;
        let mut batch = WriteBatch::new();
        owned.stage_release(&mut batch);
        batch.delete(data_key(self.entity_type, id));
        batch.delete(rks_key);

        Ok(match self.store.commit(batch)? {
            CommitOutcome::Committed(replies) => {
                info!(entity_type = self.entity_type, id = %id, attempt, "deleted");
                Attempt::Committed(Removal {
                    released: owned.members().iter().cloned().collect(),
                    replies,
                })
            }
            CommitOutcome::Conflict => Attempt::Conflict,
        })
    }

    /// Returns the first key in `keys` that already exists and is not
    /// listed in `owned`.
    fn first_claimed<'k>(
        &mut self,
        keys: &'k [UniqueKey],
        owned: Option<&ReverseKeySet>,
    ) -> ModelResult<Option<&'k UniqueKey>> {
        for key in keys {
            if owned.is_some_and(|set| set.contains(key.key())) {
                continue;
            }
            if self.store.exists(key.key())? {
                return Ok(Some(key));
            }
        }
        Ok(None)
    }

    fn release_on_error<T>(&mut self, result: ModelResult<T>) -> ModelResult<T> {
        if result.is_err() {
            if let Err(e) = self.store.unwatch() {
                debug!(entity_type = self.entity_type, error = %e, "unwatch failed");
            }
        }
        result
    }

    /// Checks that every deletion in a committed delete removed something.
    ///
    /// The reverse key set itself is only expected when it had members,
    /// since an empty set is never written.
    fn verify_removal(&self, id: EntityId, removal: &Removal) -> ModelResult<()> {
        let data = data_key(self.entity_type, id);
        let rks = reverse_key_set_key(self.entity_type, id);

        let mut expected: Vec<&str> = removal.released.iter().map(String::as_str).collect();
        expected.push(&data);
        expected.push(&rks);

        let rks_optional = removal.released.is_empty();
        let missing: Vec<&str> = expected
            .iter()
            .zip(&removal.replies)
            .filter(|(key, reply)| reply.is_noop() && !(rks_optional && **key == rks))
            .map(|(key, _)| *key)
            .collect();

        if missing.is_empty() {
            return Ok(());
        }
        Err(ModelError::integrity(format!(
            "delete of {data} found keys already gone: {}",
            missing.join(", ")
        )))
    }
}
