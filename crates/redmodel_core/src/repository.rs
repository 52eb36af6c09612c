//! The entity gateway.

use crate::config::RepositoryConfig;
use crate::entity::{extract, Entity, EntityId};
use crate::error::{ModelError, ModelResult};
use crate::index::{data_key, unique_key};
use crate::schema::Schema;
use crate::transaction::{allocator, Coordinator};
use redmodel_codec::Value;
use redmodel_store::{ConnectionProvider, Store};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Reads and writes entities of one type.
///
/// A repository holds no mutable state. Each call opens its own connection
/// from the provider, so one repository can be shared across threads.
///
/// # Example
///
/// ```rust
/// use redmodel_core::{FieldDef, Repository, RepositoryConfig, Schema};
/// use redmodel_store::InMemoryStore;
/// use std::sync::Arc;
///
/// let schema = Schema::builder("User")
///     .field(FieldDef::new("email").unique())
///     .field(FieldDef::new("nickname"))
///     .build()
///     .unwrap();
/// let users = Repository::new(schema, RepositoryConfig::default(), Arc::new(InMemoryStore::new()));
///
/// let mut user = users.new_entity().with("email", "a@x.com").with("nickname", "al");
/// let id = users.put(&mut user).unwrap();
///
/// let found = users.get_by("email", "a@x.com").unwrap().unwrap();
/// assert_eq!(found.id(), Some(id));
/// ```
#[derive(Clone)]
pub struct Repository {
    schema: Arc<Schema>,
    config: RepositoryConfig,
    provider: Arc<dyn ConnectionProvider>,
}

impl Repository {
    /// Creates a repository for `schema`.
    pub fn new(
        schema: impl Into<Arc<Schema>>,
        config: RepositoryConfig,
        provider: Arc<dyn ConnectionProvider>,
    ) -> Self {
        Self {
            schema: schema.into(),
            config,
            provider,
        }
    }

    /// Returns the schema.
    #[must_use]
    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &RepositoryConfig {
        &self.config
    }

    /// Returns the entity type name.
    #[must_use]
    pub fn entity_type(&self) -> &str {
        self.schema.entity_type()
    }

    /// Creates an unsaved entity of this repository's type.
    #[must_use]
    pub fn new_entity(&self) -> Entity {
        Entity::new(Arc::clone(&self.schema))
    }

    /// Loads the entity with `id`, or `None` if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the store is unreachable or the stored data
    /// cannot be decoded.
    pub fn get(&self, id: EntityId) -> ModelResult<Option<Entity>> {
        let mut store = self.connect()?;
        self.load(&mut *store, id)
    }

    /// Loads the entity whose unique `field` equals `value`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ValidationError::NotUniqueField`] if `field` is not a
    /// declared unique field, before any store access.
    pub fn get_by(&self, field: &str, value: impl Into<Value>) -> ModelResult<Option<Entity>> {
        let key = self.lookup_key(field, &value.into())?;
        let mut store = self.connect()?;
        match Self::read_owner(&mut *store, &key)? {
            Some(id) => self.load(&mut *store, id),
            None => Ok(None),
        }
    }

    /// Returns the id of the entity whose unique `field` equals `value`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ValidationError::NotUniqueField`] if `field` is not a
    /// declared unique field, and [`ModelError::CorruptData`] if the stored
    /// owner is not a valid id.
    pub fn find_id(&self, field: &str, value: impl Into<Value>) -> ModelResult<Option<EntityId>> {
        let key = self.lookup_key(field, &value.into())?;
        let mut store = self.connect()?;
        Self::read_owner(&mut *store, &key)
    }

    /// Returns true if an entity with `id` exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the store is unreachable.
    pub fn exists(&self, id: EntityId) -> ModelResult<bool> {
        let mut store = self.connect()?;
        Ok(store.exists(&data_key(self.entity_type(), id))?)
    }

    /// Returns the current value of the id counter. The next insert gets an
    /// id greater than this.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::CorruptData`] if the counter is not an integer.
    pub fn next_id_hint(&self) -> ModelResult<u64> {
        let mut store = self.connect()?;
        allocator::peek(&mut *store, self.entity_type())
    }

    /// Saves `entity`: inserts it if it has no id, otherwise rewrites it.
    /// On insert the new id is bound to the entity.
    ///
    /// Validation runs before the store is contacted.
    ///
    /// # Errors
    ///
    /// - [`ModelError::Validation`] if the entity state cannot be stored
    /// - [`ModelError::UniquePropertyViolation`] if a unique value is taken
    /// - [`ModelError::State`] if the entity belongs to another type
    pub fn put(&self, entity: &mut Entity) -> ModelResult<EntityId> {
        self.check_owned(entity)?;
        let extraction = extract(entity)?;
        let payload = self.config.format.encode(&extraction.attributes)?;

        let mut store = self.connect()?;
        let mut coordinator = Coordinator::new(&mut *store, self.entity_type(), &self.config);
        match entity.id() {
            None => {
                let id = coordinator.insert(&extraction, &payload)?;
                entity.bind_id(id);
                Ok(id)
            }
            Some(id) => {
                coordinator.update(id, &extraction, &payload)?;
                Ok(id)
            }
        }
    }

    /// Deletes `entity` and releases its unique values. On success the
    /// entity returns to the unsaved state.
    ///
    /// # Errors
    ///
    /// - [`ModelError::State`] if the entity has no id; the store is not
    ///   contacted
    /// - [`ModelError::Integrity`] in strict mode when stored keys were
    ///   already missing; the entity keeps its id
    pub fn delete(&self, entity: &mut Entity) -> ModelResult<()> {
        self.check_owned(entity)?;
        let Some(id) = entity.id() else {
            return Err(ModelError::state(format!(
                "cannot delete an unsaved {}",
                self.entity_type()
            )));
        };

        let mut store = self.connect()?;
        Coordinator::new(&mut *store, self.entity_type(), &self.config).delete(id)?;
        entity.clear_id();
        Ok(())
    }

    fn connect(&self) -> ModelResult<Box<dyn Store>> {
        self.provider
            .connect(self.entity_type())
            .map_err(ModelError::from_connect)
    }

    fn check_owned(&self, entity: &Entity) -> ModelResult<()> {
        if entity.entity_type() == self.entity_type() {
            return Ok(());
        }
        Err(ModelError::state(format!(
            "a {} cannot be stored by the {} repository",
            entity.entity_type(),
            self.entity_type()
        )))
    }

    fn lookup_key(&self, field: &str, value: &Value) -> ModelResult<String> {
        let def = self.schema.unique_field(field)?;
        Ok(unique_key(self.entity_type(), def.name(), value))
    }

    fn read_owner(store: &mut dyn Store, key: &str) -> ModelResult<Option<EntityId>> {
        match store.get(key)? {
            None => Ok(None),
            Some(bytes) => EntityId::from_stored(&bytes)
                .map(Some)
                .ok_or_else(|| ModelError::corrupt(key, "unique key does not hold an id")),
        }
    }

    fn load(&self, store: &mut dyn Store, id: EntityId) -> ModelResult<Option<Entity>> {
        let key = data_key(self.entity_type(), id);
        let Some(bytes) = store.get(&key)? else {
            debug!(entity_type = self.entity_type(), id = %id, "not found");
            return Ok(None);
        };
        let attributes = self
            .config
            .format
            .decode(&bytes)
            .map_err(|e| ModelError::corrupt(&key, e.to_string()))?;
        Ok(Some(Entity::from_attributes(
            Arc::clone(&self.schema),
            id,
            attributes,
        )))
    }
}

impl fmt::Debug for Repository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Repository")
            .field("entity_type", &self.entity_type())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
