//! Connection providers.

use crate::backend::Store;
use crate::error::{StoreError, StoreResult};
use crate::memory::InMemoryStore;
use std::fmt;
use std::sync::Arc;

/// Default Redis URL used when none is configured.
pub const DEFAULT_REDIS_URL: &str = "redis://127.0.0.1/";

/// Produces store connections for an entity type.
///
/// This is the single seam between redmodel and connection management.
/// Implementations decide how connections are made (fresh client, pool,
/// shared in-memory keyspace); callers only ask for one.
pub trait ConnectionProvider: Send + Sync {
    /// Opens a connection used to persist entities of `entity_type`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] if no connection can be made.
    fn connect(&self, entity_type: &str) -> StoreResult<Box<dyn Store>>;
}

impl ConnectionProvider for InMemoryStore {
    fn connect(&self, _entity_type: &str) -> StoreResult<Box<dyn Store>> {
        Ok(Box::new(self.connection()))
    }
}

impl<P: ConnectionProvider + ?Sized> ConnectionProvider for Arc<P> {
    fn connect(&self, entity_type: &str) -> StoreResult<Box<dyn Store>> {
        (**self).connect(entity_type)
    }
}

/// A provider backed by a closure.
///
/// # Example
///
/// ```rust
/// use redmodel_store::{ConnectionProvider, FnProvider, InMemoryStore, Store};
///
/// let users = InMemoryStore::new();
/// let provider = FnProvider::new(move |_entity_type: &str| {
///     Ok(Box::new(users.connection()) as Box<dyn Store>)
/// });
/// assert!(provider.connect("User").is_ok());
/// ```
pub struct FnProvider<F> {
    factory: F,
}

impl<F> FnProvider<F>
where
    F: Fn(&str) -> StoreResult<Box<dyn Store>> + Send + Sync,
{
    /// Wraps a connection factory.
    pub fn new(factory: F) -> Self {
        Self { factory }
    }
}

impl<F> ConnectionProvider for FnProvider<F>
where
    F: Fn(&str) -> StoreResult<Box<dyn Store>> + Send + Sync,
{
    fn connect(&self, entity_type: &str) -> StoreResult<Box<dyn Store>> {
        (self.factory)(entity_type)
    }
}

impl<F> fmt::Debug for FnProvider<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnProvider").finish_non_exhaustive()
    }
}

/// Selects a concrete [`ConnectionProvider`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreConfig {
    /// A fresh, empty in-process store.
    Memory,
    /// A Redis server. Requires the `redis` feature.
    Redis {
        /// Connection URL, e.g. `redis://127.0.0.1/0`.
        url: String,
    },
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::Redis {
            url: DEFAULT_REDIS_URL.to_string(),
        }
    }
}

impl StoreConfig {
    /// Creates a Redis configuration.
    pub fn redis(url: impl Into<String>) -> Self {
        Self::Redis { url: url.into() }
    }

    /// Builds the provider this configuration describes.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] if the URL is invalid or Redis
    /// support is not compiled in.
    pub fn open(&self) -> StoreResult<Arc<dyn ConnectionProvider>> {
        match self {
            Self::Memory => Ok(Arc::new(InMemoryStore::new())),
            Self::Redis { url } => open_redis(url),
        }
    }
}

#[cfg(feature = "redis")]
fn open_redis(url: &str) -> StoreResult<Arc<dyn ConnectionProvider>> {
    Ok(Arc::new(crate::redis_store::RedisProvider::open(url)?))
}

#[cfg(not(feature = "redis"))]
fn open_redis(url: &str) -> StoreResult<Arc<dyn ConnectionProvider>> {
    Err(StoreError::unavailable(format!(
        "cannot connect to {url}: redis support not enabled"
    )))
}
