//! Test fixtures and repository helpers.
//!
//! Provides ready-made schemas and repositories over a fresh in-memory
//! store, so tests can inspect the raw keyspace next to the repository.

use redmodel_core::{EntityId, FieldDef, Repository, RepositoryConfig, Schema};
use redmodel_store::{InMemoryConnection, InMemoryStore, StoredValue};
use std::collections::BTreeMap;
use std::sync::Arc;

/// `User { email: unique, nickname }`.
pub fn user_schema() -> Schema {
    Schema::builder("User")
        .field(FieldDef::new("email").unique())
        .field(FieldDef::new("nickname"))
        .build()
        .expect("user schema is valid")
}

/// `Account { email: unique, handle: unique, plan = "free" }`.
pub fn account_schema() -> Schema {
    Schema::builder("Account")
        .field(FieldDef::new("email").unique())
        .field(FieldDef::new("handle").unique())
        .field(FieldDef::new("plan").with_default("free"))
        .build()
        .expect("account schema is valid")
}

/// A repository over its own in-memory store.
pub struct TestRepository {
    /// The repository.
    pub repo: Repository,
    store: InMemoryStore,
}

impl TestRepository {
    /// Creates a `User` repository with default configuration.
    pub fn memory() -> Self {
        Self::with_config(user_schema(), RepositoryConfig::default())
    }

    /// Creates a `User` repository with strict deletes.
    pub fn strict() -> Self {
        Self::with_config(user_schema(), RepositoryConfig::new().strict_delete(true))
    }

    /// Creates a repository for any schema and configuration.
    pub fn with_config(schema: Schema, config: RepositoryConfig) -> Self {
        let store = InMemoryStore::new();
        let repo = Repository::new(schema, config, Arc::new(store.clone()));
        Self { repo, store }
    }

    /// Returns a second repository sharing this store, as another process
    /// would.
    pub fn peer(&self) -> Repository {
        self.repo.clone()
    }

    /// Returns the backing store.
    pub fn store(&self) -> &InMemoryStore {
        &self.store
    }

    /// Opens a raw connection to the backing store.
    pub fn connection(&self) -> InMemoryConnection {
        self.store.connection()
    }

    /// Returns a snapshot of every key.
    pub fn dump(&self) -> BTreeMap<String, StoredValue> {
        self.store.dump()
    }

    /// Saves a new user and returns its id.
    ///
    /// # Panics
    ///
    /// Panics if the save fails.
    pub fn add_user(&self, email: &str, nickname: &str) -> EntityId {
        let mut user = self
            .repo
            .new_entity()
            .with("email", email)
            .with("nickname", nickname);
        self.repo.put(&mut user).expect("failed to save user")
    }
}

impl std::ops::Deref for TestRepository {
    type Target = Repository;

    fn deref(&self) -> &Self::Target {
        &self.repo
    }
}

/// Runs a test with a fresh `User` repository.
///
/// # Example
///
/// ```rust
/// use redmodel_testkit::with_users;
///
/// with_users(|users| {
///     let id = users.add_user("a@x.com", "al");
///     assert!(users.exists(id).unwrap());
/// });
/// ```
pub fn with_users<F, R>(f: F) -> R
where
    F: FnOnce(&TestRepository) -> R,
{
    let users = TestRepository::memory();
    f(&users)
}

/// Builds a bytes value for comparing against [`TestRepository::dump`].
pub fn stored_bytes(value: &str) -> StoredValue {
    StoredValue::Bytes(value.as_bytes().to_vec())
}

/// Builds a set value for comparing against [`TestRepository::dump`].
pub fn stored_set(members: &[&str]) -> StoredValue {
    StoredValue::Set(members.iter().map(|m| (*m).to_string()).collect())
}

/// Test scenario helpers.
pub mod scenarios {
    use super::*;

    /// Creates a `User` repository holding `count` users with emails
    /// `user{i}@example.com`.
    pub fn populated_users(count: usize) -> (TestRepository, Vec<EntityId>) {
        let users = TestRepository::memory();
        let ids = (0..count)
            .map(|i| users.add_user(&format!("user{i}@example.com"), &format!("user{i}")))
            .collect();
        (users, ids)
    }
}
