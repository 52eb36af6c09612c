//! Benchmark utilities.

use rand::distributions::Alphanumeric;
use rand::Rng;
use redmodel_core::{Entity, FieldDef, Repository, RepositoryConfig, Schema, Value};
use redmodel_store::InMemoryStore;
use std::sync::Arc;

/// `User { email: unique, handle: unique, nickname }`.
///
/// # Panics
///
/// Never; the schema is fixed.
pub fn user_schema() -> Arc<Schema> {
    Arc::new(
        Schema::builder("User")
            .field(FieldDef::new("email").unique())
            .field(FieldDef::new("handle").unique())
            .field(FieldDef::new("nickname").with_default("anon"))
            .build()
            .expect("valid schema"),
    )
}

/// Creates a user repository over a fresh in-memory store.
pub fn memory_repository(config: RepositoryConfig) -> Repository {
    Repository::new(user_schema(), config, Arc::new(InMemoryStore::new()))
}

/// Generates a random alphanumeric token.
pub fn random_token(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

/// Builds an unsaved user with random unique values and `extensions`
/// extra properties.
pub fn random_user(schema: &Arc<Schema>, extensions: usize) -> Entity {
    let token = random_token(12);
    let mut user = Entity::new(Arc::clone(schema))
        .with("email", format!("{token}@example.com"))
        .with("handle", token.clone());
    let mut rng = rand::thread_rng();
    for i in 0..extensions {
        user.set(format!("extra_{i}"), Value::Integer(rng.gen()));
    }
    user
}
