//! End-to-end repository behavior over the in-memory store.

use redmodel_core::{
    EntityId, FieldDef, Format, ModelError, Repository, RepositoryConfig, Schema, ValidationError,
    Value,
};
use redmodel_store::{InMemoryStore, Store, StoredValue};
use std::collections::BTreeSet;
use std::sync::Arc;

fn user_schema() -> Schema {
    Schema::builder("User")
        .field(FieldDef::new("email").unique())
        .field(FieldDef::new("nickname"))
        .build()
        .unwrap()
}

fn users(store: &InMemoryStore, config: RepositoryConfig) -> Repository {
    Repository::new(user_schema(), config, Arc::new(store.clone()))
}

fn bytes(text: &str) -> StoredValue {
    StoredValue::Bytes(text.as_bytes().to_vec())
}

fn set(members: &[&str]) -> StoredValue {
    StoredValue::Set(members.iter().map(|m| (*m).to_string()).collect::<BTreeSet<_>>())
}

#[test]
fn user_scenario_store_layout() {
    let store = InMemoryStore::new();
    let repo = users(&store, RepositoryConfig::default());

    let mut first = repo.new_entity().with("email", "a@x.com").with("nickname", "al");
    assert_eq!(repo.put(&mut first).unwrap(), EntityId::new(1));

    let dump = store.dump();
    assert_eq!(dump.len(), 4);
    assert_eq!(dump["User:mid"], bytes("1"));
    assert_eq!(dump["User:email:a@x.com"], bytes("1"));
    assert_eq!(dump["User:1:rks"], set(&["User:email:a@x.com"]));
    let StoredValue::Bytes(data) = &dump["User:1"] else {
        panic!("data key is not a string");
    };
    let stored = Format::Json.decode(data).unwrap();
    assert_eq!(stored["email"], Value::from("a@x.com"));
    assert_eq!(stored["nickname"], Value::from("al"));

    let mut second = repo.new_entity().with("email", "a@x.com").with("nickname", "other");
    let err = repo.put(&mut second).unwrap_err();
    assert_eq!(err.violated_field(), Some("email"));
    assert_eq!(second.id(), None);
    assert_eq!(store.dump(), dump);
}

#[test]
fn put_then_get_round_trips() {
    let store = InMemoryStore::new();
    let repo = users(&store, RepositoryConfig::default());

    let mut user = repo
        .new_entity()
        .with("email", "a@x.com")
        .with("age", 31i64)
        .with("score", 2.5)
        .with("tags", vec!["x", "y"]);
    let id = repo.put(&mut user).unwrap();

    let loaded = repo.get(id).unwrap().unwrap();
    assert_eq!(loaded.id(), Some(id));
    assert_eq!(loaded.get("nickname"), Some(&Value::Null));
    assert_eq!(loaded.get("age"), Some(&Value::Integer(31)));
    assert_eq!(loaded.get("score"), Some(&Value::Float(2.5)));
    assert_eq!(loaded, user);
}

#[test]
fn update_moves_unique_value() {
    let store = InMemoryStore::new();
    let repo = users(&store, RepositoryConfig::default());

    let mut user = repo.new_entity().with("email", "v1@x.com");
    let id = repo.put(&mut user).unwrap();

    user.set("email", "v2@x.com");
    assert_eq!(repo.put(&mut user).unwrap(), id);

    assert!(repo.get_by("email", "v1@x.com").unwrap().is_none());
    let found = repo.get_by("email", "v2@x.com").unwrap().unwrap();
    assert_eq!(found.id(), Some(id));
    assert_eq!(store.dump()["User:1:rks"], set(&["User:email:v2@x.com"]));
    assert_eq!(repo.next_id_hint().unwrap(), 1);
}

#[test]
fn update_onto_taken_value_changes_nothing() {
    let store = InMemoryStore::new();
    let repo = users(&store, RepositoryConfig::default());

    let mut a = repo.new_entity().with("email", "a@x.com");
    let mut b = repo.new_entity().with("email", "b@x.com");
    repo.put(&mut a).unwrap();
    repo.put(&mut b).unwrap();
    let before = store.dump();

    b.set("email", "a@x.com");
    let err = repo.put(&mut b).unwrap_err();
    assert!(matches!(err, ModelError::UniquePropertyViolation { ref field } if field == "email"));
    assert_eq!(store.dump(), before);
}

#[test]
fn delete_removes_every_key() {
    let store = InMemoryStore::new();
    let repo = users(&store, RepositoryConfig::new().strict_delete(true));

    let mut user = repo.new_entity().with("email", "a@x.com");
    let id = repo.put(&mut user).unwrap();
    repo.delete(&mut user).unwrap();

    assert_eq!(user.id(), None);
    assert!(repo.get(id).unwrap().is_none());
    assert!(!repo.exists(id).unwrap());
    let keys: Vec<String> = store.dump().into_keys().collect();
    assert_eq!(keys, vec!["User:mid".to_string()]);

    // The value is free again and the new owner gets a fresh id.
    let mut again = repo.new_entity().with("email", "a@x.com");
    assert_eq!(repo.put(&mut again).unwrap(), EntityId::new(2));
}

#[test]
fn delete_unsaved_makes_no_store_calls() {
    let store = InMemoryStore::new();
    let repo = users(&store, RepositoryConfig::default());

    let mut user = repo.new_entity().with("email", "a@x.com");
    let err = repo.delete(&mut user).unwrap_err();
    assert!(matches!(err, ModelError::State { .. }));
    assert_eq!(store.command_count(), 0);
}

#[test]
fn strict_delete_keeps_id_on_integrity_error() {
    let store = InMemoryStore::new();
    let repo = users(&store, RepositoryConfig::new().strict_delete(true));

    let mut user = repo.new_entity().with("email", "a@x.com");
    let id = repo.put(&mut user).unwrap();
    store.connection().delete(&["User:1".to_string()]).unwrap();

    let err = repo.delete(&mut user).unwrap_err();
    assert!(matches!(err, ModelError::Integrity { .. }));
    assert_eq!(user.id(), Some(id));
    assert!(!store.dump().contains_key("User:email:a@x.com"));
}

#[test]
fn validation_errors() {
    let store = InMemoryStore::new();
    let repo = users(&store, RepositoryConfig::default());

    let mut missing = repo.new_entity().with("nickname", "al");
    assert!(matches!(
        repo.put(&mut missing),
        Err(ModelError::Validation(ValidationError::MissingUniqueValue { .. }))
    ));

    let mut private = repo.new_entity().with("email", "a@x.com").with("_secret", 1i64);
    assert!(matches!(
        repo.put(&mut private),
        Err(ModelError::Validation(ValidationError::InvalidName { .. }))
    ));

    let mut shadow = repo.new_entity().with("email", "a@x.com");
    shadow.set_extension("nickname", "x");
    assert!(matches!(
        repo.put(&mut shadow),
        Err(ModelError::Validation(ValidationError::DuplicateProperty { .. }))
    ));

    assert!(matches!(
        repo.get_by("nickname", "al"),
        Err(ModelError::Validation(ValidationError::NotUniqueField { .. }))
    ));
    assert!(store.is_empty());
}

#[test]
fn entity_without_unique_fields() {
    let store = InMemoryStore::new();
    let schema = Schema::builder("Note")
        .field(FieldDef::new("body").with_default(""))
        .build()
        .unwrap();
    let notes = Repository::new(schema, RepositoryConfig::new().strict_delete(true), Arc::new(store.clone()));

    let mut note = notes.new_entity().with("body", "hello");
    let id = notes.put(&mut note).unwrap();
    assert!(!store.dump().contains_key("Note:1:rks"));

    note.set("body", "edited");
    notes.put(&mut note).unwrap();
    assert_eq!(notes.get(id).unwrap().unwrap().get("body"), Some(&Value::from("edited")));

    notes.delete(&mut note).unwrap();
    assert!(!notes.exists(id).unwrap());
}

#[test]
fn multiple_unique_fields() {
    let store = InMemoryStore::new();
    let schema = Schema::builder("Account")
        .field(FieldDef::new("email").unique())
        .field(FieldDef::new("handle").unique())
        .build()
        .unwrap();
    let accounts = Repository::new(schema, RepositoryConfig::default(), Arc::new(store.clone()));

    let mut a = accounts.new_entity().with("email", "a@x.com").with("handle", "al");
    accounts.put(&mut a).unwrap();

    let mut b = accounts.new_entity().with("email", "b@x.com").with("handle", "al");
    let err = accounts.put(&mut b).unwrap_err();
    assert_eq!(err.violated_field(), Some("handle"));

    a.set("handle", "alpha");
    accounts.put(&mut a).unwrap();
    b.set("handle", "al");
    accounts.put(&mut b).unwrap();

    assert_eq!(
        store.dump()["Account:1:rks"],
        set(&["Account:email:a@x.com", "Account:handle:alpha"])
    );
    assert_eq!(accounts.find_id("handle", "al").unwrap(), Some(EntityId::new(2)));
}

#[test]
fn cbor_format_round_trips() {
    let store = InMemoryStore::new();
    let repo = users(&store, RepositoryConfig::new().format(Format::Cbor));

    let mut user = repo.new_entity().with("email", "a@x.com").with("ratio", 0.1);
    let id = repo.put(&mut user).unwrap();

    let StoredValue::Bytes(data) = &store.dump()["User:1"] else {
        panic!("data key is not a string");
    };
    assert!(Format::Json.decode(data).is_err());
    assert_eq!(repo.get(id).unwrap().unwrap(), user);
}

#[test]
fn separate_repositories_share_constraints() {
    let store = InMemoryStore::new();
    let first = users(&store, RepositoryConfig::default());
    let second = users(&store, RepositoryConfig::default());

    let mut a = first.new_entity().with("email", "a@x.com");
    first.put(&mut a).unwrap();

    let mut b = second.new_entity().with("email", "a@x.com");
    assert!(second.put(&mut b).is_err());
    assert!(second.get_by("email", "a@x.com").unwrap().is_some());
}

#[test]
fn numeric_unique_values_share_key_with_lookup() {
    let store = InMemoryStore::new();
    let schema = Schema::builder("Seat")
        .field(FieldDef::new("number").unique())
        .build()
        .unwrap();
    let seats = Repository::new(schema, RepositoryConfig::default(), Arc::new(store.clone()));

    let mut seat = seats.new_entity().with("number", 12i64);
    let id = seats.put(&mut seat).unwrap();

    assert!(store.dump().contains_key("Seat:number:12"));
    assert_eq!(seats.find_id("number", 12i64).unwrap(), Some(id));
}

#[test]
fn float_and_integer_unique_values_are_distinct() {
    let store = InMemoryStore::new();
    let schema = Schema::builder("Seat")
        .field(FieldDef::new("number").unique())
        .build()
        .unwrap();
    let seats = Repository::new(schema, RepositoryConfig::default(), Arc::new(store.clone()));

    let mut whole = seats.new_entity().with("number", 1i64);
    let whole_id = seats.put(&mut whole).unwrap();
    let mut float = seats.new_entity().with("number", 1.0);
    let float_id = seats.put(&mut float).unwrap();

    assert_ne!(whole_id, float_id);
    let dump = store.dump();
    assert_eq!(dump["Seat:number:1"], bytes(&whole_id.to_string()));
    assert_eq!(dump["Seat:number:1.0"], bytes(&float_id.to_string()));

    let loaded = seats.get_by("number", 1.0).unwrap().unwrap();
    assert_eq!(loaded.id(), Some(float_id));
    assert_eq!(loaded.get("number"), Some(&Value::Float(1.0)));
}
