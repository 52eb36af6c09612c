//! Lookup command implementation.

use redmodel_core::index::unique_key;
use redmodel_core::{EntityId, ModelError, ModelResult, Store, Value};

/// Returns the id stored under the unique key for `field = value`.
///
/// The value is matched as text, which is also how numbers and booleans
/// appear inside unique keys.
pub fn find_owner(
    store: &mut dyn Store,
    entity_type: &str,
    field: &str,
    value: &str,
) -> ModelResult<Option<EntityId>> {
    let key = unique_key(entity_type, field, &Value::from(value));
    match store.get(&key)? {
        None => Ok(None),
        Some(bytes) => EntityId::from_stored(&bytes)
            .map(Some)
            .ok_or_else(|| ModelError::corrupt(&key, "unique key does not hold an id")),
    }
}

/// Runs the lookup command.
pub fn run(
    store: &mut dyn Store,
    entity_type: &str,
    field: &str,
    value: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    match find_owner(store, entity_type, field, value)? {
        Some(id) => println!("{id}"),
        None => return Err(format!("no {entity_type} has {field} = {value}").into()),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use redmodel_core::{FieldDef, RepositoryConfig, Schema};
    use redmodel_testkit::TestRepository;

    #[test]
    fn finds_owner() {
        let users = TestRepository::memory();
        let id = users.add_user("a@x.com", "al");

        let mut conn = users.connection();
        assert_eq!(find_owner(&mut conn, "User", "email", "a@x.com").unwrap(), Some(id));
        assert_eq!(find_owner(&mut conn, "User", "email", "b@x.com").unwrap(), None);
    }

    #[test]
    fn numeric_values_match_as_text() {
        let schema = Schema::builder("Seat")
            .field(FieldDef::new("number").unique())
            .build()
            .unwrap();
        let seats = TestRepository::with_config(schema, RepositoryConfig::default());
        let mut seat = seats.new_entity().with("number", 7i64);
        let id = seats.put(&mut seat).unwrap();

        assert_eq!(
            find_owner(&mut seats.connection(), "Seat", "number", "7").unwrap(),
            Some(id)
        );
    }
}
