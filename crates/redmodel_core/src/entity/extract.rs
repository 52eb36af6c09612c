//! Property extraction.

use super::Entity;
use crate::error::ValidationError;
use crate::index::UniqueKey;
use crate::schema::is_storable_extension_name;
use redmodel_codec::{AttributeMap, Value};

/// The persisted form of one entity state.
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    /// Every stored property: declared fields then non-null extensions.
    pub attributes: AttributeMap,
    /// Unique keys claimed by this state, in field declaration order.
    pub unique_keys: Vec<UniqueKey>,
}

impl Extraction {
    /// Returns the unique key strings, in order.
    #[must_use]
    pub fn key_strings(&self) -> Vec<String> {
        self.unique_keys.iter().map(|k| k.key().to_owned()).collect()
    }
}

/// Builds the attribute map and unique keys for `entity`.
///
/// The result depends only on the entity state, so a retried commit can
/// reuse it.
///
/// # Errors
///
/// - [`ValidationError::MissingUniqueValue`] if a unique field resolves to null
/// - [`ValidationError::DuplicateProperty`] if an extension shadows a declared field
/// - [`ValidationError::InvalidName`] if an extension name is not storable
pub fn extract(entity: &Entity) -> Result<Extraction, ValidationError> {
    let schema = entity.schema();
    let entity_type = schema.entity_type();

    let mut attributes = AttributeMap::new();
    let mut unique_keys = Vec::new();

    for def in schema.fields() {
        let value = entity.get(def.name()).cloned().unwrap_or(Value::Null);
        if def.is_unique() {
            if value.is_null() {
                return Err(ValidationError::MissingUniqueValue {
                    entity_type: entity_type.to_owned(),
                    field: def.name().to_owned(),
                });
            }
            unique_keys.push(UniqueKey::new(entity_type, def.name(), &value));
        }
        attributes.insert(def.name().to_owned(), value);
    }

    for (name, value) in entity.extensions() {
        if schema.is_declared(name) {
            return Err(ValidationError::DuplicateProperty {
                entity_type: entity_type.to_owned(),
                name: name.clone(),
            });
        }
        if !is_storable_extension_name(name) {
            return Err(ValidationError::InvalidName {
                entity_type: entity_type.to_owned(),
                name: name.clone(),
            });
        }
        if value.is_null() {
            continue;
        }
        attributes.insert(name.clone(), value.clone());
    }

    Ok(Extraction {
        attributes,
        unique_keys,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FieldDef, Schema};
    use std::sync::Arc;

    fn schema() -> Arc<Schema> {
        Arc::new(
            Schema::builder("User")
                .field(FieldDef::new("email").unique())
                .field(FieldDef::new("handle").unique())
                .field(FieldDef::new("nickname"))
                .build()
                .unwrap(),
        )
    }

    fn user() -> Entity {
        Entity::new(schema())
            .with("email", "a@x.com")
            .with("handle", "al")
    }

    #[test]
    fn declared_fields_and_keys() {
        let extraction = extract(&user()).unwrap();

        assert_eq!(extraction.attributes.len(), 3);
        assert_eq!(extraction.attributes["nickname"], Value::Null);
        assert_eq!(
            extraction.key_strings(),
            vec!["User:email:a@x.com".to_string(), "User:handle:al".to_string()]
        );
        assert_eq!(extraction.unique_keys[1].field(), "handle");
    }

    #[test]
    fn null_unique_field_rejected() {
        let entity = Entity::new(schema()).with("email", "a@x.com");
        let err = extract(&entity).unwrap_err();
        assert_eq!(
            err,
            ValidationError::MissingUniqueValue {
                entity_type: "User".into(),
                field: "handle".into()
            }
        );
    }

    #[test]
    fn extension_entries_are_stored() {
        let entity = user().with("age", 30i64).with("tags", vec!["a", "b"]);
        let extraction = extract(&entity).unwrap();
        assert_eq!(extraction.attributes["age"], Value::from(30i64));
        assert_eq!(extraction.attributes.len(), 5);
        assert_eq!(extraction.unique_keys.len(), 2);
    }

    #[test]
    fn null_extension_is_skipped() {
        let entity = user().with("bio", Value::Null);
        let extraction = extract(&entity).unwrap();
        assert!(!extraction.attributes.contains_key("bio"));
    }

    #[test]
    fn shadowing_extension_rejected() {
        let mut entity = user();
        entity.set_extension("nickname", "x");
        assert!(matches!(
            extract(&entity),
            Err(ValidationError::DuplicateProperty { .. })
        ));
    }

    #[test]
    fn bad_extension_names_rejected() {
        for name in ["_cache", "has-dash", "1st", ""] {
            let entity = user().with(name, "x");
            assert!(
                matches!(extract(&entity), Err(ValidationError::InvalidName { .. })),
                "{name} should be rejected"
            );
        }
    }

    #[test]
    fn extraction_is_deterministic() {
        let entity = user().with("z", 1i64).with("a", 2i64);
        assert_eq!(extract(&entity).unwrap(), extract(&entity).unwrap());
    }

    #[test]
    fn non_text_unique_values_render_in_keys() {
        let schema = Arc::new(
            Schema::builder("Seat")
                .field(FieldDef::new("number").unique())
                .build()
                .unwrap(),
        );
        let entity = Entity::new(schema).with("number", 12i64);
        assert_eq!(extract(&entity).unwrap().key_strings(), vec!["Seat:number:12"]);
    }
}
