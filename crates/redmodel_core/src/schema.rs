//! Entity schemas and naming rules.
//!
//! A [`Schema`] is registered once at startup with [`Schema::builder`].
//! Registration validates every declared name, so a schema that exists is
//! always well formed.

use crate::error::ValidationError;
use redmodel_codec::Value;
use regex::Regex;
use std::sync::LazyLock;

static PROPERTY_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid property regex"));

static TYPE_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_]*$").expect("valid type regex"));

static NULL: Value = Value::Null;

/// Returns true if `name` may name a property.
#[must_use]
pub fn is_valid_property_name(name: &str) -> bool {
    PROPERTY_NAME.is_match(name)
}

/// Returns true if `name` may name an extension entry: a valid property
/// name that does not start with `_`.
#[must_use]
pub fn is_storable_extension_name(name: &str) -> bool {
    is_valid_property_name(name) && !name.starts_with('_')
}

/// Returns true if `name` may name an entity type.
#[must_use]
pub fn is_valid_type_name(name: &str) -> bool {
    TYPE_NAME.is_match(name)
}

/// A declared field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDef {
    name: String,
    unique: bool,
    default: Option<Value>,
}

impl FieldDef {
    /// Declares a non-unique field with no default.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            unique: false,
            default: None,
        }
    }

    /// Marks the field unique.
    #[must_use]
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Sets the value used when an entity does not set this field.
    #[must_use]
    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Returns the field name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns true if the field is unique.
    #[must_use]
    pub fn is_unique(&self) -> bool {
        self.unique
    }

    /// Returns the default value, or null if none was declared.
    #[must_use]
    pub fn default_value(&self) -> &Value {
        self.default.as_ref().unwrap_or(&NULL)
    }
}

/// An entity type: its name and its ordered declared fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    entity_type: String,
    fields: Vec<FieldDef>,
}

impl Schema {
    /// Starts registering a schema for `entity_type`.
    pub fn builder(entity_type: impl Into<String>) -> SchemaBuilder {
        SchemaBuilder {
            entity_type: entity_type.into(),
            fields: Vec::new(),
        }
    }

    /// Returns the entity type name.
    #[must_use]
    pub fn entity_type(&self) -> &str {
        &self.entity_type
    }

    /// Returns the declared fields in declaration order.
    #[must_use]
    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }

    /// Looks up a declared field.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Returns true if `name` is a declared field.
    #[must_use]
    pub fn is_declared(&self, name: &str) -> bool {
        self.field(name).is_some()
    }

    /// Returns the unique fields in declaration order.
    pub fn unique_fields(&self) -> impl Iterator<Item = &FieldDef> {
        self.fields.iter().filter(|f| f.unique)
    }

    /// Returns the declared unique field called `name`.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::NotUniqueField`] if `name` is not declared
    /// or not unique.
    pub fn unique_field(&self, name: &str) -> Result<&FieldDef, ValidationError> {
        self.field(name)
            .filter(|f| f.unique)
            .ok_or_else(|| ValidationError::NotUniqueField {
                entity_type: self.entity_type.clone(),
                field: name.to_string(),
            })
    }
}

/// Collects declared fields for [`Schema::builder`].
#[derive(Debug, Clone)]
pub struct SchemaBuilder {
    entity_type: String,
    fields: Vec<FieldDef>,
}

impl SchemaBuilder {
    /// Declares a field.
    #[must_use]
    pub fn field(mut self, field: FieldDef) -> Self {
        self.fields.push(field);
        self
    }

    /// Validates and registers the schema.
    ///
    /// # Errors
    ///
    /// - [`ValidationError::InvalidTypeName`] for a bad type name
    /// - [`ValidationError::InvalidName`] for a bad field name
    /// - [`ValidationError::DuplicateProperty`] for a field declared twice
    pub fn build(self) -> Result<Schema, ValidationError> {
        if !is_valid_type_name(&self.entity_type) {
            return Err(ValidationError::InvalidTypeName {
                name: self.entity_type,
            });
        }

        for (i, field) in self.fields.iter().enumerate() {
            if self.fields[..i].iter().any(|f| f.name == field.name) {
                return Err(ValidationError::DuplicateProperty {
                    entity_type: self.entity_type.clone(),
                    name: field.name.clone(),
                });
            }
            if !is_valid_property_name(&field.name) {
                return Err(ValidationError::InvalidName {
                    entity_type: self.entity_type.clone(),
                    name: field.name.clone(),
                });
            }
        }

        Ok(Schema {
            entity_type: self.entity_type,
            fields: self.fields,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> Schema {
        Schema::builder("User")
            .field(FieldDef::new("email").unique())
            .field(FieldDef::new("nickname").with_default("anon"))
            .build()
            .unwrap()
    }

    #[test]
    fn property_names() {
        assert!(is_valid_property_name("email"));
        assert!(is_valid_property_name("_private"));
        assert!(is_valid_property_name("a1_b2"));
        assert!(!is_valid_property_name(""));
        assert!(!is_valid_property_name("1st"));
        assert!(!is_valid_property_name("has-dash"));
        assert!(!is_valid_property_name("has:colon"));
    }

    #[test]
    fn extension_names() {
        assert!(is_storable_extension_name("bio"));
        assert!(!is_storable_extension_name("_cache"));
        assert!(!is_storable_extension_name("bad name"));
    }

    #[test]
    fn type_names() {
        assert!(is_valid_type_name("User"));
        assert!(is_valid_type_name("user_v2"));
        assert!(!is_valid_type_name("_User"));
        assert!(!is_valid_type_name("9Lives"));
        assert!(!is_valid_type_name("User:1"));
    }

    #[test]
    fn schema_lookup() {
        let schema = user();
        assert_eq!(schema.entity_type(), "User");
        assert_eq!(schema.fields().len(), 2);
        assert!(schema.is_declared("email"));
        assert!(!schema.is_declared("bio"));
        assert_eq!(schema.unique_fields().count(), 1);
        assert_eq!(schema.field("nickname").unwrap().default_value(), &Value::from("anon"));
        assert_eq!(schema.field("email").unwrap().default_value(), &Value::Null);
    }

    #[test]
    fn unique_field_lookup() {
        let schema = user();
        assert!(schema.unique_field("email").is_ok());
        assert!(matches!(
            schema.unique_field("nickname"),
            Err(ValidationError::NotUniqueField { .. })
        ));
        assert!(schema.unique_field("missing").is_err());
    }

    #[test]
    fn duplicate_field_rejected() {
        let err = Schema::builder("User")
            .field(FieldDef::new("email"))
            .field(FieldDef::new("email").unique())
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            ValidationError::DuplicateProperty {
                entity_type: "User".into(),
                name: "email".into()
            }
        );
    }

    #[test]
    fn invalid_field_rejected() {
        let err = Schema::builder("User")
            .field(FieldDef::new("e-mail"))
            .build()
            .unwrap_err();
        assert!(matches!(err, ValidationError::InvalidName { .. }));
    }

    #[test]
    fn invalid_type_rejected() {
        let err = Schema::builder("User:admin").build().unwrap_err();
        assert!(matches!(err, ValidationError::InvalidTypeName { .. }));
    }

    #[test]
    fn schema_without_fields_is_valid() {
        let schema = Schema::builder("Note").build().unwrap();
        assert!(schema.fields().is_empty());
    }
}
