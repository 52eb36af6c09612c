//! In-memory entity instances.

use super::EntityId;
use crate::schema::Schema;
use redmodel_codec::{AttributeMap, Value};
use std::collections::BTreeMap;
use std::sync::Arc;

/// One instance of a registered entity type.
///
/// Declared fields and extension entries live in separate maps. Setting a
/// name that the schema declares always targets the declared field, so an
/// extension entry can only collide with a declared field when it is
/// inserted through [`Entity::set_extension`].
///
/// Two entities are equal when they share a schema and id and every
/// property resolves to the same value, so a field left at its default
/// equals the same field set explicitly to that default.
#[derive(Debug, Clone)]
pub struct Entity {
    schema: Arc<Schema>,
    id: Option<EntityId>,
    fields: BTreeMap<String, Value>,
    extensions: AttributeMap,
}

impl Entity {
    /// Creates an unsaved entity with every declared field at its default.
    #[must_use]
    pub fn new(schema: Arc<Schema>) -> Self {
        Self {
            schema,
            id: None,
            fields: BTreeMap::new(),
            extensions: AttributeMap::new(),
        }
    }

    /// Rebuilds a saved entity from a decoded attribute map.
    ///
    /// Declared names become explicit field values, including explicit
    /// nulls. Everything else becomes an extension entry.
    #[must_use]
    pub fn from_attributes(schema: Arc<Schema>, id: EntityId, attributes: AttributeMap) -> Self {
        let mut fields = BTreeMap::new();
        let mut extensions = AttributeMap::new();
        for (name, value) in attributes {
            if schema.is_declared(&name) {
                fields.insert(name, value);
            } else {
                extensions.insert(name, value);
            }
        }
        Self {
            schema,
            id: Some(id),
            fields,
            extensions,
        }
    }

    /// Returns the schema.
    #[must_use]
    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// Returns the entity type name.
    #[must_use]
    pub fn entity_type(&self) -> &str {
        self.schema.entity_type()
    }

    /// Returns the id, or `None` if the entity was never saved.
    #[must_use]
    pub fn id(&self) -> Option<EntityId> {
        self.id
    }

    /// Returns true if the entity has an id.
    #[must_use]
    pub fn is_saved(&self) -> bool {
        self.id.is_some()
    }

    pub(crate) fn bind_id(&mut self, id: EntityId) {
        self.id = Some(id);
    }

    pub(crate) fn clear_id(&mut self) {
        self.id = None;
    }

    /// Sets a property. Declared names set the field; other names set an
    /// extension entry.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        let name = name.into();
        if self.schema.is_declared(&name) {
            self.fields.insert(name, value.into());
        } else {
            self.extensions.insert(name, value.into());
        }
        self
    }

    /// Builder form of [`Entity::set`].
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    /// Inserts an extension entry without checking the schema.
    ///
    /// Extraction rejects entries that shadow a declared field.
    pub fn set_extension(&mut self, name: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.extensions.insert(name.into(), value.into());
        self
    }

    /// Returns a property value.
    ///
    /// A declared field that was never set resolves to its default.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        match self.schema.field(name) {
            Some(def) => Some(self.fields.get(name).unwrap_or(def.default_value())),
            None => self.extensions.get(name),
        }
    }

    /// Clears a property: a declared field falls back to its default and an
    /// extension entry is removed. Returns the previous explicit value.
    pub fn unset(&mut self, name: &str) -> Option<Value> {
        if self.schema.is_declared(name) {
            self.fields.remove(name)
        } else {
            self.extensions.remove(name)
        }
    }

    /// Returns the explicitly set declared field values.
    #[must_use]
    pub fn overrides(&self) -> &BTreeMap<String, Value> {
        &self.fields
    }

    /// Returns the extension entries.
    #[must_use]
    pub fn extensions(&self) -> &AttributeMap {
        &self.extensions
    }
}

impl PartialEq for Entity {
    fn eq(&self, other: &Self) -> bool {
        self.schema == other.schema
            && self.id == other.id
            && self.extensions == other.extensions
            && self
                .schema
                .fields()
                .iter()
                .all(|def| self.get(def.name()) == other.get(def.name()))
    }
}
