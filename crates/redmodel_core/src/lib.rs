//! # redmodel Core
//!
//! Entity persistence with unique constraints for Redis-style stores.
//!
//! This crate provides:
//! - Schema registration and naming rules
//! - Property extraction into a storable attribute map
//! - Unique-key and reverse-key-set bookkeeping
//! - Optimistic insert, update and delete with conflict retry
//! - The [`Repository`] gateway
//!
//! The store itself never enforces uniqueness. Every write watches the keys
//! it depends on and commits only if none of them changed, so concurrent
//! writers in separate processes stay consistent.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod entity;
mod error;
pub mod index;
mod repository;
mod schema;
pub mod transaction;

pub use config::{RepositoryConfig, RetryPolicy};
pub use entity::{extract, Entity, EntityId, Extraction, ParseEntityIdError};
pub use error::{ModelError, ModelResult, ValidationError};
pub use repository::Repository;
pub use schema::{
    is_storable_extension_name, is_valid_property_name, is_valid_type_name, FieldDef, Schema,
    SchemaBuilder,
};

pub use redmodel_codec::{AttributeMap, Format, Value};
pub use redmodel_store::{ConnectionProvider, InMemoryStore, Store, StoreConfig};
