//! Error types for redmodel core.

use redmodel_codec::CodecError;
use redmodel_store::StoreError;
use thiserror::Error;

/// Result type for core operations.
pub type ModelResult<T> = Result<T, ModelError>;

/// A schema or entity failed validation. Always raised before any store
/// mutation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A field or extension name breaks the naming rules.
    #[error("invalid property name: {entity_type}.{name}")]
    InvalidName {
        /// The entity type.
        entity_type: String,
        /// The offending name.
        name: String,
    },

    /// An entity type name breaks the naming rules.
    #[error("invalid entity type name: {name}")]
    InvalidTypeName {
        /// The offending name.
        name: String,
    },

    /// A name is declared twice, or an extension shadows a declared field.
    #[error("duplicate property name: {entity_type}.{name}")]
    DuplicateProperty {
        /// The entity type.
        entity_type: String,
        /// The duplicated name.
        name: String,
    },

    /// A unique field resolved to null.
    #[error("unique property {entity_type}.{field} cannot be null")]
    MissingUniqueValue {
        /// The entity type.
        entity_type: String,
        /// The unique field.
        field: String,
    },

    /// A lookup named a field that is not declared unique.
    #[error("{entity_type}.{field} is not a unique property")]
    NotUniqueField {
        /// The entity type.
        entity_type: String,
        /// The field used for lookup.
        field: String,
    },
}

/// Errors that can occur in redmodel operations.
#[derive(Debug, Error)]
pub enum ModelError {
    /// Schema or entity validation failed.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Another entity already claims this unique value.
    #[error("unique property violation: {field}")]
    UniquePropertyViolation {
        /// The unique field whose value is taken.
        field: String,
    },

    /// Operation not permitted in the entity's lifecycle state.
    #[error("invalid entity state: {message}")]
    State {
        /// Description of why the operation is invalid.
        message: String,
    },

    /// No store connection could be obtained.
    #[error("store unavailable: {message}")]
    StoreUnavailable {
        /// Why the connection failed.
        message: String,
    },

    /// A strict delete removed less than the reverse key set promised.
    #[error("integrity error: {message}")]
    Integrity {
        /// What was found orphaned.
        message: String,
    },

    /// A bounded retry policy ran out of attempts.
    #[error("gave up after {attempts} conflicting attempts")]
    Contention {
        /// Attempts made.
        attempts: u32,
    },

    /// Store command error.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Serialization error.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    /// A stored value could not be interpreted.
    #[error("corrupt data at {key}: {message}")]
    CorruptData {
        /// The key holding the value.
        key: String,
        /// What was wrong with it.
        message: String,
    },
}

impl ModelError {
    /// Creates a unique property violation error.
    pub fn unique_violation(field: impl Into<String>) -> Self {
        Self::UniquePropertyViolation {
            field: field.into(),
        }
    }

    /// Creates an invalid state error.
    pub fn state(message: impl Into<String>) -> Self {
        Self::State {
            message: message.into(),
        }
    }

    /// Creates an integrity error.
    pub fn integrity(message: impl Into<String>) -> Self {
        Self::Integrity {
            message: message.into(),
        }
    }

    /// Creates a corrupt data error.
    pub fn corrupt(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::CorruptData {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Maps a failure to obtain a connection. Command errors stay
    /// [`ModelError::Store`].
    pub fn from_connect(err: StoreError) -> Self {
        match err {
            StoreError::Unavailable { message } => Self::StoreUnavailable { message },
            other => Self::StoreUnavailable {
                message: other.to_string(),
            },
        }
    }

    /// Returns the field name for a unique property violation.
    #[must_use]
    pub fn violated_field(&self) -> Option<&str> {
        match self {
            Self::UniquePropertyViolation { field } => Some(field),
            _ => None,
        }
    }
}
