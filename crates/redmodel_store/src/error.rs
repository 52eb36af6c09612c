//! Error types for store operations.

use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur while talking to a store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No connection could be obtained.
    #[error("store unavailable: {message}")]
    Unavailable {
        /// Why the connection failed.
        message: String,
    },

    /// The store rejected a command.
    #[error("store command failed: {message}")]
    Command {
        /// Description of the failure.
        message: String,
    },

    /// A command was applied to a key holding the wrong kind of value.
    #[error("wrong value type at key {key}")]
    WrongType {
        /// The offending key.
        key: String,
    },

    /// A counter key does not hold an integer.
    #[error("value at key {key} is not an integer")]
    NotInteger {
        /// The offending key.
        key: String,
    },
}

impl StoreError {
    /// Creates an unavailable error.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    /// Creates a command error.
    pub fn command(message: impl Into<String>) -> Self {
        Self::Command {
            message: message.into(),
        }
    }

    /// Creates a wrong type error.
    pub fn wrong_type(key: impl Into<String>) -> Self {
        Self::WrongType { key: key.into() }
    }

    /// Returns true if the error means no connection could be made.
    #[must_use]
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable { .. })
    }
}

#[cfg(feature = "redis")]
impl From<::redis::RedisError> for StoreError {
    fn from(err: ::redis::RedisError) -> Self {
        if err.is_io_error() || err.is_connection_refusal() || err.is_connection_dropped() {
            Self::unavailable(err.to_string())
        } else {
            Self::command(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = StoreError::unavailable("connection refused");
        assert_eq!(err.to_string(), "store unavailable: connection refused");
        assert!(err.is_unavailable());

        let err = StoreError::wrong_type("User:1:rks");
        assert!(err.to_string().contains("User:1:rks"));
        assert!(!err.is_unavailable());
    }
}
