//! # redmodel Store
//!
//! Key-value store primitives and connection providers for redmodel.
//!
//! This crate is the lowest layer of redmodel. A [`Store`] is one
//! connection to a Redis-like key-value store exposing plain string
//! commands, set commands, an atomic counter, and optimistic transactions
//! (`watch` followed by a buffered [`WriteBatch`] that either commits
//! atomically or reports a [`CommitOutcome::Conflict`]).
//!
//! ## Design Principles
//!
//! - Stores are opaque: they never interpret keys or values
//! - A conflict is an outcome, not an error
//! - Watches belong to a single connection, as in Redis
//! - Providers hand out one connection per operation
//!
//! ## Available Stores
//!
//! - [`InMemoryStore`] - Shared in-process keyspace with real watch semantics
//! - `RedisProvider` - Redis server connections (feature `redis`)
//!
//! ## Example
//!
//! ```rust
//! use redmodel_store::{CommitOutcome, ConnectionProvider, InMemoryStore, WriteBatch};
//!
//! let store = InMemoryStore::new();
//! let mut conn = store.connect("User").unwrap();
//!
//! conn.watch(&["User:email:a@x.com".to_string()]).unwrap();
//! let mut batch = WriteBatch::new();
//! batch.set("User:email:a@x.com", b"1".to_vec());
//! assert!(matches!(conn.commit(batch).unwrap(), CommitOutcome::Committed(_)));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod error;
mod memory;
mod provider;
#[cfg(feature = "redis")]
mod redis_store;

pub use backend::{CommitOutcome, OpReply, Store, WriteBatch, WriteOp};
pub use error::{StoreError, StoreResult};
pub use memory::{InMemoryConnection, InMemoryStore, StoredValue};
pub use provider::{ConnectionProvider, FnProvider, StoreConfig, DEFAULT_REDIS_URL};
#[cfg(feature = "redis")]
pub use redis_store::{RedisConnection, RedisProvider};
