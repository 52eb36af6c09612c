//! Store trait definition.

use crate::error::StoreResult;
use std::collections::BTreeSet;

/// One connection to a Redis-like key-value store.
///
/// Stores are **opaque**: keys are strings and values are bytes. redmodel
/// owns every key layout decision; a store only executes commands.
///
/// # Invariants
///
/// - `watch` registers read dependencies on this connection only
/// - `commit` applies a [`WriteBatch`] atomically, or not at all when any
///   watched key changed since it was watched
/// - `commit` and `unwatch` both clear this connection's watches
/// - `incr` is atomic across all connections of the same store
///
/// # Implementors
///
/// - [`super::InMemoryConnection`] - For tests and single-process use
/// - `RedisConnection` - For a Redis server (feature `redis`)
pub trait Store: Send {
    /// Reads a string value.
    ///
    /// # Errors
    ///
    /// Returns an error if the key holds a set or the command fails.
    fn get(&mut self, key: &str) -> StoreResult<Option<Vec<u8>>>;

    /// Writes a string value, replacing whatever the key held.
    ///
    /// # Errors
    ///
    /// Returns an error if the command fails.
    fn set(&mut self, key: &str, value: &[u8]) -> StoreResult<()>;

    /// Deletes keys, reporting for each key whether something was removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the command fails.
    fn delete(&mut self, keys: &[String]) -> StoreResult<Vec<bool>>;

    /// Returns true if the key exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the command fails.
    fn exists(&mut self, key: &str) -> StoreResult<bool>;

    /// Atomically increments an integer counter and returns the new value.
    ///
    /// A missing key counts as zero.
    ///
    /// # Errors
    ///
    /// Returns an error if the key does not hold an integer.
    fn incr(&mut self, key: &str) -> StoreResult<i64>;

    /// Adds members to a set, returning how many were newly added.
    ///
    /// # Errors
    ///
    /// Returns an error if the key holds a string value.
    fn sadd(&mut self, key: &str, members: &[String]) -> StoreResult<u64>;

    /// Returns all members of a set. A missing key is an empty set.
    ///
    /// # Errors
    ///
    /// Returns an error if the key holds a string value.
    fn smembers(&mut self, key: &str) -> StoreResult<BTreeSet<String>>;

    /// Returns every key starting with `prefix`, sorted.
    ///
    /// Meant for offline tooling. On a large keyspace this walks every key.
    ///
    /// # Errors
    ///
    /// Returns an error if the command fails.
    fn keys_with_prefix(&mut self, prefix: &str) -> StoreResult<Vec<String>>;

    /// Starts watching keys for modification by any connection.
    ///
    /// # Errors
    ///
    /// Returns an error if the command fails.
    fn watch(&mut self, keys: &[String]) -> StoreResult<()>;

    /// Forgets every watched key on this connection.
    ///
    /// # Errors
    ///
    /// Returns an error if the command fails.
    fn unwatch(&mut self) -> StoreResult<()>;

    /// Executes a buffered transaction.
    ///
    /// Returns [`CommitOutcome::Conflict`] without applying anything if a
    /// watched key was modified since it was watched.
    ///
    /// # Errors
    ///
    /// Returns an error if the transaction could not be executed at all.
    fn commit(&mut self, batch: WriteBatch) -> StoreResult<CommitOutcome>;
}

impl<S: Store + ?Sized> Store for Box<S> {
    fn get(&mut self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &[u8]) -> StoreResult<()> {
        (**self).set(key, value)
    }

    fn delete(&mut self, keys: &[String]) -> StoreResult<Vec<bool>> {
        (**self).delete(keys)
    }

    fn exists(&mut self, key: &str) -> StoreResult<bool> {
        (**self).exists(key)
    }

    fn incr(&mut self, key: &str) -> StoreResult<i64> {
        (**self).incr(key)
    }

    fn sadd(&mut self, key: &str, members: &[String]) -> StoreResult<u64> {
        (**self).sadd(key, members)
    }

    fn smembers(&mut self, key: &str) -> StoreResult<BTreeSet<String>> {
        (**self).smembers(key)
    }

    fn keys_with_prefix(&mut self, prefix: &str) -> StoreResult<Vec<String>> {
        (**self).keys_with_prefix(prefix)
    }

    fn watch(&mut self, keys: &[String]) -> StoreResult<()> {
        (**self).watch(keys)
    }

    fn unwatch(&mut self) -> StoreResult<()> {
        (**self).unwatch()
    }

    fn commit(&mut self, batch: WriteBatch) -> StoreResult<CommitOutcome> {
        (**self).commit(batch)
    }
}

/// A single buffered write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOp {
    /// Write a string value.
    Set {
        /// Target key.
        key: String,
        /// New value.
        value: Vec<u8>,
    },
    /// Delete one key.
    Delete {
        /// Target key.
        key: String,
    },
    /// Add members to a set.
    SetAdd {
        /// Target key.
        key: String,
        /// Members to add (never empty).
        members: Vec<String>,
    },
}

/// The reply produced by one [`WriteOp`] of a committed batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpReply {
    /// The write was applied.
    Done,
    /// The number of keys or members affected.
    Count(u64),
}

impl OpReply {
    /// Returns true if a counted operation affected nothing.
    #[must_use]
    pub fn is_noop(self) -> bool {
        matches!(self, Self::Count(0))
    }
}

/// Outcome of [`Store::commit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    /// The batch was applied. Replies are in batch order.
    Committed(Vec<OpReply>),
    /// A watched key changed; nothing was applied.
    Conflict,
}

impl CommitOutcome {
    /// Returns true if the batch was applied.
    #[must_use]
    pub fn is_committed(&self) -> bool {
        matches!(self, Self::Committed(_))
    }
}

/// An ordered set of writes applied atomically by [`Store::commit`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteBatch {
    ops: Vec<WriteOp>,
}

impl WriteBatch {
    /// Creates an empty batch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Buffers a string write.
    pub fn set(&mut self, key: impl Into<String>, value: Vec<u8>) -> &mut Self {
        self.ops.push(WriteOp::Set {
            key: key.into(),
            value,
        });
        self
    }

    /// Buffers a single-key delete.
    pub fn delete(&mut self, key: impl Into<String>) -> &mut Self {
        self.ops.push(WriteOp::Delete { key: key.into() });
        self
    }

    /// Buffers a set-add. Nothing is buffered when `members` is empty.
    pub fn sadd<I, M>(&mut self, key: impl Into<String>, members: I) -> &mut Self
    where
        I: IntoIterator<Item = M>,
        M: Into<String>,
    {
        let members: Vec<String> = members.into_iter().map(Into::into).collect();
        if !members.is_empty() {
            self.ops.push(WriteOp::SetAdd {
                key: key.into(),
                members,
            });
        }
        self
    }

    /// Returns the number of buffered writes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Returns true if nothing is buffered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Returns the buffered writes in order.
    #[must_use]
    pub fn ops(&self) -> &[WriteOp] {
        &self.ops
    }

    /// Consumes the batch, returning its writes.
    #[must_use]
    pub fn into_ops(self) -> Vec<WriteOp> {
        self.ops
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_keeps_order() {
        let mut batch = WriteBatch::new();
        batch
            .delete("a")
            .set("b", b"1".to_vec())
            .sadd("c", ["x", "y"]);

        assert_eq!(batch.len(), 3);
        assert_eq!(batch.ops()[0], WriteOp::Delete { key: "a".into() });
        assert!(matches!(batch.ops()[1], WriteOp::Set { .. }));
        assert!(matches!(batch.ops()[2], WriteOp::SetAdd { .. }));
    }

    #[test]
    fn empty_sadd_is_skipped() {
        let mut batch = WriteBatch::new();
        batch.sadd("c", Vec::<String>::new());
        assert!(batch.is_empty());
    }

    #[test]
    fn reply_noop() {
        assert!(OpReply::Count(0).is_noop());
        assert!(!OpReply::Count(1).is_noop());
        assert!(!OpReply::Done.is_noop());
    }
}
