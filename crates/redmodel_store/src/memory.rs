//! In-memory store with Redis-style optimistic transactions.

use crate::backend::{CommitOutcome, OpReply, Store, WriteBatch, WriteOp};
use crate::error::{StoreError, StoreResult};
use parking_lot::Mutex;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// A value held by an [`InMemoryStore`] key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoredValue {
    /// A string (byte) value.
    Bytes(Vec<u8>),
    /// A set of strings.
    Set(BTreeSet<String>),
}

impl StoredValue {
    fn is_set(&self) -> bool {
        matches!(self, Self::Set(_))
    }
}

/// Shared keyspace. Every modification stamps the key with a fresh version
/// from `clock`; watches compare these stamps at commit time.
#[derive(Debug, Default)]
struct Keyspace {
    values: HashMap<String, StoredValue>,
    versions: HashMap<String, u64>,
    clock: u64,
}

impl Keyspace {
    fn touch(&mut self, key: &str) {
        self.clock += 1;
        self.versions.insert(key.to_owned(), self.clock);
    }

    fn version(&self, key: &str) -> u64 {
        self.versions.get(key).copied().unwrap_or(0)
    }

    fn remove(&mut self, key: &str) -> bool {
        let removed = self.values.remove(key).is_some();
        if removed {
            self.touch(key);
        }
        removed
    }

    fn sadd(&mut self, key: &str, members: &[String]) -> StoreResult<u64> {
        let entry = self
            .values
            .entry(key.to_owned())
            .or_insert_with(|| StoredValue::Set(BTreeSet::new()));
        let StoredValue::Set(set) = entry else {
            return Err(StoreError::wrong_type(key));
        };
        let added = members
            .iter()
            .filter(|member| set.insert((*member).clone()))
            .count() as u64;
        if added > 0 {
            self.touch(key);
        }
        Ok(added)
    }

    /// Rejects a batch that would apply a set command to a string key,
    /// taking earlier writes in the same batch into account.
    fn check_types(&self, ops: &[WriteOp]) -> StoreResult<()> {
        let mut pending: HashMap<&str, Option<bool>> = HashMap::new();
        for op in ops {
            match op {
                WriteOp::Set { key, .. } => {
                    pending.insert(key, Some(false));
                }
                WriteOp::Delete { key } => {
                    pending.insert(key, None);
                }
                WriteOp::SetAdd { key, .. } => {
                    let is_set = match pending.get(key.as_str()) {
                        Some(kind) => *kind,
                        None => self.values.get(key).map(StoredValue::is_set),
                    };
                    if is_set == Some(false) {
                        return Err(StoreError::wrong_type(key));
                    }
                    pending.insert(key, Some(true));
                }
            }
        }
        Ok(())
    }

    fn apply(&mut self, op: WriteOp) -> StoreResult<OpReply> {
        match op {
            WriteOp::Set { key, value } => {
                self.values.insert(key.clone(), StoredValue::Bytes(value));
                self.touch(&key);
                Ok(OpReply::Done)
            }
            WriteOp::Delete { key } => Ok(OpReply::Count(u64::from(self.remove(&key)))),
            WriteOp::SetAdd { key, members } => Ok(OpReply::Count(self.sadd(&key, &members)?)),
        }
    }
}

/// A shared in-process key-value store.
///
/// Cloning an `InMemoryStore` yields another handle to the same keyspace.
/// Each [`InMemoryConnection`] keeps its own watch list, so several
/// connections (one per thread) reproduce the optimistic-concurrency
/// behavior of independent Redis clients.
///
/// # Example
///
/// ```rust
/// use redmodel_store::{ConnectionProvider, InMemoryStore};
///
/// let store = InMemoryStore::new();
/// let mut conn = store.connect("User").unwrap();
/// assert_eq!(conn.incr("User:mid").unwrap(), 1);
/// assert_eq!(conn.incr("User:mid").unwrap(), 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    keyspace: Arc<Mutex<Keyspace>>,
    commands: Arc<AtomicU64>,
}

impl InMemoryStore {
    /// Creates a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a new connection with an empty watch list.
    #[must_use]
    pub fn connection(&self) -> InMemoryConnection {
        InMemoryConnection {
            keyspace: Arc::clone(&self.keyspace),
            commands: Arc::clone(&self.commands),
            watched: HashMap::new(),
        }
    }

    /// Returns a copy of every key and value.
    #[must_use]
    pub fn dump(&self) -> BTreeMap<String, StoredValue> {
        self.keyspace
            .lock()
            .values
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Returns the number of keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.keyspace.lock().values.len()
    }

    /// Returns true if the store holds no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the number of commands executed through all connections.
    #[must_use]
    pub fn command_count(&self) -> u64 {
        self.commands.load(Ordering::SeqCst)
    }
}

/// One connection to an [`InMemoryStore`].
#[derive(Debug)]
pub struct InMemoryConnection {
    keyspace: Arc<Mutex<Keyspace>>,
    commands: Arc<AtomicU64>,
    /// Watched key -> version observed when the watch began.
    watched: HashMap<String, u64>,
}

impl InMemoryConnection {
    fn count(&self) {
        self.commands.fetch_add(1, Ordering::SeqCst);
    }

    /// Returns the keys currently watched by this connection.
    #[must_use]
    pub fn watched_keys(&self) -> BTreeSet<String> {
        self.watched.keys().cloned().collect()
    }
}

impl Store for InMemoryConnection {
    fn get(&mut self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        self.count();
        match self.keyspace.lock().values.get(key) {
            Some(StoredValue::Bytes(bytes)) => Ok(Some(bytes.clone())),
            Some(StoredValue::Set(_)) => Err(StoreError::wrong_type(key)),
            None => Ok(None),
        }
    }

    fn set(&mut self, key: &str, value: &[u8]) -> StoreResult<()> {
        self.count();
        let mut keyspace = self.keyspace.lock();
        keyspace
            .values
            .insert(key.to_owned(), StoredValue::Bytes(value.to_vec()));
        keyspace.touch(key);
        Ok(())
    }

    fn delete(&mut self, keys: &[String]) -> StoreResult<Vec<bool>> {
        self.count();
        let mut keyspace = self.keyspace.lock();
        Ok(keys.iter().map(|key| keyspace.remove(key)).collect())
    }

    fn exists(&mut self, key: &str) -> StoreResult<bool> {
        self.count();
        Ok(self.keyspace.lock().values.contains_key(key))
    }

    fn incr(&mut self, key: &str) -> StoreResult<i64> {
        self.count();
        let mut keyspace = self.keyspace.lock();
        let current = match keyspace.values.get(key) {
            None => 0,
            Some(StoredValue::Bytes(bytes)) => std::str::from_utf8(bytes)
                .ok()
                .and_then(|text| text.parse::<i64>().ok())
                .ok_or_else(|| StoreError::NotInteger {
                    key: key.to_owned(),
                })?,
            Some(StoredValue::Set(_)) => return Err(StoreError::wrong_type(key)),
        };
        let next = current.checked_add(1).ok_or_else(|| StoreError::NotInteger {
            key: key.to_owned(),
        })?;
        keyspace
            .values
            .insert(key.to_owned(), StoredValue::Bytes(next.to_string().into_bytes()));
        keyspace.touch(key);
        Ok(next)
    }

    fn sadd(&mut self, key: &str, members: &[String]) -> StoreResult<u64> {
        self.count();
        self.keyspace.lock().sadd(key, members)
    }

    fn smembers(&mut self, key: &str) -> StoreResult<BTreeSet<String>> {
        self.count();
        match self.keyspace.lock().values.get(key) {
            Some(StoredValue::Set(set)) => Ok(set.clone()),
            Some(StoredValue::Bytes(_)) => Err(StoreError::wrong_type(key)),
            None => Ok(BTreeSet::new()),
        }
    }

    fn keys_with_prefix(&mut self, prefix: &str) -> StoreResult<Vec<String>> {
        self.count();
        let mut keys: Vec<String> = self
            .keyspace
            .lock()
            .values
            .keys()
            .filter(|key| key.starts_with(prefix))
            .cloned()
            .collect();
        keys.sort();
        Ok(keys)
    }

    fn watch(&mut self, keys: &[String]) -> StoreResult<()> {
        self.count();
        let keyspace = self.keyspace.lock();
        for key in keys {
            // Re-watching keeps the original observation, as Redis does.
            self.watched
                .entry(key.clone())
                .or_insert_with(|| keyspace.version(key));
        }
        Ok(())
    }

    fn unwatch(&mut self) -> StoreResult<()> {
        self.count();
        self.watched.clear();
        Ok(())
    }

    fn commit(&mut self, batch: WriteBatch) -> StoreResult<CommitOutcome> {
        self.count();
        let watched = std::mem::take(&mut self.watched);
        let mut keyspace = self.keyspace.lock();

        let conflicted = watched
            .iter()
            .any(|(key, seen)| keyspace.version(key) != *seen);
        if conflicted {
            return Ok(CommitOutcome::Conflict);
        }

        keyspace.check_types(batch.ops())?;
        let mut replies = Vec::with_capacity(batch.len());
        for op in batch.into_ops() {
            replies.push(keyspace.apply(op)?);
        }
        Ok(CommitOutcome::Committed(replies))
    }
}
