//! Redis-backed store.

use crate::backend::{CommitOutcome, OpReply, Store, WriteBatch, WriteOp};
use crate::error::{StoreError, StoreResult};
use crate::provider::ConnectionProvider;
use redis::Commands;
use std::collections::BTreeSet;
use std::fmt;

/// Escapes the characters SCAN MATCH treats as glob syntax.
fn escape_glob(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '*' | '?' | '[' | ']' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Opens a new Redis connection for every request.
pub struct RedisProvider {
    client: redis::Client,
}

impl RedisProvider {
    /// Creates a provider for the given Redis URL.
    ///
    /// The URL is validated here; no connection is made until
    /// [`ConnectionProvider::connect`] is called.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] if the URL is invalid.
    pub fn open(url: &str) -> StoreResult<Self> {
        let client = redis::Client::open(url)
            .map_err(|e| StoreError::unavailable(format!("invalid redis url {url}: {e}")))?;
        Ok(Self { client })
    }
}

impl fmt::Debug for RedisProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisProvider").finish_non_exhaustive()
    }
}

impl ConnectionProvider for RedisProvider {
    fn connect(&self, entity_type: &str) -> StoreResult<Box<dyn Store>> {
        let conn = self.client.get_connection().map_err(|e| {
            StoreError::unavailable(format!("cannot connect for {entity_type}: {e}"))
        })?;
        tracing::debug!(entity_type, "opened redis connection");
        Ok(Box::new(RedisConnection { conn }))
    }
}

/// One Redis connection. Watches are tied to this connection.
pub struct RedisConnection {
    conn: redis::Connection,
}

impl RedisConnection {
    /// Wraps an existing Redis connection.
    #[must_use]
    pub fn new(conn: redis::Connection) -> Self {
        Self { conn }
    }
}

impl fmt::Debug for RedisConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisConnection").finish_non_exhaustive()
    }
}

impl Store for RedisConnection {
    fn get(&mut self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        Ok(redis::cmd("GET").arg(key).query(&mut self.conn)?)
    }

    fn set(&mut self, key: &str, value: &[u8]) -> StoreResult<()> {
        redis::cmd("SET")
            .arg(key)
            .arg(value)
            .query::<()>(&mut self.conn)?;
        Ok(())
    }

    fn delete(&mut self, keys: &[String]) -> StoreResult<Vec<bool>> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }
        // One DEL per key so each key reports its own result.
        let mut pipe = redis::pipe();
        for key in keys {
            pipe.cmd("DEL").arg(key);
        }
        let counts: Vec<u64> = pipe.query(&mut self.conn)?;
        Ok(counts.into_iter().map(|n| n > 0).collect())
    }

    fn exists(&mut self, key: &str) -> StoreResult<bool> {
        Ok(redis::cmd("EXISTS").arg(key).query(&mut self.conn)?)
    }

    fn incr(&mut self, key: &str) -> StoreResult<i64> {
        redis::cmd("INCR")
            .arg(key)
            .query(&mut self.conn)
            .map_err(|e| {
                if e.kind() == redis::ErrorKind::ResponseError {
                    StoreError::NotInteger {
                        key: key.to_owned(),
                    }
                } else {
                    StoreError::from(e)
                }
            })
    }

    fn sadd(&mut self, key: &str, members: &[String]) -> StoreResult<u64> {
        if members.is_empty() {
            return Ok(0);
        }
        Ok(redis::cmd("SADD")
            .arg(key)
            .arg(members)
            .query(&mut self.conn)?)
    }

    fn smembers(&mut self, key: &str) -> StoreResult<BTreeSet<String>> {
        Ok(redis::cmd("SMEMBERS").arg(key).query(&mut self.conn)?)
    }

    fn keys_with_prefix(&mut self, prefix: &str) -> StoreResult<Vec<String>> {
        let pattern = format!("{}*", escape_glob(prefix));
        let mut keys: Vec<String> = self.conn.scan_match(pattern)?.collect();
        keys.sort();
        keys.dedup();
        Ok(keys)
    }

    fn watch(&mut self, keys: &[String]) -> StoreResult<()> {
        if keys.is_empty() {
            return Ok(());
        }
        redis::cmd("WATCH")
            .arg(keys)
            .query::<()>(&mut self.conn)?;
        Ok(())
    }

    fn unwatch(&mut self) -> StoreResult<()> {
        redis::cmd("UNWATCH").query::<()>(&mut self.conn)?;
        Ok(())
    }

    fn commit(&mut self, batch: WriteBatch) -> StoreResult<CommitOutcome> {
        let mut pipe = redis::pipe();
        pipe.atomic();
        for op in batch.ops() {
            match op {
                WriteOp::Set { key, value } => {
                    pipe.cmd("SET").arg(key).arg(value.as_slice());
                }
                WriteOp::Delete { key } => {
                    pipe.cmd("DEL").arg(key);
                }
                WriteOp::SetAdd { key, members } => {
                    pipe.cmd("SADD").arg(key).arg(members.as_slice());
                }
            }
        }

        // EXEC answers nil when a watched key was touched.
        let replies: Option<Vec<redis::Value>> = pipe.query(&mut self.conn)?;
        Ok(match replies {
            None => CommitOutcome::Conflict,
            Some(values) => CommitOutcome::Committed(
                values
                    .into_iter()
                    .map(|value| match value {
                        redis::Value::Int(n) => OpReply::Count(u64::try_from(n).unwrap_or(0)),
                        _ => OpReply::Done,
                    })
                    .collect(),
            ),
        })
    }
}
