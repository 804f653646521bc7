//! Key-value slot contracts and implementations.
//!
//! # Responsibility
//! - Store opaque string blobs under string keys.
//! - Enforce a total byte quota the way browser local storage does.
//!
//! # Invariants
//! - `set` is all-or-nothing: a rejected write leaves the old value intact.
//! - Quota accounting covers every key in the store, not just the one written.

use crate::db::{open_db, open_db_in_memory, DbError};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

/// Default total quota, matching common browser local storage limits.
pub const DEFAULT_QUOTA_BYTES: usize = 5 * 1024 * 1024;

pub type RepoResult<T> = Result<T, RepoError>;

/// Storage-layer error for key-value reads and writes.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    /// Write would push total stored bytes past the configured quota.
    QuotaExceeded {
        key: String,
        required_bytes: usize,
        quota_bytes: usize,
    },
    /// Snapshot could not be serialized.
    Encode(serde_json::Error),
    /// Backend refused the operation (used by in-memory fakes and poisoned locks).
    Unavailable(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::QuotaExceeded {
                key,
                required_bytes,
                quota_bytes,
            } => write!(
                f,
                "storage quota exceeded writing `{key}`: {required_bytes} bytes required, {quota_bytes} allowed"
            ),
            Self::Encode(err) => write!(f, "failed to encode snapshot: {err}"),
            Self::Unavailable(message) => write!(f, "storage unavailable: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Encode(err) => Some(err),
            Self::QuotaExceeded { .. } | Self::Unavailable(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Durable string slot addressed by key.
pub trait KeyValueStore {
    /// Returns the stored value, or `None` when the key was never written.
    fn get(&self, key: &str) -> RepoResult<Option<String>>;
    /// Replaces the value under `key`.
    fn set(&mut self, key: &str, value: &str) -> RepoResult<()>;
    /// Removes `key`; returns whether a value existed.
    fn remove(&mut self, key: &str) -> RepoResult<bool>;
}

/// SQLite-backed key-value slot.
pub struct SqliteKeyValueStore {
    conn: Connection,
    quota_bytes: Option<usize>,
}

impl SqliteKeyValueStore {
    /// Opens (and migrates) the database file at `path`.
    pub fn open(path: impl AsRef<Path>) -> RepoResult<Self> {
        Self::try_new(open_db(path)?)
    }

    /// Opens a fresh in-memory database.
    pub fn open_in_memory() -> RepoResult<Self> {
        Self::try_new(open_db_in_memory()?)
    }

    /// Wraps a migrated connection.
    ///
    /// # Errors
    /// - Returns `RepoError::Unavailable` when `kv_store` is missing, which
    ///   means the connection did not come from `open_db*`.
    pub fn try_new(conn: Connection) -> RepoResult<Self> {
        let exists: i64 = conn.query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = 'kv_store'
            );",
            [],
            |row| row.get(0),
        )?;
        if exists != 1 {
            return Err(RepoError::Unavailable(
                "required table `kv_store` is missing".to_string(),
            ));
        }

        Ok(Self {
            conn,
            quota_bytes: Some(DEFAULT_QUOTA_BYTES),
        })
    }

    /// Overrides the total byte quota. `None` disables the check.
    pub fn with_quota(mut self, quota_bytes: Option<usize>) -> Self {
        self.quota_bytes = quota_bytes;
        self
    }

    fn bytes_excluding(&self, key: &str) -> RepoResult<usize> {
        let used: i64 = self.conn.query_row(
            "SELECT COALESCE(SUM(LENGTH(CAST(key AS BLOB)) + LENGTH(CAST(value AS BLOB))), 0)
             FROM kv_store
             WHERE key <> ?1;",
            [key],
            |row| row.get(0),
        )?;
        Ok(usize::try_from(used).unwrap_or(usize::MAX))
    }
}

impl KeyValueStore for SqliteKeyValueStore {
    fn get(&self, key: &str) -> RepoResult<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM kv_store WHERE key = ?1;",
                [key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set(&mut self, key: &str, value: &str) -> RepoResult<()> {
        if let Some(quota_bytes) = self.quota_bytes {
            let required_bytes = self
                .bytes_excluding(key)?
                .saturating_add(key.len())
                .saturating_add(value.len());
            if required_bytes > quota_bytes {
                return Err(RepoError::QuotaExceeded {
                    key: key.to_string(),
                    required_bytes,
                    quota_bytes,
                });
            }
        }

        self.conn.execute(
            "INSERT INTO kv_store (key, value, updated_at)
             VALUES (?1, ?2, strftime('%s', 'now') * 1000)
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at;",
            params![key, value],
        )?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> RepoResult<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM kv_store WHERE key = ?1;", [key])?;
        Ok(changed > 0)
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    entries: BTreeMap<String, String>,
    quota_bytes: Option<usize>,
    fail_reads: bool,
    fail_writes: bool,
    write_count: usize,
}

/// In-memory key-value slot for tests and ephemeral sessions.
///
/// Clones share state, so a test can keep a handle for inspection and fault
/// injection after moving the store into a repository.
#[derive(Debug, Clone, Default)]
pub struct MemoryKeyValueStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the total byte quota. `None` disables the check.
    pub fn set_quota(&self, quota_bytes: Option<usize>) {
        if let Ok(mut state) = self.state.lock() {
            state.quota_bytes = quota_bytes;
        }
    }

    /// Makes every subsequent `get` fail until reset.
    pub fn set_fail_reads(&self, fail: bool) {
        if let Ok(mut state) = self.state.lock() {
            state.fail_reads = fail;
        }
    }

    /// Makes every subsequent `set`/`remove` fail until reset.
    pub fn set_fail_writes(&self, fail: bool) {
        if let Ok(mut state) = self.state.lock() {
            state.fail_writes = fail;
        }
    }

    /// Number of successful writes so far.
    pub fn write_count(&self) -> usize {
        self.state.lock().map_or(0, |state| state.write_count)
    }

    /// Raw value currently stored under `key`.
    pub fn raw(&self, key: &str) -> Option<String> {
        self.state
            .lock()
            .ok()
            .and_then(|state| state.entries.get(key).cloned())
    }

    fn lock(&self) -> RepoResult<MutexGuard<'_, MemoryState>> {
        self.state
            .lock()
            .map_err(|_| RepoError::Unavailable("memory store lock poisoned".to_string()))
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get(&self, key: &str) -> RepoResult<Option<String>> {
        let state = self.lock()?;
        if state.fail_reads {
            return Err(RepoError::Unavailable(format!("reads disabled for `{key}`")));
        }
        Ok(state.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> RepoResult<()> {
        let mut state = self.lock()?;
        if state.fail_writes {
            return Err(RepoError::Unavailable(format!(
                "writes disabled for `{key}`"
            )));
        }

        if let Some(quota_bytes) = state.quota_bytes {
            let used: usize = state
                .entries
                .iter()
                .filter(|(existing, _)| existing.as_str() != key)
                .map(|(existing, stored)| existing.len() + stored.len())
                .sum();
            let required_bytes = used + key.len() + value.len();
            if required_bytes > quota_bytes {
                return Err(RepoError::QuotaExceeded {
                    key: key.to_string(),
                    required_bytes,
                    quota_bytes,
                });
            }
        }

        state.entries.insert(key.to_string(), value.to_string());
        state.write_count += 1;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> RepoResult<bool> {
        let mut state = self.lock()?;
        if state.fail_writes {
            return Err(RepoError::Unavailable(format!(
                "writes disabled for `{key}`"
            )));
        }
        Ok(state.entries.remove(key).is_some())
    }
}
