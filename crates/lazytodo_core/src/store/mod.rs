//! Local key-value persistence.
//!
//! # Responsibility
//! - Define the `KeyValueStore` seam the task repository writes through.
//! - Provide in-memory, SQLite and write-behind implementations.
//!
//! # Invariants
//! - Store failures are returned as `StoreError`, never panics.
//! - A missing key is `Ok(None)`, not an error.

use crate::db::DbError;
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::{Arc, Mutex};

mod sqlite;
mod write_behind;

pub use sqlite::SqliteStore;
pub use write_behind::WriteBehindStore;

pub type StoreResult<T> = Result<T, StoreError>;

/// Failure raised by a key-value backend.
#[derive(Debug)]
pub enum StoreError {
    Db(DbError),
    LockPoisoned(&'static str),
    WriterSpawn(std::io::Error),
    WriterClosed,
    Backend(String),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::LockPoisoned(name) => write!(f, "{name} lock poisoned"),
            Self::WriterSpawn(err) => write!(f, "failed to spawn store writer: {err}"),
            Self::WriterClosed => write!(f, "store writer is no longer running"),
            Self::Backend(message) => write!(f, "store backend error: {message}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::WriterSpawn(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// String-valued key-value storage.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>>;
    fn set(&self, key: &str, value: &str) -> StoreResult<()>;
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for Arc<S> {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        (**self).set(key, value)
    }
}

/// Process-local store, lost on exit.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| StoreError::LockPoisoned("memory store"))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| StoreError::LockPoisoned("memory store"))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
