//! Durable slot for the session credential
//!
//! A single key in a small SQLite key/value table. The store does no
//! encryption and no expiry; the remote service decides when a token
//! stops being valid.

mod schema;

use schema::{DELETE_VALUE, SCHEMA, SELECT_VALUE, TOKEN_KEY, UPSERT_VALUE};

use crate::credential::Credential;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Token store error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Token store directory error: {0}")]
    Io(#[from] std::io::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Persistence for the one active credential
pub trait TokenStore: Send + Sync {
    /// Read the stored credential, if any
    fn load(&self) -> StoreResult<Option<Credential>>;

    /// Replace the stored credential
    fn save(&self, credential: &Credential) -> StoreResult<()>;

    /// Remove the stored credential; a no-op when nothing is stored
    fn clear(&self) -> StoreResult<()>;
}

impl<T: TokenStore + ?Sized> TokenStore for Arc<T> {
    fn load(&self) -> StoreResult<Option<Credential>> {
        (**self).load()
    }

    fn save(&self, credential: &Credential) -> StoreResult<()> {
        (**self).save(credential)
    }

    fn clear(&self) -> StoreResult<()> {
        (**self).clear()
    }
}

// ============================================================================
// SQLite store
// ============================================================================

/// Thread-safe SQLite-backed token store
#[derive(Clone)]
pub struct SqliteTokenStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteTokenStore {
    /// Open or create the store at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        Self::init(Connection::open(path)?)
    }

    /// Open an in-memory store (for testing)
    #[allow(dead_code)] // Used in tests
    pub fn open_in_memory() -> StoreResult<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> StoreResult<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn with_conn<R>(&self, f: impl FnOnce(&Connection) -> rusqlite::Result<R>) -> StoreResult<R> {
        let conn = self.conn.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(f(&conn)?)
    }
}

impl TokenStore for SqliteTokenStore {
    fn load(&self) -> StoreResult<Option<Credential>> {
        let value: Option<String> = self.with_conn(|conn| {
            conn.query_row(SELECT_VALUE, params![TOKEN_KEY], |row| row.get(0))
                .optional()
        })?;

        Ok(value.and_then(|v| {
            let credential = Credential::from_stored(&v);
            if credential.is_none() {
                tracing::warn!("Ignoring blank stored token");
            }
            credential
        }))
    }

    fn save(&self, credential: &Credential) -> StoreResult<()> {
        let now = Utc::now().to_rfc3339();
        self.with_conn(|conn| {
            conn.execute(UPSERT_VALUE, params![TOKEN_KEY, credential.as_str(), now])
        })?;
        tracing::debug!("Stored credential");
        Ok(())
    }

    fn clear(&self) -> StoreResult<()> {
        let removed = self.with_conn(|conn| conn.execute(DELETE_VALUE, params![TOKEN_KEY]))?;
        tracing::debug!(removed, "Cleared stored credential");
        Ok(())
    }
}

// ============================================================================
// In-memory store
// ============================================================================

/// Volatile store, used where durability does not matter
#[derive(Default)]
pub struct MemoryTokenStore {
    slot: Mutex<Option<Credential>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[allow(dead_code)] // Used in tests
    pub fn with_credential(credential: Credential) -> Self {
        Self {
            slot: Mutex::new(Some(credential)),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> StoreResult<Option<Credential>> {
        Ok(self
            .slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    fn save(&self, credential: &Credential) -> StoreResult<()> {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(credential.clone());
        Ok(())
    }

    fn clear(&self) -> StoreResult<()> {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}
