//! Credential store: the single source of truth for "who is logged in".
//!
//! Holds the access/refresh token pair under two keys (`token` and
//! `refresh_token`). Writers always replace or remove both keys together;
//! readers must tolerate an empty pair at any time.

use std::path::Path;
use std::sync::{Arc, RwLock};

use redb::{Database, ReadableTable, TableDefinition};
use tracing::warn;

use crate::error::StoreError;

pub const ACCESS_TOKEN_KEY: &str = "token";
pub const REFRESH_TOKEN_KEY: &str = "refresh_token";

const TABLE: TableDefinition<&str, &str> = TableDefinition::new("session");

/// A complete credential pair, as issued by login or refresh.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

impl TokenPair {
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
        }
    }
}

/// What the store currently holds. Either side may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoredSession {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
}

impl StoredSession {
    pub fn is_empty(&self) -> bool {
        self.access_token.is_none() && self.refresh_token.is_none()
    }

    /// Both tokens present.
    pub fn pair(&self) -> Option<TokenPair> {
        match (&self.access_token, &self.refresh_token) {
            (Some(a), Some(r)) => Some(TokenPair::new(a.clone(), r.clone())),
            _ => None,
        }
    }
}

impl From<TokenPair> for StoredSession {
    fn from(pair: TokenPair) -> Self {
        Self {
            access_token: Some(pair.access_token),
            refresh_token: Some(pair.refresh_token),
        }
    }
}

/// Durable storage for the credential pair.
///
/// `set` and `clear` touch both keys in one step; no reader can observe
/// one key updated without the other.
pub trait CredentialStore: Send + Sync {
    /// Current pair. Never fails: a storage error reads as logged out.
    fn get(&self) -> StoredSession;

    /// Replace both tokens.
    fn set(&self, pair: &TokenPair) -> Result<(), StoreError>;

    /// Remove both tokens. Idempotent.
    fn clear(&self) -> Result<(), StoreError>;
}

// ── In-memory ───────────────────────────────────────────────────────

/// Process-local store. Nothing survives a restart.
#[derive(Default)]
pub struct MemoryCredentialStore {
    inner: RwLock<StoredSession>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pair(pair: TokenPair) -> Self {
        Self {
            inner: RwLock::new(pair.into()),
        }
    }

    /// Seed an arbitrary (possibly half-present) session. Test helper for
    /// states that `set` cannot produce.
    pub fn with_session(session: StoredSession) -> Self {
        Self {
            inner: RwLock::new(session),
        }
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn get(&self) -> StoredSession {
        self.inner
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn set(&self, pair: &TokenPair) -> Result<(), StoreError> {
        let mut guard = self
            .inner
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = pair.clone().into();
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        let mut guard = self
            .inner
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = StoredSession::default();
        Ok(())
    }
}

// ── redb ────────────────────────────────────────────────────────────

/// Store backed by a redb file, so a session survives restarts of the
/// process (the CLI keeps it under `~/.folio/session.redb`).
pub struct RedbCredentialStore {
    db: Arc<Database>,
}

impl RedbCredentialStore {
    /// Open or create the database at `path`.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| StoreError::Storage(e.to_string()))?;
        }
        let db = Database::create(path).map_err(|e| StoreError::Storage(e.to_string()))?;

        // Create the table up front so reads never hit a missing table.
        let write_txn = db
            .begin_write()
            .map_err(|e| StoreError::Storage(e.to_string()))?;
        {
            let _table = write_txn
                .open_table(TABLE)
                .map_err(|e| StoreError::Storage(e.to_string()))?;
        }
        write_txn
            .commit()
            .map_err(|e| StoreError::Storage(e.to_string()))?;

        Ok(Self { db: Arc::new(db) })
    }

    fn read(&self) -> Result<StoredSession, StoreError> {
        let read_txn = self
            .db
            .begin_read()
            .map_err(|e| StoreError::Storage(e.to_string()))?;
        let table = read_txn
            .open_table(TABLE)
            .map_err(|e| StoreError::Storage(e.to_string()))?;

        let lookup = |key: &str| -> Result<Option<String>, StoreError> {
            let value = table
                .get(key)
                .map_err(|e| StoreError::Storage(e.to_string()))?;
            Ok(value
                .map(|v| v.value().to_string())
                .filter(|v| !v.is_empty()))
        };

        Ok(StoredSession {
            access_token: lookup(ACCESS_TOKEN_KEY)?,
            refresh_token: lookup(REFRESH_TOKEN_KEY)?,
        })
    }
}

impl CredentialStore for RedbCredentialStore {
    fn get(&self) -> StoredSession {
        self.read().unwrap_or_else(|e| {
            warn!("credential store read failed, treating as logged out: {e}");
            StoredSession::default()
        })
    }

    fn set(&self, pair: &TokenPair) -> Result<(), StoreError> {
        let write_txn = self
            .db
            .begin_write()
            .map_err(|e| StoreError::Storage(e.to_string()))?;
        {
            let mut table = write_txn
                .open_table(TABLE)
                .map_err(|e| StoreError::Storage(e.to_string()))?;
            table
                .insert(ACCESS_TOKEN_KEY, pair.access_token.as_str())
                .map_err(|e| StoreError::Storage(e.to_string()))?;
            table
                .insert(REFRESH_TOKEN_KEY, pair.refresh_token.as_str())
                .map_err(|e| StoreError::Storage(e.to_string()))?;
        }
        write_txn
            .commit()
            .map_err(|e| StoreError::Storage(e.to_string()))?;
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        let write_txn = self
            .db
            .begin_write()
            .map_err(|e| StoreError::Storage(e.to_string()))?;
        {
            let mut table = write_txn
                .open_table(TABLE)
                .map_err(|e| StoreError::Storage(e.to_string()))?;
            for key in [ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY] {
                table
                    .remove(key)
                    .map_err(|e| StoreError::Storage(e.to_string()))?;
            }
        }
        write_txn
            .commit()
            .map_err(|e| StoreError::Storage(e.to_string()))?;
        Ok(())
    }
}
