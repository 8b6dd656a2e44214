//! Load/save seam between a `Session` and durable storage.

use super::record::{self, RecordError};
use super::state::SessionState;
use crate::storage::{Storage, StorageError};

/// Fixed key under which the session record is stored.
pub const SESSION_STORE_KEY: &str = "user";

#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Record(#[from] RecordError),
}

/// Durable home of a session's state.
///
/// `save` is called synchronously from inside every session mutation, so an
/// implementation must finish writing before it returns.
///
/// It runs under the session's `std::sync::RwLock`, on whatever thread made
/// the mutation (tokio workers included). A single small record keeps that
/// blocking write short; a slow or remote store belongs behind
/// `tokio::task::spawn_blocking` at the call site instead.
pub trait SessionRepository: Send + Sync {
    /// Returns the last saved state, or `None` if nothing was ever saved.
    fn load(&self) -> Result<Option<SessionState>, PersistError>;

    fn save(&self, state: &SessionState) -> Result<(), PersistError>;
}

/// Stores the versioned session record under [`SESSION_STORE_KEY`].
#[derive(Debug)]
pub struct StorageRepository<S> {
    storage: S,
    key: String,
}

impl<S: Storage> StorageRepository<S> {
    pub fn new(storage: S) -> Self {
        Self { storage, key: SESSION_STORE_KEY.to_owned() }
    }

    /// Use a different key, e.g. to keep separate sessions per backend.
    #[must_use]
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl<S: Storage> SessionRepository for StorageRepository<S> {
    fn load(&self) -> Result<Option<SessionState>, PersistError> {
        let Some(raw) = self.storage.get_item(&self.key)? else {
            return Ok(None);
        };
        Ok(Some(record::decode(&raw)?))
    }

    fn save(&self, state: &SessionState) -> Result<(), PersistError> {
        let raw = record::encode(state)?;
        self.storage.set_item(&self.key, &raw)?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "repository_test.rs"]
mod repository_test;
