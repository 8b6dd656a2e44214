//! The current user's identity and credential.
//!
//! ARCHITECTURE
//! ============
//! A `Session` is the single source of truth for "who is signed in, with what
//! token". It is created once at startup with `Session::restore` and handed
//! out as `Arc<Session>` to the request pipeline and the auth flows. There is
//! no global instance.
//!
//! Mutations (`set_user`, `clear_user`) replace the whole state.
//! `update_profile` and `clear_user_if` are the compare-and-set variants used
//! after an await: they only apply while the token they were started with is
//! still current, so a slow response can never undo a logout. Each one
//! writes through the `SessionRepository` while holding the write lock and
//! only commits in memory once the write has succeeded, so the persisted copy
//! and the in-memory copy are never observably different.
//!
//! ERROR HANDLING
//! ==============
//! Restoring never fails: a missing or unreadable record means "nobody is
//! signed in". Every other failure is returned to the caller.

pub mod record;
pub mod repository;
pub mod state;

use std::sync::RwLock;

pub use repository::{PersistError, SESSION_STORE_KEY, SessionRepository, StorageRepository};
pub use state::{ProfileUpdate, SessionState, UserFields, UserId};

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("session state is unavailable (lock poisoned)")]
    Unavailable,
    #[error("refusing to store a user without a token")]
    MissingToken,
    #[error("failed to persist session: {0}")]
    Persist(#[from] PersistError),
}

pub struct Session {
    state: RwLock<SessionState>,
    repository: Box<dyn SessionRepository>,
}

impl Session {
    /// Build a session from whatever `repository` last saved.
    pub fn restore(repository: impl SessionRepository + 'static) -> Self {
        let state = match repository.load() {
            Ok(Some(state)) => state,
            Ok(None) => SessionState::default(),
            Err(error) => {
                tracing::warn!(%error, "discarding unreadable session record");
                SessionState::default()
            }
        };
        if let Some(id) = &state.id {
            tracing::debug!(user_id = %id, username = %state.username, "restored session");
        }
        Self { state: RwLock::new(state), repository: Box::new(repository) }
    }

    /// Replace every tracked field with `fields`.
    ///
    /// The token is opaque and only checked for being non-empty.
    pub fn set_user(&self, fields: UserFields) -> Result<(), SessionError> {
        if fields.token.is_empty() {
            return Err(SessionError::MissingToken);
        }
        self.replace(SessionState::from(fields))?;
        Ok(())
    }

    /// Reset to the unauthenticated defaults. Idempotent.
    pub fn clear_user(&self) -> Result<(), SessionError> {
        self.replace(SessionState::default())
    }

    /// Apply `update` only if `expected_token` is still the stored token.
    ///
    /// Returns `false` without writing anything when the user changed or
    /// signed out since `expected_token` was read. Never touches `id` or
    /// `token`.
    pub fn update_profile(&self, expected_token: &str, update: ProfileUpdate) -> Result<bool, SessionError> {
        let mut state = self.state.write().map_err(|_| SessionError::Unavailable)?;
        if expected_token.is_empty() || state.token != expected_token {
            return Ok(false);
        }
        let mut next = state.clone();
        update.apply(&mut next);
        self.commit(&mut *state, next)?;
        Ok(true)
    }

    /// `clear_user`, but only while `expected_token` is still the stored
    /// token. A different user who signed in meanwhile stays signed in.
    pub fn clear_user_if(&self, expected_token: &str) -> Result<bool, SessionError> {
        let mut state = self.state.write().map_err(|_| SessionError::Unavailable)?;
        if expected_token.is_empty() || state.token != expected_token {
            return Ok(false);
        }
        self.commit(&mut *state, SessionState::default())?;
        Ok(true)
    }

    fn replace(&self, next: SessionState) -> Result<(), SessionError> {
        let mut state = self.state.write().map_err(|_| SessionError::Unavailable)?;
        self.commit(&mut *state, next)
    }

    /// Persist `next`, then make it current. The caller holds the write lock.
    fn commit(&self, state: &mut SessionState, next: SessionState) -> Result<(), SessionError> {
        self.repository.save(&next)?;
        match &next.id {
            Some(id) => tracing::info!(user_id = %id, username = %next.username, "session updated"),
            None => tracing::info!("session cleared"),
        }
        *state = next;
        Ok(())
    }

    /// Copy of the full current state.
    pub fn snapshot(&self) -> Result<SessionState, SessionError> {
        let state = self.state.read().map_err(|_| SessionError::Unavailable)?;
        Ok(state.clone())
    }

    /// The credential to attach to outbound requests, if any.
    pub fn token(&self) -> Result<Option<String>, SessionError> {
        let state = self.state.read().map_err(|_| SessionError::Unavailable)?;
        Ok(if state.token.is_empty() { None } else { Some(state.token.clone()) })
    }

    pub fn is_authenticated(&self) -> Result<bool, SessionError> {
        let state = self.state.read().map_err(|_| SessionError::Unavailable)?;
        Ok(state.is_authenticated())
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut debug = f.debug_struct("Session");
        match self.state.read() {
            Ok(state) => debug.field("user_id", &state.id),
            Err(_) => debug.field("poisoned", &true),
        };
        debug.finish_non_exhaustive()
    }
}

#[cfg(test)]
impl Session {
    /// Poison the state lock by panicking while it is held.
    pub(crate) fn poison(self: &std::sync::Arc<Self>) {
        let session = std::sync::Arc::clone(self);
        let handle = std::thread::spawn(move || {
            let _guard = session.state.write();
            std::panic::resume_unwind(Box::new("poisoning session lock"));
        });
        assert!(handle.join().is_err());
    }
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
