//! Session restore / persist / clear

use std::sync::{Arc, RwLock};

use super::{SessionPersistence, SessionResult};
use crate::backend::{Backend, TokenHandle};
use crate::models::Session;

/// Authenticated identity plus its persisted representation
pub struct SessionStore {
    persistence: Box<dyn SessionPersistence>,
    backend: Arc<dyn Backend>,
    token: TokenHandle,
    current: RwLock<Session>,
}

impl SessionStore {
    /// Create a store; `token` is the handle the backend reads bearer tokens from
    pub fn new(
        persistence: Box<dyn SessionPersistence>,
        backend: Arc<dyn Backend>,
        token: TokenHandle,
    ) -> Self {
        Self {
            persistence,
            backend,
            token,
            current: RwLock::new(Session::empty()),
        }
    }

    /// Current in-memory session
    pub fn current(&self) -> Session {
        self.current
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Shared bearer token handle
    pub fn token_handle(&self) -> &TokenHandle {
        &self.token
    }

    fn set_current(&self, session: Session) {
        match session.token() {
            Some(token) => self.token.set(token),
            None => self.token.clear(),
        }
        *self
            .current
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = session;
    }

    /// Restore the persisted session, verifying its token with the backend
    ///
    /// Any verification failure, network or rejection alike, clears the
    /// persisted state and yields the empty session. Unreadable state is
    /// treated as absent.
    pub async fn restore(&self) -> Session {
        let stored = match self.persistence.load() {
            Ok(Some(session)) => session,
            Ok(None) => {
                tracing::debug!("No persisted session");
                return self.reset();
            }
            Err(e) => {
                tracing::warn!(error = %e, "Persisted session unreadable, discarding");
                return self.reset();
            }
        };

        let Some(token) = stored.token().map(str::to_string) else {
            return self.reset();
        };

        match self.backend.verify(&token).await {
            Ok(user) => {
                let session = Session::authenticated(user, token);
                if let Err(e) = self.persistence.save(&session) {
                    tracing::warn!(error = %e, "Failed to re-persist verified session");
                }
                tracing::info!(
                    email = %session.user().map(|u| u.email.as_str()).unwrap_or_default(),
                    "Session restored"
                );
                self.set_current(session.clone());
                session
            }
            Err(e) => {
                tracing::info!(error = %e, "Session verification failed, clearing");
                self.reset()
            }
        }
    }

    /// Persist `session` and make it current
    ///
    /// An empty session is equivalent to [`SessionStore::clear`].
    pub fn persist(&self, session: &Session) -> SessionResult<()> {
        if !session.is_authenticated() {
            return self.clear();
        }
        self.persistence.save(session)?;
        self.set_current(session.clone());
        Ok(())
    }

    /// Erase the persisted session and forget the in-memory one
    ///
    /// The in-memory session and bearer token are dropped even when the
    /// erase itself fails.
    pub fn clear(&self) -> SessionResult<()> {
        self.set_current(Session::empty());
        self.persistence.erase()
    }

    fn reset(&self) -> Session {
        if let Err(e) = self.clear() {
            tracing::warn!(error = %e, "Failed to erase persisted session");
        }
        Session::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::testing::ScriptedBackend;
    use crate::backend::{BackendError, MockBackend};
    use crate::models::{LoginCredentials, User};
    use crate::session::{FileSessionStore, MemorySessionStore};
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_persist_then_restore_round_trip() {
        let dir = tempdir().unwrap();
        let backend = Arc::new(MockBackend::new());
        let payload = backend
            .login(&LoginCredentials::new("a@b.com", "secret1"))
            .await
            .unwrap();
        let session = Session::from(payload);

        let writer = SessionStore::new(
            Box::new(FileSessionStore::in_dir(dir.path())),
            backend.clone(),
            TokenHandle::new(),
        );
        writer.persist(&session).unwrap();
        assert_eq!(writer.token_handle().get().as_deref(), session.token());

        // A second store over the same file sees the same session
        let reader = SessionStore::new(
            Box::new(FileSessionStore::in_dir(dir.path())),
            backend,
            TokenHandle::new(),
        );
        let restored = reader.restore().await;
        assert_eq!(restored, session);
        assert_eq!(reader.current(), session);
        assert_eq!(reader.token_handle().get().as_deref(), session.token());
    }

    #[tokio::test]
    async fn test_restore_uses_verified_user() {
        let backend = Arc::new(MockBackend::new());
        let payload = backend
            .login(&LoginCredentials::new("jane.doe@b.com", "secret1"))
            .await
            .unwrap();

        // Persisted copy carries an outdated display name
        let stale = Session::authenticated(User::new("1", "jane.doe@b.com", "old"), &payload.token);
        let store = SessionStore::new(
            Box::new(MemorySessionStore::with_session(stale)),
            backend,
            TokenHandle::new(),
        );

        let restored = store.restore().await;
        assert_eq!(restored.user().map(|u| u.name.as_str()), Some("jane doe"));
    }

    #[tokio::test]
    async fn test_failed_verification_clears_state() {
        for error in [
            BackendError::Unreachable("connection refused".into()),
            BackendError::rejected(401, "Token expired"),
        ] {
            let dir = tempdir().unwrap();
            let file = FileSessionStore::in_dir(dir.path());
            file.save(&Session::authenticated(User::new("1", "a@b.com", "a"), "tok"))
                .unwrap();

            let backend = Arc::new(ScriptedBackend::new());
            backend.fail("verify", error);
            let store = SessionStore::new(Box::new(file.clone()), backend, TokenHandle::new());

            let restored = store.restore().await;
            assert_eq!(restored, Session::empty());
            assert!(!file.path().exists());
            assert!(store.token_handle().get().is_none());
        }
    }

    #[tokio::test]
    async fn test_restore_without_stored_session_skips_verify() {
        let backend = Arc::new(ScriptedBackend::new());
        let store = SessionStore::new(
            Box::new(MemorySessionStore::new()),
            backend.clone(),
            TokenHandle::new(),
        );

        assert_eq!(store.restore().await, Session::empty());
        assert_eq!(backend.calls("verify"), 0);
    }

    #[tokio::test]
    async fn test_corrupt_file_is_discarded() {
        let dir = tempdir().unwrap();
        let file = FileSessionStore::in_dir(dir.path());
        std::fs::write(file.path(), "{ not json").unwrap();

        let store = SessionStore::new(
            Box::new(file.clone()),
            Arc::new(MockBackend::new()),
            TokenHandle::new(),
        );
        assert_eq!(store.restore().await, Session::empty());
        assert!(!file.path().exists());
    }

    #[test]
    fn test_clear_drops_token_and_user() {
        let store = SessionStore::new(
            Box::new(MemorySessionStore::new()),
            Arc::new(MockBackend::new()),
            TokenHandle::new(),
        );
        store
            .persist(&Session::authenticated(User::new("1", "a@b.com", "a"), "tok"))
            .unwrap();
        assert!(store.current().is_authenticated());

        store.clear().unwrap();
        let current = store.current();
        assert!(current.user().is_none());
        assert!(current.token().is_none());
        assert!(store.token_handle().get().is_none());
    }
}
