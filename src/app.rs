//! Application Root
//!
//! Owns one instance of every coordinator, all sharing a single backend and
//! session store.

use std::sync::Arc;

use crate::auth::AuthCoordinator;
use crate::backend::{build_backend, Backend, BackendError, TokenHandle};
use crate::chat::ChatCoordinator;
use crate::config::Config;
use crate::expenses::ExpenseCoordinator;
use crate::session::{FileSessionStore, SessionPersistence, SessionStore};

/// Root composition of the client state
pub struct SpendLens {
    /// Backend every coordinator talks to
    pub backend: Arc<dyn Backend>,
    /// Persisted identity and bearer token
    pub session: Arc<SessionStore>,
    pub auth: AuthCoordinator,
    pub expenses: ExpenseCoordinator,
    pub chat: ChatCoordinator,
}

impl SpendLens {
    /// Build the backend selected by `config` and wire the coordinators to it
    ///
    /// The session is persisted to `session.json` under the configured data
    /// directory.
    pub fn new(config: &Config) -> Result<Self, BackendError> {
        let token = TokenHandle::new();
        let backend = build_backend(config.backend.mode, config.remote(), token.clone())?;
        let persistence = FileSessionStore::in_dir(config.data_dir());

        tracing::debug!(
            mode = %config.backend.mode,
            api = %config.api.base_url,
            session = ?persistence.path(),
            "SpendLens initialised"
        );

        Ok(Self::with_backend(config, backend, Box::new(persistence), token))
    }

    /// Wire the coordinators to an existing backend and persistence layer
    ///
    /// `token` must be the handle `backend` reads its bearer token from.
    pub fn with_backend(
        config: &Config,
        backend: Arc<dyn Backend>,
        persistence: Box<dyn SessionPersistence>,
        token: TokenHandle,
    ) -> Self {
        let session = Arc::new(SessionStore::new(persistence, backend.clone(), token));

        Self {
            auth: AuthCoordinator::new(backend.clone(), session.clone()),
            expenses: ExpenseCoordinator::new(backend.clone()),
            chat: ChatCoordinator::with_typing_delay(backend.clone(), config.typing_delay()),
            backend,
            session,
        }
    }
}
