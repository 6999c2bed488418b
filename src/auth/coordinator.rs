//! Auth Coordinator
//!
//! State machine over `Idle → Authenticating → Authenticated | Error`.
//! Every operation reports failure through its result and the stored
//! `error`; nothing is propagated past this boundary as a panic.

use std::sync::{Arc, RwLock};

use super::{AuthError, AuthPhase, AuthState};
use crate::backend::{Backend, BackendError};
use crate::models::{AuthPayload, LoginCredentials, RegisterCredentials, Session, User};
use crate::session::SessionStore;

const LOGIN_FAILED: &str = "Login failed";
const REGISTRATION_FAILED: &str = "Registration failed";
const SESSION_SAVE_FAILED: &str = "Failed to save session";

/// Login / register / logout over the session store
pub struct AuthCoordinator {
    backend: Arc<dyn Backend>,
    session: Arc<SessionStore>,
    state: RwLock<AuthState>,
}

impl AuthCoordinator {
    pub fn new(backend: Arc<dyn Backend>, session: Arc<SessionStore>) -> Self {
        Self {
            backend,
            session,
            state: RwLock::new(AuthState::default()),
        }
    }

    /// Copy of the current view state
    pub fn state(&self) -> AuthState {
        self.state
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn user(&self) -> Option<User> {
        self.state().user
    }

    pub fn is_authenticated(&self) -> bool {
        self.state().is_authenticated()
    }

    fn update(&self, f: impl FnOnce(&mut AuthState)) {
        let mut state = self
            .state
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut state);
    }

    /// Restore a persisted session at startup
    pub async fn initialize(&self) -> AuthState {
        self.update(|s| s.phase = AuthPhase::Authenticating);

        let session = self.session.restore().await;

        self.update(|s| {
            *s = match session.user() {
                Some(user) => AuthState {
                    phase: AuthPhase::Authenticated,
                    user: Some(user.clone()),
                    error: None,
                },
                None => AuthState::default(),
            };
        });
        self.state()
    }

    /// Sign in with email and password
    pub async fn login(&self, credentials: &LoginCredentials) -> Result<User, AuthError> {
        self.begin();
        tracing::debug!(email = %credentials.email, "Logging in");
        let result = self.backend.login(credentials).await;
        self.complete(result, LOGIN_FAILED)
    }

    /// Create an account and sign in
    pub async fn register(&self, credentials: &RegisterCredentials) -> Result<User, AuthError> {
        self.begin();
        tracing::debug!(email = %credentials.email, "Registering");
        let result = self.backend.register(credentials).await;
        self.complete(result, REGISTRATION_FAILED)
    }

    /// Sign out
    ///
    /// The remote call is best-effort. Local state is cleared whatever it
    /// returns, so the user can always leave an authenticated state.
    pub async fn logout(&self) {
        self.update(|s| s.phase = AuthPhase::Authenticating);

        if let Err(e) = self.backend.logout().await {
            tracing::warn!(error = %e, "Remote logout failed, clearing local session anyway");
        }

        if let Err(e) = self.session.clear() {
            tracing::warn!(error = %e, "Failed to erase persisted session");
        }

        self.update(|s| *s = AuthState::default());
        tracing::info!("Logged out");
    }

    /// Dismiss the stored error; always legal and idempotent
    pub fn clear_error(&self) {
        self.update(|s| {
            s.error = None;
            if s.phase == AuthPhase::Error {
                s.phase = AuthPhase::Idle;
            }
        });
    }

    fn begin(&self) {
        self.update(|s| {
            s.phase = AuthPhase::Authenticating;
            s.error = None;
        });
    }

    fn complete(
        &self,
        result: Result<AuthPayload, BackendError>,
        fallback: &str,
    ) -> Result<User, AuthError> {
        let payload = match result {
            Ok(payload) => payload,
            Err(e) => {
                let message = e.user_message(fallback);
                tracing::warn!(error = %e, "Authentication rejected");
                return Err(self.fail(AuthError::Rejected(message)));
            }
        };

        let user = payload.user.clone();
        if let Err(e) = self.session.persist(&Session::from(payload)) {
            tracing::error!(error = %e, "Failed to persist session");
            return Err(self.fail(AuthError::Storage(SESSION_SAVE_FAILED.to_string())));
        }

        self.update(|s| {
            *s = AuthState {
                phase: AuthPhase::Authenticated,
                user: Some(user.clone()),
                error: None,
            };
        });
        tracing::info!(email = %user.email, "Authenticated");
        Ok(user)
    }

    /// Record a failed attempt
    ///
    /// A user who is already signed in stays signed in, since the session
    /// store still holds their token; the error is kept alongside.
    fn fail(&self, error: AuthError) -> AuthError {
        let message = error.to_string();
        self.update(|s| {
            s.phase = if s.user.is_some() {
                AuthPhase::Authenticated
            } else {
                AuthPhase::Error
            };
            s.error = Some(message);
        });
        error
    }
}
