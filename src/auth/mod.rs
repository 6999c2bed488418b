//! Authentication
//!
//! - **coordinator**: login / register / logout state machine over the
//!   session store
//! - **validation**: field-scoped checks run before a form reaches the
//!   coordinator

mod coordinator;
mod validation;

pub use coordinator::AuthCoordinator;
pub use validation::{validate_login, validate_register, Field, FieldErrors};

use thiserror::Error;

use crate::models::User;

/// Where the authentication flow currently is
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AuthPhase {
    /// Not signed in
    #[default]
    Idle,
    /// A login, register, logout or restore is running
    Authenticating,
    /// Signed in
    Authenticated,
    /// The last attempt failed while signed out; see `AuthState::error`
    ///
    /// A signed-in user whose attempt fails stays `Authenticated` with the
    /// error set alongside.
    Error,
}

/// Authentication view state
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthState {
    pub phase: AuthPhase,
    pub user: Option<User>,
    pub error: Option<String>,
}

impl AuthState {
    pub fn is_authenticated(&self) -> bool {
        self.phase == AuthPhase::Authenticated
    }

    pub fn is_loading(&self) -> bool {
        self.phase == AuthPhase::Authenticating
    }
}

/// Failure reported by an authentication operation
///
/// The display text is what the user should see.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Refused by the server or the mock issuance policy
    #[error("{0}")]
    Rejected(String),

    /// Signed in remotely but the session could not be saved locally
    #[error("{0}")]
    Storage(String),
}
