//! Session Store
//!
//! Holds the authenticated identity and token, persisting them across
//! process restarts:
//!
//! - **persistence**: where the `{user, token}` document lives (file, memory)
//! - **store**: restore / persist / clear on top of a persistence backend,
//!   keeping the shared bearer token in sync
//!
//! The persisted representation is one document holding both halves, so a
//! token can never be written without its user or the other way around.

mod persistence;
mod store;

pub use persistence::{FileSessionStore, MemorySessionStore, SessionPersistence};
pub use store::SessionStore;

use thiserror::Error;

/// Errors that can occur while reading or writing the persisted session
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for SessionError {
    fn from(err: serde_json::Error) -> Self {
        SessionError::Serialization(err.to_string())
    }
}

impl From<tempfile::PersistError> for SessionError {
    fn from(err: tempfile::PersistError) -> Self {
        SessionError::Io(err.error)
    }
}

/// Result type alias for session persistence
pub type SessionResult<T> = Result<T, SessionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SessionError::Serialization("expected value".to_string());
        assert_eq!(err.to_string(), "Serialization error: expected value");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only");
        let err: SessionError = io_err.into();
        assert!(matches!(err, SessionError::Io(_)));
    }
}
