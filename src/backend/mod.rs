//! Expense API Backends
//!
//! The expense/chat HTTP API is an external collaborator. Everything in the
//! crate talks to it through the [`Backend`] trait, with three strategies
//! selected at startup:
//!
//! - **RemoteBackend**: reqwest client for the real API
//! - **MockBackend**: deterministic / pseudo-random data, no network
//! - **FallbackBackend**: remote first, mock when the remote is unreachable
//!
//! ## Fallback rules
//!
//! | Operation | Falls back on |
//! |---|---|
//! | login, register | transport unreachable |
//! | charts, expenses, generate, history, send | transport unreachable, HTTP 404 |
//! | verify, logout | never |

mod client;
mod fallback;
mod mock;
#[cfg(test)]
pub(crate) mod testing;

pub use client::{RemoteBackend, RemoteConfig};
pub use fallback::FallbackBackend;
pub use mock::{MockBackend, CANNED_REPLIES, CHAT_SUGGESTIONS};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, RwLock};
use thiserror::Error;

use crate::models::{
    AuthPayload, ChatTurn, ExpenseChart, ExpenseItem, LoginCredentials, RegisterCredentials, User,
};

/// Message shown for failures that carry nothing user-presentable
pub const UNEXPECTED_ERROR: &str = "An unexpected error occurred";

/// Operations offered by the expense API
#[async_trait]
pub trait Backend: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &str;

    /// `POST /auth/login`
    async fn login(&self, credentials: &LoginCredentials) -> Result<AuthPayload, BackendError>;

    /// `POST /auth/register`
    async fn register(
        &self,
        credentials: &RegisterCredentials,
    ) -> Result<AuthPayload, BackendError>;

    /// `POST /auth/logout`
    async fn logout(&self) -> Result<(), BackendError>;

    /// `GET /auth/verify` with `token` as the bearer credential
    async fn verify(&self, token: &str) -> Result<User, BackendError>;

    /// `GET /expenses/charts`
    async fn list_charts(&self) -> Result<Vec<ExpenseChart>, BackendError>;

    /// `GET /expenses`
    async fn list_expenses(&self) -> Result<Vec<ExpenseItem>, BackendError>;

    /// `POST /expenses/generate-chart`
    async fn generate_chart(&self, prompt: &str) -> Result<ExpenseChart, BackendError>;

    /// `GET /chat/history`
    async fn chat_history(&self) -> Result<Vec<ChatTurn>, BackendError>;

    /// `POST /chat/message`
    async fn send_message(&self, message: &str) -> Result<ChatTurn, BackendError>;
}

/// Which backend strategy to run with
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BackendMode {
    /// Real API only; failures are surfaced
    Remote,
    /// Mock data only
    Mock,
    /// Real API with mock substitution when it cannot be reached
    #[default]
    Fallback,
}

impl std::fmt::Display for BackendMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendMode::Remote => write!(f, "remote"),
            BackendMode::Mock => write!(f, "mock"),
            BackendMode::Fallback => write!(f, "fallback"),
        }
    }
}

impl std::str::FromStr for BackendMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "remote" => Ok(BackendMode::Remote),
            "mock" => Ok(BackendMode::Mock),
            "fallback" => Ok(BackendMode::Fallback),
            other => Err(format!(
                "unknown backend mode '{}' (expected remote, mock or fallback)",
                other
            )),
        }
    }
}

/// Build the backend for `mode`
pub fn build_backend(
    mode: BackendMode,
    config: RemoteConfig,
    token: TokenHandle,
) -> Result<Arc<dyn Backend>, BackendError> {
    let backend: Arc<dyn Backend> = match mode {
        BackendMode::Remote => Arc::new(RemoteBackend::new(config, token)?),
        BackendMode::Mock => Arc::new(MockBackend::new()),
        BackendMode::Fallback => Arc::new(FallbackBackend::new(
            Box::new(RemoteBackend::new(config, token)?),
            Box::new(MockBackend::new()),
        )),
    };
    tracing::debug!(mode = %mode, backend = backend.name(), "Backend selected");
    Ok(backend)
}

// ============================================
// Bearer token
// ============================================

/// Shared view of the current session token
///
/// The session store writes it, the remote backend reads it on every
/// request to decide whether to attach `Authorization: Bearer <token>`.
#[derive(Debug, Clone, Default)]
pub struct TokenHandle(Arc<RwLock<Option<String>>>);

impl TokenHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Option<String> {
        self.0
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn set(&self, token: impl Into<String>) {
        *self.0.write().unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(token.into());
    }

    pub fn clear(&self) {
        *self.0.write().unwrap_or_else(|poisoned| poisoned.into_inner()) = None;
    }
}

// ============================================
// Errors
// ============================================

/// Errors that can occur when talking to the expense API
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// Connection refused or other network failure
    #[error("Backend unreachable: {0}")]
    Unreachable(String),

    /// Endpoint does not exist (HTTP 404)
    #[error("Endpoint not found")]
    NotFound,

    /// The server (or mock policy) refused the request
    #[error("Request rejected ({status}): {}", .message.as_deref().unwrap_or("no message"))]
    Rejected {
        status: u16,
        message: Option<String>,
    },

    #[error("Request timeout")]
    Timeout,

    /// Response body did not match the expected shape
    #[error("Invalid response: {0}")]
    Decode(String),
}

impl BackendError {
    /// Rejection carrying a user-presentable message
    pub fn rejected(status: u16, message: impl Into<String>) -> Self {
        BackendError::Rejected {
            status,
            message: Some(message.into()),
        }
    }

    pub fn is_unreachable(&self) -> bool {
        matches!(self, BackendError::Unreachable(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, BackendError::NotFound)
    }

    /// Server-supplied message, if any
    pub fn server_message(&self) -> Option<&str> {
        match self {
            BackendError::Rejected { message, .. } => message.as_deref(),
            _ => None,
        }
    }

    /// Text to store in view state: the server message, else `fallback`
    ///
    /// Malformed responses are unexpected and always map to
    /// [`UNEXPECTED_ERROR`].
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            BackendError::Decode(_) => UNEXPECTED_ERROR.to_string(),
            other => other.server_message().unwrap_or(fallback).to_string(),
        }
    }

    pub(crate) fn from_transport(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            BackendError::Timeout
        } else if e.is_connect() || e.is_request() {
            BackendError::Unreachable(e.to_string())
        } else if e.is_decode() {
            BackendError::Decode(e.to_string())
        } else {
            BackendError::Unreachable(e.to_string())
        }
    }
}
