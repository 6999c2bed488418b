//! # SpendLens
//!
//! Client-side state core for an expense-tracking assistant: who is signed
//! in, the dashboard's expense charts, and the conversation with the
//! assistant. Talks to an external expense API and can substitute built-in
//! sample data when that API is unavailable.
//!
//! ## Modules
//!
//! - [`session`]: persisted identity and bearer token
//! - [`backend`]: the expense API (remote, mock, remote-with-fallback)
//! - [`resource`]: generic `{data, is_loading, error}` state for one collection
//! - [`auth`]: login / register / logout coordinator and form validation
//! - [`expenses`]: chart and expense list coordinator
//! - [`chat`]: chat coordinator
//! - [`app`]: root composition owning one of each coordinator
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use spendlens::{Config, LoginCredentials, SpendLens};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load_default()?;
//!     let app = SpendLens::new(&config)?;
//!
//!     // Pick up a session saved by an earlier run
//!     app.auth.initialize().await;
//!     if !app.auth.is_authenticated() {
//!         app.auth
//!             .login(&LoginCredentials::new("jo@example.com", "secret1"))
//!             .await?;
//!     }
//!
//!     app.expenses.refresh_charts().await?;
//!     for chart in app.expenses.charts().data {
//!         println!("{} ({}): {:.2}", chart.title, chart.period, chart.total());
//!     }
//!
//!     if let Some(reply) = app.chat.send_message("How much did I spend on food?").await? {
//!         println!("{}", reply.content);
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod app;
pub mod auth;
pub mod backend;
pub mod chat;
pub mod config;
pub mod expenses;
pub mod models;
pub mod resource;
pub mod session;

// Re-export top-level types for convenience
pub use app::SpendLens;

pub use auth::{
    validate_login, validate_register, AuthCoordinator, AuthError, AuthPhase, AuthState, Field,
    FieldErrors,
};

pub use backend::{
    build_backend, Backend, BackendError, BackendMode, FallbackBackend, MockBackend,
    RemoteBackend, RemoteConfig, TokenHandle,
};

pub use chat::ChatCoordinator;
pub use config::{Config, ConfigError, LoggingConfig};
pub use expenses::ExpenseCoordinator;

pub use models::{
    AuthPayload, ChartDatum, ChartKind, ChartPeriod, ChatTurn, ExpenseChart, ExpenseItem,
    LoginCredentials, RegisterCredentials, Sender, Session, User,
};

pub use resource::{RequestState, ResourceFetcher};
pub use session::{FileSessionStore, MemorySessionStore, SessionError, SessionPersistence, SessionStore};
