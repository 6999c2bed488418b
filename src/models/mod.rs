//! SpendLens Data Model
//!
//! Types shared by the backend, the session store and the coordinators:
//!
//! - **auth**: `User`, `Session`, credentials and the login/register payload
//! - **expenses**: `ExpenseChart`, `ChartDatum`, `ExpenseItem`
//! - **chat**: `ChatTurn` and `Sender`
//!
//! Field names follow the JSON wire format of the expense API.

mod auth;
mod chat;
mod expenses;

pub use auth::{AuthPayload, LoginCredentials, RegisterCredentials, Session, User};
pub use chat::{ChatTurn, Sender};
pub use expenses::{ChartDatum, ChartKind, ChartPeriod, ExpenseChart, ExpenseItem};

/// Current Unix time in milliseconds, used for time-derived ids
pub(crate) fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Short random suffix that keeps time-derived ids unique within one millisecond
pub(crate) fn unique_suffix() -> String {
    uuid::Uuid::new_v4().simple().to_string()[..8].to_string()
}
