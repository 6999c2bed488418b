//! Test doubles shared by the backend and coordinator tests

use async_trait::async_trait;
use axum::{
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

use super::{Backend, BackendError, MockBackend};
use crate::models::{
    AuthPayload, ChatTurn, ExpenseChart, ExpenseItem, LoginCredentials, RegisterCredentials, User,
};

// ============================================
// In-process expense API
// ============================================

/// Start a small expense API on a random local port, returning its base URL
///
/// Routes:
/// - `POST /api/auth/login`: accepts password `secret1`, else 401
/// - `POST /api/auth/register`, `POST /api/auth/logout`: succeed
/// - `GET /api/auth/verify`: accepts bearer `srv-token`, else 401
/// - `GET /api/expenses/charts`: 500 with a message
/// - `POST /api/expenses/generate-chart`: bar chart titled with the prompt
/// - `GET /api/chat/history`: one turn echoing the Authorization header
/// - `POST /api/chat/message`: echoes the message
/// - `GET /api/expenses`: not routed (404)
pub(crate) async fn spawn_api() -> String {
    let router = Router::new()
        .route("/api/auth/login", post(login))
        .route("/api/auth/register", post(register))
        .route("/api/auth/logout", post(|| async { StatusCode::NO_CONTENT }))
        .route("/api/auth/verify", get(verify))
        .route("/api/expenses/charts", get(charts))
        .route("/api/expenses/generate-chart", post(generate))
        .route("/api/chat/history", get(history))
        .route("/api/chat/message", post(message));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    format!("http://{}/api", addr)
}

/// Base URL of a port nothing is listening on
pub(crate) fn unreachable_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}/api", addr)
}

fn server_user(email: &str) -> Value {
    json!({ "id": "7", "email": email, "name": "Server User" })
}

async fn login(Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    if body["password"] == "secret1" {
        let email = body["email"].as_str().unwrap_or_default();
        (
            StatusCode::OK,
            Json(json!({ "user": server_user(email), "token": "srv-token" })),
        )
    } else {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "message": "Invalid credentials" })),
        )
    }
}

async fn register(Json(body): Json<Value>) -> Json<Value> {
    let email = body["email"].as_str().unwrap_or_default();
    Json(json!({ "user": server_user(email), "token": "srv-token" }))
}

async fn verify(headers: HeaderMap) -> (StatusCode, Json<Value>) {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if auth == "Bearer srv-token" {
        (StatusCode::OK, Json(json!({ "user": server_user("ann@example.com") })))
    } else {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "message": "Token expired" })),
        )
    }
}

async fn charts() -> (StatusCode, Json<Value>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "message": "database down" })),
    )
}

async fn generate(Json(body): Json<Value>) -> Json<Value> {
    Json(json!({
        "id": "g1",
        "type": "bar",
        "title": body["prompt"],
        "period": "weekly",
        "data": [{ "name": "Food", "value": 120.0 }]
    }))
}

async fn history(headers: HeaderMap) -> Json<Value> {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("none");
    Json(json!([{
        "id": "h1",
        "content": format!("authorization: {}", auth),
        "sender": "assistant",
        "timestamp": "2024-01-15T10:30:00Z"
    }]))
}

async fn message(Json(body): Json<Value>) -> Json<Value> {
    Json(json!({
        "id": "m1",
        "content": format!("echo: {}", body["message"].as_str().unwrap_or_default()),
        "sender": "assistant",
        "timestamp": "2024-01-15T10:31:00Z"
    }))
}

// ============================================
// Scripted backend
// ============================================

/// Mock backend whose individual operations can be forced to fail
#[derive(Default)]
pub(crate) struct ScriptedBackend {
    inner: MockBackend,
    failures: Mutex<HashMap<&'static str, BackendError>>,
    calls: Mutex<HashMap<&'static str, usize>>,
    gates: Mutex<HashMap<&'static str, Arc<Notify>>>,
}

impl ScriptedBackend {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Make every later call of `op` fail with `error`
    pub(crate) fn fail(&self, op: &'static str, error: BackendError) {
        self.failures.lock().unwrap().insert(op, error);
    }

    /// Let `op` succeed again
    pub(crate) fn heal(&self, op: &'static str) {
        self.failures.lock().unwrap().remove(op);
    }

    pub(crate) fn calls(&self, op: &'static str) -> usize {
        self.calls.lock().unwrap().get(op).copied().unwrap_or(0)
    }

    /// Make the next call of `op` wait until the returned handle is notified
    pub(crate) fn gate(&self, op: &'static str) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        self.gates.lock().unwrap().insert(op, notify.clone());
        notify
    }

    async fn check(&self, op: &'static str) -> Result<(), BackendError> {
        *self.calls.lock().unwrap().entry(op).or_insert(0) += 1;
        let gate = self.gates.lock().unwrap().remove(op);
        if let Some(gate) = gate {
            gate.notified().await;
        }
        match self.failures.lock().unwrap().get(op) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl Backend for ScriptedBackend {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn login(&self, credentials: &LoginCredentials) -> Result<AuthPayload, BackendError> {
        self.check("login").await?;
        self.inner.login(credentials).await
    }

    async fn register(
        &self,
        credentials: &RegisterCredentials,
    ) -> Result<AuthPayload, BackendError> {
        self.check("register").await?;
        self.inner.register(credentials).await
    }

    async fn logout(&self) -> Result<(), BackendError> {
        self.check("logout").await?;
        self.inner.logout().await
    }

    async fn verify(&self, token: &str) -> Result<User, BackendError> {
        self.check("verify").await?;
        self.inner.verify(token).await
    }

    async fn list_charts(&self) -> Result<Vec<ExpenseChart>, BackendError> {
        self.check("list_charts").await?;
        self.inner.list_charts().await
    }

    async fn list_expenses(&self) -> Result<Vec<ExpenseItem>, BackendError> {
        self.check("list_expenses").await?;
        self.inner.list_expenses().await
    }

    async fn generate_chart(&self, prompt: &str) -> Result<ExpenseChart, BackendError> {
        self.check("generate_chart").await?;
        self.inner.generate_chart(prompt).await
    }

    async fn chat_history(&self) -> Result<Vec<ChatTurn>, BackendError> {
        self.check("chat_history").await?;
        self.inner.chat_history().await
    }

    async fn send_message(&self, message: &str) -> Result<ChatTurn, BackendError> {
        self.check("send_message").await?;
        self.inner.send_message(message).await
    }
}
