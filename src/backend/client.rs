//! Expense API REST Client
//!
//! HTTP client for the expense/chat API.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::{Backend, BackendError, TokenHandle};
use crate::models::{
    AuthPayload, ChatTurn, ExpenseChart, ExpenseItem, LoginCredentials, RegisterCredentials, User,
};

/// Expense API REST client
pub struct RemoteBackend {
    client: Client,
    config: RemoteConfig,
    token: TokenHandle,
}

/// Configuration for the remote backend
#[derive(Debug, Clone)]
pub struct RemoteConfig {
    /// Base URL including the API prefix (e.g., "http://localhost:3001/api")
    pub base_url: String,
    /// Request timeout in milliseconds
    pub request_timeout_ms: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3001/api".to_string(),
            request_timeout_ms: 30_000,
        }
    }
}

impl RemoteConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }
}

impl RemoteBackend {
    /// Create a client that reads the bearer token from `token`
    pub fn new(config: RemoteConfig, token: TokenHandle) -> Result<Self, BackendError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_millis(config.request_timeout_ms))
            .build()
            .map_err(|e| BackendError::Unreachable(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            config,
            token,
        })
    }

    /// Get the current configuration
    pub fn config(&self) -> &RemoteConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    /// Attach the bearer header, omitting it entirely when there is no token
    fn authorize(&self, request: RequestBuilder, token: Option<String>) -> RequestBuilder {
        match token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Send a request and classify the outcome
    async fn execute(&self, request: RequestBuilder) -> Result<Response, BackendError> {
        let response = request.send().await.map_err(BackendError::from_transport)?;
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        if status == StatusCode::NOT_FOUND {
            return Err(BackendError::NotFound);
        }

        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&text)
            .ok()
            .and_then(|body| body.message)
            .filter(|m| !m.is_empty());

        tracing::debug!(status = status.as_u16(), body = %text, "Expense API rejected request");

        Err(BackendError::Rejected {
            status: status.as_u16(),
            message,
        })
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, BackendError> {
        response
            .json::<T>()
            .await
            .map_err(|e| BackendError::Decode(e.to_string()))
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, BackendError> {
        let request = self.authorize(self.client.get(self.url(path)), self.token.get());
        let response = self.execute(request).await?;
        Self::decode(response).await
    }

    async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, BackendError>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let request = self.authorize(self.client.post(self.url(path)).json(body), self.token.get());
        let response = self.execute(request).await?;
        Self::decode(response).await
    }
}

#[async_trait]
impl Backend for RemoteBackend {
    fn name(&self) -> &str {
        "remote"
    }

    async fn login(&self, credentials: &LoginCredentials) -> Result<AuthPayload, BackendError> {
        self.post_json("/auth/login", credentials).await
    }

    async fn register(
        &self,
        credentials: &RegisterCredentials,
    ) -> Result<AuthPayload, BackendError> {
        self.post_json("/auth/register", credentials).await
    }

    async fn logout(&self) -> Result<(), BackendError> {
        let request = self.authorize(self.client.post(self.url("/auth/logout")), self.token.get());
        self.execute(request).await?;
        Ok(())
    }

    async fn verify(&self, token: &str) -> Result<User, BackendError> {
        let request = self.authorize(
            self.client.get(self.url("/auth/verify")),
            Some(token.to_string()),
        );
        let response = self.execute(request).await?;
        let body: VerifyResponse = Self::decode(response).await?;
        Ok(body.user)
    }

    async fn list_charts(&self) -> Result<Vec<ExpenseChart>, BackendError> {
        self.get_json("/expenses/charts").await
    }

    async fn list_expenses(&self) -> Result<Vec<ExpenseItem>, BackendError> {
        self.get_json("/expenses").await
    }

    async fn generate_chart(&self, prompt: &str) -> Result<ExpenseChart, BackendError> {
        self.post_json("/expenses/generate-chart", &GenerateChartRequest { prompt })
            .await
    }

    async fn chat_history(&self) -> Result<Vec<ChatTurn>, BackendError> {
        self.get_json("/chat/history").await
    }

    async fn send_message(&self, message: &str) -> Result<ChatTurn, BackendError> {
        self.post_json("/chat/message", &SendMessageRequest { message })
            .await
    }
}

// ============================================
// Request/Response DTOs
// ============================================

#[derive(Debug, Serialize)]
struct GenerateChartRequest<'a> {
    prompt: &'a str,
}

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    message: &'a str,
}

#[derive(Debug, Deserialize)]
struct VerifyResponse {
    user: User,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::testing::{spawn_api, unreachable_url};
    use crate::models::Sender;

    fn backend(base_url: String, token: TokenHandle) -> RemoteBackend {
        RemoteBackend::new(RemoteConfig::new(base_url), token).unwrap()
    }

    #[test]
    fn test_default_config() {
        let config = RemoteConfig::default();
        assert_eq!(config.base_url, "http://localhost:3001/api");
        assert_eq!(config.request_timeout_ms, 30_000);
    }

    #[test]
    fn test_url_joining() {
        let client = backend("http://host/api/".to_string(), TokenHandle::new());
        assert_eq!(client.url("/auth/login"), "http://host/api/auth/login");
    }

    #[tokio::test]
    async fn test_login_success_and_rejection() {
        let client = backend(spawn_api().await, TokenHandle::new());

        let payload = client
            .login(&LoginCredentials::new("ann@example.com", "secret1"))
            .await
            .unwrap();
        assert_eq!(payload.token, "srv-token");
        assert_eq!(payload.user.email, "ann@example.com");

        let err = client
            .login(&LoginCredentials::new("ann@example.com", "wrong!"))
            .await
            .unwrap_err();
        assert_eq!(err, BackendError::rejected(401, "Invalid credentials"));
    }

    #[tokio::test]
    async fn test_bearer_header_only_when_token_present() {
        let token = TokenHandle::new();
        let client = backend(spawn_api().await, token.clone());

        let turns = client.chat_history().await.unwrap();
        assert_eq!(turns[0].content, "authorization: none");

        token.set("abc123");
        let turns = client.chat_history().await.unwrap();
        assert_eq!(turns[0].content, "authorization: Bearer abc123");
        assert_eq!(turns[0].sender, Sender::Assistant);
    }

    #[tokio::test]
    async fn test_verify_uses_given_token() {
        let client = backend(spawn_api().await, TokenHandle::new());

        let user = client.verify("srv-token").await.unwrap();
        assert_eq!(user.id, "7");

        let err = client.verify("stale").await.unwrap_err();
        assert!(matches!(err, BackendError::Rejected { status: 401, .. }));
    }

    #[tokio::test]
    async fn test_error_classification() {
        let client = backend(spawn_api().await, TokenHandle::new());

        // No such route on the test server
        let err = client.list_expenses().await.unwrap_err();
        assert!(err.is_not_found());

        let err = client.list_charts().await.unwrap_err();
        assert_eq!(err.server_message(), Some("database down"));

        let offline = backend(unreachable_url(), TokenHandle::new());
        let err = offline.list_charts().await.unwrap_err();
        assert!(err.is_unreachable(), "got {:?}", err);
    }

    #[tokio::test]
    async fn test_send_and_generate() {
        let client = backend(spawn_api().await, TokenHandle::new());

        let reply = client.send_message("hello").await.unwrap();
        assert_eq!(reply.content, "echo: hello");

        let chart = client.generate_chart("food by week").await.unwrap();
        assert_eq!(chart.title, "food by week");

        client.logout().await.unwrap();
    }
}
