//! Fallback Backend
//!
//! Tries the remote API first and substitutes the mock when the remote
//! cannot be reached. Every substitution is logged so served mock data
//! never goes unnoticed.

use async_trait::async_trait;

use super::{Backend, BackendError};
use crate::models::{
    AuthPayload, ChatTurn, ExpenseChart, ExpenseItem, LoginCredentials, RegisterCredentials, User,
};

/// Which failures an operation may mask with mock data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Substitution {
    /// Transport failures only
    OnUnreachable,
    /// Transport failures and missing endpoints
    OnUnreachableOrNotFound,
}

impl Substitution {
    fn applies(self, error: &BackendError) -> bool {
        match self {
            Substitution::OnUnreachable => error.is_unreachable(),
            Substitution::OnUnreachableOrNotFound => {
                error.is_unreachable() || error.is_not_found()
            }
        }
    }
}

/// Remote-first backend with mock substitution
pub struct FallbackBackend {
    primary: Box<dyn Backend>,
    secondary: Box<dyn Backend>,
}

impl FallbackBackend {
    pub fn new(primary: Box<dyn Backend>, secondary: Box<dyn Backend>) -> Self {
        Self { primary, secondary }
    }

    fn should_substitute(&self, op: &str, rule: Substitution, error: &BackendError) -> bool {
        let substitute = rule.applies(error);
        if substitute {
            tracing::warn!(
                operation = op,
                primary = self.primary.name(),
                secondary = self.secondary.name(),
                error = %error,
                "Primary backend unavailable, serving substitute data"
            );
        }
        substitute
    }
}

#[async_trait]
impl Backend for FallbackBackend {
    fn name(&self) -> &str {
        "fallback"
    }

    async fn login(&self, credentials: &LoginCredentials) -> Result<AuthPayload, BackendError> {
        match self.primary.login(credentials).await {
            Err(e) if self.should_substitute("login", Substitution::OnUnreachable, &e) => {
                self.secondary.login(credentials).await
            }
            other => other,
        }
    }

    async fn register(
        &self,
        credentials: &RegisterCredentials,
    ) -> Result<AuthPayload, BackendError> {
        match self.primary.register(credentials).await {
            Err(e) if self.should_substitute("register", Substitution::OnUnreachable, &e) => {
                self.secondary.register(credentials).await
            }
            other => other,
        }
    }

    async fn logout(&self) -> Result<(), BackendError> {
        self.primary.logout().await
    }

    async fn verify(&self, token: &str) -> Result<User, BackendError> {
        self.primary.verify(token).await
    }

    async fn list_charts(&self) -> Result<Vec<ExpenseChart>, BackendError> {
        match self.primary.list_charts().await {
            Err(e)
                if self.should_substitute(
                    "list_charts",
                    Substitution::OnUnreachableOrNotFound,
                    &e,
                ) =>
            {
                self.secondary.list_charts().await
            }
            other => other,
        }
    }

    async fn list_expenses(&self) -> Result<Vec<ExpenseItem>, BackendError> {
        match self.primary.list_expenses().await {
            Err(e)
                if self.should_substitute(
                    "list_expenses",
                    Substitution::OnUnreachableOrNotFound,
                    &e,
                ) =>
            {
                self.secondary.list_expenses().await
            }
            other => other,
        }
    }

    async fn generate_chart(&self, prompt: &str) -> Result<ExpenseChart, BackendError> {
        match self.primary.generate_chart(prompt).await {
            Err(e)
                if self.should_substitute(
                    "generate_chart",
                    Substitution::OnUnreachableOrNotFound,
                    &e,
                ) =>
            {
                self.secondary.generate_chart(prompt).await
            }
            other => other,
        }
    }

    async fn chat_history(&self) -> Result<Vec<ChatTurn>, BackendError> {
        match self.primary.chat_history().await {
            Err(e)
                if self.should_substitute(
                    "chat_history",
                    Substitution::OnUnreachableOrNotFound,
                    &e,
                ) =>
            {
                self.secondary.chat_history().await
            }
            other => other,
        }
    }

    async fn send_message(&self, message: &str) -> Result<ChatTurn, BackendError> {
        match self.primary.send_message(message).await {
            Err(e)
                if self.should_substitute(
                    "send_message",
                    Substitution::OnUnreachableOrNotFound,
                    &e,
                ) =>
            {
                self.secondary.send_message(message).await
            }
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::testing::{spawn_api, unreachable_url, ScriptedBackend};
    use crate::backend::{MockBackend, RemoteBackend, RemoteConfig, TokenHandle, CANNED_REPLIES};

    fn over(base_url: String) -> FallbackBackend {
        let remote = RemoteBackend::new(RemoteConfig::new(base_url), TokenHandle::new()).unwrap();
        FallbackBackend::new(Box::new(remote), Box::new(MockBackend::new()))
    }

    #[tokio::test]
    async fn test_unreachable_remote_serves_mock() {
        let backend = over(unreachable_url());

        let payload = backend
            .login(&LoginCredentials::new("a@b.com", "secret1"))
            .await
            .unwrap();
        assert_eq!(payload.user.name, "a");

        assert_eq!(backend.list_charts().await.unwrap().len(), 3);
        assert!(backend.chat_history().await.unwrap().is_empty());

        let reply = backend.send_message("How much did I spend?").await.unwrap();
        assert!(CANNED_REPLIES.contains(&reply.content.as_str()));
    }

    #[tokio::test]
    async fn test_verify_and_logout_never_substitute() {
        let backend = over(unreachable_url());
        assert!(backend.verify("anything").await.unwrap_err().is_unreachable());
        assert!(backend.logout().await.unwrap_err().is_unreachable());
    }

    #[tokio::test]
    async fn test_not_found_only_masks_data_operations() {
        let backend = over(spawn_api().await);

        // /expenses is not routed on the test server
        assert_eq!(backend.list_expenses().await.unwrap().len(), 5);

        // A server-side failure is surfaced, not masked
        let err = backend.list_charts().await.unwrap_err();
        assert_eq!(err.server_message(), Some("database down"));

        // Rejected credentials are surfaced too
        let err = backend
            .login(&LoginCredentials::new("ann@example.com", "nope"))
            .await
            .unwrap_err();
        assert_eq!(err.server_message(), Some("Invalid credentials"));
    }

    #[tokio::test]
    async fn test_auth_not_found_is_surfaced() {
        let primary = ScriptedBackend::new();
        primary.fail("login", BackendError::NotFound);
        let backend = FallbackBackend::new(Box::new(primary), Box::new(MockBackend::new()));

        let err = backend
            .login(&LoginCredentials::new("a@b.com", "secret1"))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }
}
