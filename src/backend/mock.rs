//! Mock Backend
//!
//! Serves fabricated data so the client is usable without the expense API.
//! Only reachable when the configured backend mode is `mock` or `fallback`.

use async_trait::async_trait;
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashMap;
use std::sync::Mutex;

use super::{Backend, BackendError};
use crate::models::{
    now_millis, unique_suffix, AuthPayload, ChartDatum, ChartKind, ChartPeriod, ChatTurn,
    ExpenseChart, ExpenseItem, LoginCredentials, RegisterCredentials, User,
};

/// Prefix carried by every token the mock issues
pub const MOCK_TOKEN_PREFIX: &str = "mock_token_";

/// Replies the mock assistant picks from
pub const CANNED_REPLIES: [&str; 5] = [
    "I can see your expense patterns. You're spending quite a bit on dining out this month. Would you like me to create a chart showing your food expenses over time?",
    "Based on your expense data, I notice transportation costs have increased by 20% compared to last month. This could be due to rising gas prices.",
    "Your monthly budget tracking looks good! You're staying within your limits for most categories. The entertainment category seems to be your flex spending area.",
    "I can help you analyze spending patterns and create custom expense charts. What specific aspect of your expenses would you like to explore?",
    "Your savings rate has improved this quarter! You're spending 15% less on discretionary items compared to the previous period.",
];

/// Prompts offered to start a conversation
pub const CHAT_SUGGESTIONS: [&str; 6] = [
    "Show me my spending by category this month",
    "Create a chart of my transportation expenses",
    "How much did I spend on food last week?",
    "Compare my expenses from this month to last month",
    "What's my biggest expense category?",
    "Show me daily expense trends",
];

/// Status attached to mock rejections
const MOCK_REJECT_STATUS: u16 = 400;
const MOCK_UNAUTHORIZED_STATUS: u16 = 401;

/// In-process stand-in for the expense API
#[derive(Default)]
pub struct MockBackend {
    /// Tokens issued by this instance
    issued: Mutex<HashMap<String, User>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Display name derived from the local part of an email address
    pub fn display_name(email: &str) -> String {
        let local = email.split('@').next().unwrap_or_default();
        local.replace(|c: char| c == '.' || c == '_', " ")
    }

    /// Issue a token unique per call and remember who it belongs to
    fn issue(&self, user: User) -> AuthPayload {
        let token = format!("{}{}_{}", MOCK_TOKEN_PREFIX, now_millis(), unique_suffix());
        self.issued
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(token.clone(), user.clone());
        tracing::info!(email = %user.email, "Issued mock session");
        AuthPayload { user, token }
    }

    /// Fixed dashboard charts
    pub fn charts() -> Vec<ExpenseChart> {
        vec![
            ExpenseChart {
                id: "1".to_string(),
                kind: ChartKind::Pie,
                title: "Expenses by Category (This Month)".to_string(),
                period: ChartPeriod::Monthly,
                data: vec![
                    ChartDatum::new("Food & Dining", 850.0).color("#FF6384"),
                    ChartDatum::new("Transportation", 420.0).color("#36A2EB"),
                    ChartDatum::new("Utilities", 320.0).color("#FFCE56"),
                    ChartDatum::new("Entertainment", 280.0).color("#4BC0C0"),
                    ChartDatum::new("Healthcare", 150.0).color("#9966FF"),
                    ChartDatum::new("Shopping", 540.0).color("#FF9F40"),
                ],
            },
            ExpenseChart {
                id: "2".to_string(),
                kind: ChartKind::Bar,
                title: "Monthly Expense Trends".to_string(),
                period: ChartPeriod::Monthly,
                data: [
                    ("Jan", 2100.0),
                    ("Feb", 1950.0),
                    ("Mar", 2300.0),
                    ("Apr", 2150.0),
                    ("May", 2400.0),
                    ("Jun", 2200.0),
                ]
                .into_iter()
                .map(|(name, value)| ChartDatum::new(name, value))
                .collect(),
            },
            ExpenseChart {
                id: "3".to_string(),
                kind: ChartKind::Line,
                title: "Daily Expenses (This Week)".to_string(),
                period: ChartPeriod::Daily,
                data: [
                    ("Mon", 85.0),
                    ("Tue", 120.0),
                    ("Wed", 95.0),
                    ("Thu", 140.0),
                    ("Fri", 110.0),
                    ("Sat", 180.0),
                    ("Sun", 160.0),
                ]
                .into_iter()
                .map(|(name, value)| ChartDatum::new(name, value))
                .collect(),
            },
        ]
    }

    /// Fixed recent expenses
    pub fn expenses() -> Vec<ExpenseItem> {
        [
            ("1", "Food & Dining", 25.50, "2024-01-15", "Lunch at cafe"),
            ("2", "Transportation", 45.00, "2024-01-14", "Gas for car"),
            ("3", "Utilities", 120.00, "2024-01-13", "Electricity bill"),
            ("4", "Entertainment", 35.00, "2024-01-12", "Movie tickets"),
            ("5", "Shopping", 89.99, "2024-01-11", "Clothing purchase"),
        ]
        .into_iter()
        .map(|(id, category, amount, date, description)| ExpenseItem {
            id: id.to_string(),
            category: category.to_string(),
            amount,
            date: date.to_string(),
            description: description.to_string(),
        })
        .collect()
    }

    /// Bar chart labelled after `prompt` with values in `[100, 600)`
    pub fn generated_chart(prompt: &str) -> ExpenseChart {
        let mut rng = rand::thread_rng();
        ExpenseChart {
            id: format!("generated-{}-{}", now_millis(), unique_suffix()),
            kind: ChartKind::Bar,
            title: format!("Generated Chart: {}", prompt),
            period: ChartPeriod::Monthly,
            data: ["Category A", "Category B", "Category C", "Category D"]
                .into_iter()
                .map(|name| ChartDatum::new(name, rng.gen_range(100..600) as f64))
                .collect(),
        }
    }

    /// One canned assistant reply, chosen at random
    pub fn reply() -> ChatTurn {
        let content = CANNED_REPLIES
            .choose(&mut rand::thread_rng())
            .copied()
            .unwrap_or(CANNED_REPLIES[0]);
        ChatTurn::assistant(content)
    }
}

#[async_trait]
impl Backend for MockBackend {
    fn name(&self) -> &str {
        "mock"
    }

    async fn login(&self, credentials: &LoginCredentials) -> Result<AuthPayload, BackendError> {
        if credentials.email.is_empty() || credentials.password.is_empty() {
            return Err(BackendError::rejected(
                MOCK_REJECT_STATUS,
                "Email and password are required",
            ));
        }

        let user = User::new(
            "1",
            credentials.email.clone(),
            Self::display_name(&credentials.email),
        );
        Ok(self.issue(user))
    }

    async fn register(
        &self,
        credentials: &RegisterCredentials,
    ) -> Result<AuthPayload, BackendError> {
        if credentials.name.is_empty()
            || credentials.email.is_empty()
            || credentials.password.is_empty()
        {
            return Err(BackendError::rejected(
                MOCK_REJECT_STATUS,
                "All fields are required",
            ));
        }

        if credentials.password != credentials.confirm_password {
            return Err(BackendError::rejected(
                MOCK_REJECT_STATUS,
                "Passwords do not match",
            ));
        }

        let user = User::new("1", credentials.email.clone(), credentials.name.clone());
        Ok(self.issue(user))
    }

    async fn logout(&self) -> Result<(), BackendError> {
        Ok(())
    }

    async fn verify(&self, token: &str) -> Result<User, BackendError> {
        self.issued
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(token)
            .cloned()
            .ok_or_else(|| {
                BackendError::rejected(MOCK_UNAUTHORIZED_STATUS, "Token verification failed")
            })
    }

    async fn list_charts(&self) -> Result<Vec<ExpenseChart>, BackendError> {
        Ok(Self::charts())
    }

    async fn list_expenses(&self) -> Result<Vec<ExpenseItem>, BackendError> {
        Ok(Self::expenses())
    }

    async fn generate_chart(&self, prompt: &str) -> Result<ExpenseChart, BackendError> {
        Ok(Self::generated_chart(prompt))
    }

    async fn chat_history(&self) -> Result<Vec<ChatTurn>, BackendError> {
        Ok(Vec::new())
    }

    async fn send_message(&self, _message: &str) -> Result<ChatTurn, BackendError> {
        Ok(Self::reply())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Sender;

    #[test]
    fn test_display_name() {
        assert_eq!(MockBackend::display_name("a@b.com"), "a");
        assert_eq!(MockBackend::display_name("jane.doe_x@b.com"), "jane doe x");
        assert_eq!(MockBackend::display_name("no-at-sign"), "no-at-sign");
    }

    #[tokio::test]
    async fn test_login_issues_unique_tokens() {
        let mock = MockBackend::new();
        let creds = LoginCredentials::new("a@b.com", "secret1");

        let first = mock.login(&creds).await.unwrap();
        let second = mock.login(&creds).await.unwrap();

        assert_eq!(first.user.name, "a");
        assert_eq!(first.user.id, "1");
        assert!(first.token.starts_with(MOCK_TOKEN_PREFIX));
        assert_ne!(first.token, second.token);
    }

    #[tokio::test]
    async fn test_login_requires_fields() {
        let mock = MockBackend::new();
        let err = mock.login(&LoginCredentials::default()).await.unwrap_err();
        assert_eq!(err.server_message(), Some("Email and password are required"));
    }

    #[tokio::test]
    async fn test_register_rules() {
        let mock = MockBackend::new();
        let mut creds = RegisterCredentials {
            name: "Ann".to_string(),
            email: "ann@example.com".to_string(),
            password: "abcdef".to_string(),
            confirm_password: "abcxyz".to_string(),
        };

        let err = mock.register(&creds).await.unwrap_err();
        assert_eq!(err.server_message(), Some("Passwords do not match"));

        creds.name.clear();
        let err = mock.register(&creds).await.unwrap_err();
        assert_eq!(err.server_message(), Some("All fields are required"));

        creds.name = "Ann".to_string();
        creds.confirm_password = "abcdef".to_string();
        let payload = mock.register(&creds).await.unwrap();
        assert_eq!(payload.user.name, "Ann");
    }

    #[tokio::test]
    async fn test_verify_only_issued_tokens() {
        let mock = MockBackend::new();
        let payload = mock
            .login(&LoginCredentials::new("a@b.com", "secret1"))
            .await
            .unwrap();

        assert_eq!(mock.verify(&payload.token).await.unwrap(), payload.user);
        assert!(mock.verify("mock_token_0_forged").await.is_err());
    }

    #[tokio::test]
    async fn test_data_producers() {
        let mock = MockBackend::new();

        let charts = mock.list_charts().await.unwrap();
        assert_eq!(charts.len(), 3);
        assert_eq!(charts[0].kind, ChartKind::Pie);
        assert_eq!(charts[2].period, ChartPeriod::Daily);

        assert_eq!(mock.list_expenses().await.unwrap().len(), 5);
        assert!(mock.chat_history().await.unwrap().is_empty());

        let generated = mock.generate_chart("rent").await.unwrap();
        assert_eq!(generated.title, "Generated Chart: rent");
        assert_eq!(generated.data.len(), 4);
        assert!(generated
            .data
            .iter()
            .all(|d| (100.0..600.0).contains(&d.value)));

        let reply = mock.send_message("hi").await.unwrap();
        assert_eq!(reply.sender, Sender::Assistant);
        assert!(CANNED_REPLIES.contains(&reply.content.as_str()));
    }
}
