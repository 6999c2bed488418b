//! Conversation types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{now_millis, unique_suffix};

/// Who authored a chat turn
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Assistant,
}

/// One turn of the conversation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatTurn {
    pub id: String,
    pub content: String,
    pub sender: Sender,
    pub timestamp: DateTime<Utc>,
}

impl ChatTurn {
    /// A locally-originated user turn with a time-derived id
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            id: format!("user-{}-{}", now_millis(), unique_suffix()),
            content: content.into(),
            sender: Sender::User,
            timestamp: Utc::now(),
        }
    }

    /// An assistant turn with a time-derived id
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            id: format!("msg-{}-{}", now_millis(), unique_suffix()),
            content: content.into(),
            sender: Sender::Assistant,
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_turn_ids_unique() {
        let a = ChatTurn::user("hi");
        let b = ChatTurn::user("hi");
        assert_ne!(a.id, b.id);
        assert!(a.id.starts_with("user-"));
        assert!(ChatTurn::assistant("hello").id.starts_with("msg-"));
    }

    #[test]
    fn test_turn_from_api() {
        let json = r#"{
            "id": "42",
            "content": "You spent $120 on groceries.",
            "sender": "assistant",
            "timestamp": "2024-01-15T10:30:00Z"
        }"#;
        let turn: ChatTurn = serde_json::from_str(json).unwrap();
        assert_eq!(turn.sender, Sender::Assistant);
        assert_eq!(turn.timestamp.to_rfc3339(), "2024-01-15T10:30:00+00:00");
    }
}
