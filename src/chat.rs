//! Chat Coordinator
//!
//! Conversation with the expense assistant. A send appends the user's turn
//! immediately, then the assistant's reply once the backend answers. Only one
//! send may be in flight at a time.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::backend::{Backend, CHAT_SUGGESTIONS};
use crate::models::ChatTurn;
use crate::resource::{RequestState, ResourceFetcher};

const HISTORY_FAILED: &str = "Failed to fetch chat history";
const SEND_FAILED: &str = "Failed to send message";

/// Default simulated typing delay before a reply is requested
pub const DEFAULT_TYPING_DELAY: Duration = Duration::from_millis(1000);

/// Chat transcript and send flow
pub struct ChatCoordinator {
    backend: Arc<dyn Backend>,
    turns: ResourceFetcher<ChatTurn>,
    typing_delay: Duration,
    /// Ids of user turns whose send failed
    undelivered: Mutex<HashSet<String>>,
}

impl ChatCoordinator {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self::with_typing_delay(backend, DEFAULT_TYPING_DELAY)
    }

    pub fn with_typing_delay(backend: Arc<dyn Backend>, typing_delay: Duration) -> Self {
        Self {
            backend,
            turns: ResourceFetcher::new("chat", HISTORY_FAILED),
            typing_delay,
            undelivered: Mutex::new(HashSet::new()),
        }
    }

    /// Transcript state; `is_loading` is true while a send or history load is running
    pub fn state(&self) -> RequestState<Vec<ChatTurn>> {
        self.turns.snapshot()
    }

    pub fn turns(&self) -> Vec<ChatTurn> {
        self.turns.data()
    }

    pub fn is_loading(&self) -> bool {
        self.turns.is_loading()
    }

    /// True while a message is being sent
    pub fn is_sending(&self) -> bool {
        self.turns.is_sending()
    }

    pub fn error(&self) -> Option<String> {
        self.turns.error()
    }

    pub fn typing_delay(&self) -> Duration {
        self.typing_delay
    }

    /// Whether the user turn with `id` failed to send
    pub fn is_undelivered(&self, id: &str) -> bool {
        self.undelivered_ids().contains(id)
    }

    fn undelivered_ids(&self) -> std::sync::MutexGuard<'_, HashSet<String>> {
        self.undelivered
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Prompts offered to a user who has not typed anything yet
    pub fn suggestions(&self) -> &'static [&'static str] {
        &CHAT_SUGGESTIONS
    }

    /// Replace the transcript with the server's history
    ///
    /// Turns added by a send while the load runs are kept after the history.
    pub async fn load_history(&self) -> Result<(), String> {
        self.turns.fetch(self.backend.chat_history()).await?;
        self.undelivered_ids().clear();
        Ok(())
    }

    /// Send a message and append the assistant's reply
    ///
    /// Returns `Ok(None)` without doing anything when `text` is blank or a
    /// send is already in flight. On failure the user's turn stays in the
    /// transcript, marked undelivered.
    pub async fn send_message(&self, text: &str) -> Result<Option<ChatTurn>, String> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(None);
        }

        let turn = ChatTurn::user(text);
        let turn_id = turn.id.clone();
        if !self.turns.begin_with(turn) {
            tracing::debug!("Send already in flight, ignoring message");
            return Ok(None);
        }

        if !self.typing_delay.is_zero() {
            tokio::time::sleep(self.typing_delay).await;
        }

        let result = self.backend.send_message(text).await;
        match self.turns.finish(result, SEND_FAILED) {
            Ok(reply) => Ok(Some(reply)),
            Err(message) => {
                self.undelivered_ids().insert(turn_id);
                Err(message)
            }
        }
    }

    /// Drop the transcript, any error and every undelivered mark
    pub fn clear_chat(&self) {
        self.turns.reset();
        self.undelivered_ids().clear();
    }

    pub fn clear_error(&self) {
        self.turns.clear_error();
    }
}
