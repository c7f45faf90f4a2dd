use serde::{Deserialize, Serialize};

use super::message::ChatMessage;
use crate::services::title_generator::{DEFAULT_TITLE, generate_title, is_placeholder};

/// A persisted conversation: ordered messages plus sidebar metadata
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatSession {
    pub id: String,
    pub title: String,
    /// Unix timestamp in milliseconds
    pub created_at: i64,
    /// Unix timestamp in milliseconds
    pub updated_at: i64,
    pub messages: Vec<ChatMessage>,
}

impl ChatSession {
    pub fn new(id: String, timestamp: i64, messages: Vec<ChatMessage>) -> Self {
        let mut session = Self {
            id,
            title: DEFAULT_TITLE.to_string(),
            created_at: timestamp,
            updated_at: timestamp,
            messages,
        };
        session.ensure_title();
        session
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn message_count(&self) -> usize {
        self.messages.len()
    }

    /// Recompute the title while it is still the placeholder.
    ///
    /// An emptied session goes back to the placeholder; a session that already
    /// has a derived title keeps it.
    pub fn ensure_title(&mut self) {
        if self.messages.is_empty() {
            self.title = DEFAULT_TITLE.to_string();
            return;
        }
        if !is_placeholder(&self.title) {
            return;
        }
        if let Some(title) = generate_title(&self.messages) {
            self.title = title;
        }
    }

    pub fn touch(&mut self, timestamp: i64) {
        self.updated_at = timestamp.max(self.created_at);
    }
}
