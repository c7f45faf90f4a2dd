use std::sync::Arc;

use tracing::warn;

use super::chat_mode::{ChatMode, DEFAULT_MODE_ID, find_mode};
use super::message::{Attachment, ChatMessage, ChatRole};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ChatStatus {
    #[default]
    Idle,
    Loading,
    Error,
}

/// Receives an explicit call after every change to the live message list
pub trait MessageListener: Send + Sync {
    fn messages_changed(&self, messages: &[ChatMessage]);
}

/// Handle to the assistant message that a running stream fills in
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AssistantSlot {
    index: usize,
    message_id: String,
}

impl AssistantSlot {
    pub fn message_id(&self) -> &str {
        &self.message_id
    }
}

/// The live view of the conversation currently shown.
///
/// Hydration (`replace_messages`, `reset`) is silent; content mutations
/// (`push_*`, `append_to`) notify the registered listener.
pub struct ConversationState {
    messages: Vec<ChatMessage>,
    status: ChatStatus,
    error_message: Option<String>,
    selected_mode_id: String,
    listener: Option<Arc<dyn MessageListener>>,
}

impl ConversationState {
    pub fn new() -> Self {
        Self {
            messages: Vec::new(),
            status: ChatStatus::Idle,
            error_message: None,
            selected_mode_id: DEFAULT_MODE_ID.to_string(),
            listener: None,
        }
    }

    pub fn set_listener(&mut self, listener: Arc<dyn MessageListener>) {
        self.listener = Some(listener);
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn status(&self) -> ChatStatus {
        self.status
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn has_messages(&self) -> bool {
        !self.messages.is_empty()
    }

    pub fn last_message(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }

    fn notify(&self) {
        if let Some(listener) = &self.listener {
            listener.messages_changed(&self.messages);
        }
    }

    /// Replace the whole list with a copy of `messages` without notifying
    pub fn replace_messages(&mut self, messages: &[ChatMessage]) {
        self.messages = messages.to_vec();
    }

    /// Empty the list and return to idle with no error
    pub fn reset(&mut self) {
        self.messages.clear();
        self.error_message = None;
        self.status = ChatStatus::Idle;
    }

    /// Record an error message; `Some` also flips the status to `Error`
    pub fn set_error(&mut self, message: Option<String>) {
        if message.is_some() {
            self.status = ChatStatus::Error;
        }
        self.error_message = message;
    }

    pub fn clear_error(&mut self) {
        self.error_message = None;
        self.status = ChatStatus::Idle;
    }

    /// Append the user's message (content trimmed) and clear any previous error
    pub fn push_user_message(&mut self, content: &str, attachment: Option<Attachment>) {
        self.error_message = None;
        let mut message = ChatMessage::user(content.trim());
        message.attachment = attachment;
        self.messages.push(message);
        self.notify();
    }

    pub fn push_assistant_message(&mut self, content: &str) {
        self.messages.push(ChatMessage::assistant(content));
        self.notify();
    }

    /// Mark the conversation as loading and append an empty assistant message
    pub fn start_assistant_message(&mut self) -> AssistantSlot {
        self.status = ChatStatus::Loading;
        let message = ChatMessage::assistant("");
        let slot = AssistantSlot {
            index: self.messages.len(),
            message_id: message.id.clone(),
        };
        self.messages.push(message);
        self.notify();
        slot
    }

    /// Append a fragment to the slot's message.
    ///
    /// Empty fragments change nothing and do not notify. Returns `false` when
    /// the slot's message is no longer in the list.
    pub fn append_to(&mut self, slot: &AssistantSlot, fragment: &str) -> bool {
        let Some(index) = self.resolve_slot(slot) else {
            warn!(message_id = %slot.message_id, "Assistant slot no longer present");
            return false;
        };
        if fragment.is_empty() {
            return true;
        }

        self.messages[index].content.push_str(fragment);
        self.notify();
        true
    }

    /// Content currently held by the slot's message
    pub fn slot_content(&self, slot: &AssistantSlot) -> Option<&str> {
        self.resolve_slot(slot)
            .map(|index| self.messages[index].content.as_str())
    }

    fn resolve_slot(&self, slot: &AssistantSlot) -> Option<usize> {
        match self.messages.get(slot.index) {
            Some(message) if message.id == slot.message_id => Some(slot.index),
            _ => self.messages.iter().position(|message| {
                message.id == slot.message_id && message.role == ChatRole::Assistant
            }),
        }
    }

    pub fn finish_assistant_message(&mut self) {
        self.status = ChatStatus::Idle;
    }

    pub fn fail_assistant_message(&mut self, error: String) {
        self.status = ChatStatus::Error;
        self.set_error(Some(error));
    }

    pub fn select_mode(&mut self, mode_id: &str) {
        self.selected_mode_id = mode_id.to_string();
        self.set_error(None);
    }

    pub fn selected_mode(&self) -> &'static ChatMode {
        find_mode(&self.selected_mode_id)
    }
}

impl Default for ConversationState {
    fn default() -> Self {
        Self::new()
    }
}
