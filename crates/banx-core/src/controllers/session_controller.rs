use std::sync::Arc;

use parking_lot::Mutex;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::models::{
    Attachment, ChatMessage, ChatSession, ConversationState, MessageListener, SessionStore,
};
use crate::repositories::{SessionPersistence, SessionRepository};
use crate::services::{AttachmentError, ChatError, ModelClient, StreamAssembler, build_request};
use crate::settings::ChatSettings;

/// What the user submitted
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SendRequest {
    pub content: String,
    pub attachment: Option<Attachment>,
}

impl SendRequest {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            attachment: None,
        }
    }

    pub fn with_attachment(mut self, attachment: Attachment) -> Self {
        self.attachment = Some(attachment);
        self
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SendError {
    #[error("{0}")]
    Attachment(#[from] AttachmentError),

    #[error("{0}")]
    Chat(#[from] ChatError),
}

/// The session store together with its persistence.
///
/// Registered as the conversation's listener so every change to the live
/// message list is copied into the active session and written out before the
/// mutating call returns.
struct SessionMirror {
    store: Mutex<SessionStore>,
    persistence: SessionPersistence,
}

impl SessionMirror {
    fn with_store<R>(&self, f: impl FnOnce(&mut SessionStore) -> R) -> R {
        f(&mut self.store.lock())
    }

    fn persist(&self) {
        let snapshot = self.store.lock().snapshot();
        self.persistence.save(&snapshot);
    }

    fn flush(&self, messages: &[ChatMessage]) {
        let snapshot = {
            let mut store = self.store.lock();
            if !store.sync_active(messages) {
                debug!("No active session to flush into");
            }
            store.snapshot()
        };
        self.persistence.save(&snapshot);
    }
}

impl MessageListener for SessionMirror {
    fn messages_changed(&self, messages: &[ChatMessage]) {
        self.flush(messages);
    }
}

/// Owns the live conversation and keeps the active session in step with it
pub struct SessionController {
    conversation: ConversationState,
    mirror: Arc<SessionMirror>,
    client: ModelClient,
    initialized: bool,
}

impl SessionController {
    pub fn new(settings: ChatSettings, repository: Arc<dyn SessionRepository>) -> Self {
        Self::with_client(ModelClient::new(settings), repository)
    }

    pub fn with_client(client: ModelClient, repository: Arc<dyn SessionRepository>) -> Self {
        Self {
            conversation: ConversationState::new(),
            mirror: Arc::new(SessionMirror {
                store: Mutex::new(SessionStore::new()),
                persistence: SessionPersistence::new(repository),
            }),
            client,
            initialized: false,
        }
    }

    /// Restore sessions, hydrate the conversation from the active one and
    /// start mirroring changes. Runs once; later calls do nothing.
    pub fn initialize(&mut self) {
        if self.initialized {
            return;
        }

        let persisted = self.mirror.persistence.load();
        let messages = self.mirror.with_store(|store| {
            store.initialize(persisted);
            active_messages(store)
        });

        self.conversation.replace_messages(&messages);
        self.conversation.clear_error();
        self.conversation.set_listener(self.mirror.clone());
        self.mirror.persist();
        self.initialized = true;

        info!(
            sessions = self.mirror.with_store(|store| store.count()),
            active = %self.active_session_id(),
            "Session controller initialized"
        );
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Copy the live messages into the active session and persist
    pub fn sync_active_session(&mut self) {
        self.initialize();
        self.mirror.flush(self.conversation.messages());
    }

    /// Make `id` the active session. Returns `false` for unknown ids, in which
    /// case only the flush of the current session has happened.
    pub fn select_session(&mut self, id: &str) -> bool {
        self.initialize();

        if self.mirror.with_store(|store| store.active_id() == id) {
            let messages = self.mirror.with_store(|store| active_messages(store));
            self.conversation.replace_messages(&messages);
            self.conversation.clear_error();
            return true;
        }

        self.sync_active_session();

        let switched = self.mirror.with_store(|store| {
            if !store.set_active(id) {
                return None;
            }
            store.touch(id);
            store.sort();
            Some(active_messages(store))
        });

        let Some(messages) = switched else {
            warn!(session_id = %id, "Cannot select unknown session");
            return false;
        };

        self.conversation.replace_messages(&messages);
        self.conversation.clear_error();
        self.mirror.persist();
        debug!(session_id = %id, "Selected session");
        true
    }

    /// Open a fresh conversation and return its session id.
    ///
    /// An active session that is still empty is reused instead of creating
    /// another one.
    pub fn start_new_session(&mut self) -> String {
        self.sync_active_session();

        let id = self.mirror.with_store(|store| {
            let reusable = store
                .active_session()
                .is_some_and(|session| session.is_empty());

            let id = if reusable {
                let id = store.active_id().to_string();
                store.touch(&id);
                id
            } else {
                let id = store.create_session(Vec::new());
                store.set_active(&id);
                store.prune_empty_trailing();
                id
            };
            store.sort();
            id
        });

        self.conversation.reset();
        self.mirror.persist();
        info!(session_id = %id, "Started new session");
        id
    }

    /// Remove every message from the active session
    pub fn clear_active_session(&mut self) {
        self.initialize();
        self.mirror.with_store(|store| store.clear_active());
        self.conversation.reset();
        self.mirror.persist();
    }

    /// Send the user's message and stream the reply into the conversation.
    ///
    /// Blank content without an attachment is ignored. On failure the
    /// normalized error is recorded on the conversation and returned; the
    /// assistant message keeps whatever arrived before the failure.
    pub async fn send_message(&mut self, request: SendRequest) -> Result<(), SendError> {
        self.initialize();

        let SendRequest {
            content,
            attachment,
        } = request;
        let content = content.trim();
        if content.is_empty() && attachment.is_none() {
            return Ok(());
        }

        let chat_request = build_request(self.client.settings(), content, attachment.as_ref());
        self.conversation.push_user_message(content, attachment);
        let slot = self.conversation.start_assistant_message();

        debug!(
            model = %chat_request.model,
            mock = self.client.is_mock(),
            "Sending message"
        );

        let result = match self.client.stream(&chat_request).await {
            Ok(stream) => {
                StreamAssembler::new(&mut self.conversation, slot)
                    .consume(stream)
                    .await
            }
            Err(failure) => Err(ChatError::from_failure(&failure)),
        };

        match result {
            Ok(outcome) => {
                if let Some(usage) = outcome.usage {
                    info!(
                        input_tokens = usage.input_tokens,
                        output_tokens = usage.output_tokens,
                        total_tokens = usage.total_tokens(),
                        "Token usage"
                    );
                }
                self.conversation.finish_assistant_message();
                Ok(())
            }
            Err(error) => {
                warn!(error = %error, "Message failed");
                self.conversation.fail_assistant_message(error.to_string());
                Err(error.into())
            }
        }
    }

    /// Send with an attachment whose preparation may have failed. A failed
    /// preparation is returned unchanged and leaves the conversation alone.
    pub async fn send_prepared(
        &mut self,
        content: impl Into<String>,
        prepared: Result<Option<Attachment>, AttachmentError>,
    ) -> Result<(), SendError> {
        let attachment = prepared?;
        self.send_message(SendRequest {
            content: content.into(),
            attachment,
        })
        .await
    }

    pub fn list_sessions(&self) -> Vec<ChatSession> {
        self.mirror.with_store(|store| store.list_sessions())
    }

    pub fn session(&self, id: &str) -> Option<ChatSession> {
        self.mirror.with_store(|store| store.get(id).cloned())
    }

    pub fn active_session_id(&self) -> String {
        self.mirror.with_store(|store| store.active_id().to_string())
    }

    pub fn active_session_title(&self) -> String {
        self.mirror.with_store(|store| store.active_title().to_string())
    }

    pub fn conversation(&self) -> &ConversationState {
        &self.conversation
    }

    pub fn select_mode(&mut self, mode_id: &str) {
        self.conversation.select_mode(mode_id);
    }
}

fn active_messages(store: &SessionStore) -> Vec<ChatMessage> {
    store
        .active_session()
        .map(|session| session.messages.clone())
        .unwrap_or_default()
}
