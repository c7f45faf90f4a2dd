use tracing::{debug, info};

use super::message::ChatMessage;
use super::session::ChatSession;
use crate::services::title_generator::DEFAULT_TITLE;

/// Everything the persistence layer needs to write out
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoreSnapshot {
    pub active_session_id: String,
    pub sessions: Vec<ChatSession>,
}

/// The collection of all chat sessions and the active-session pointer.
///
/// Sessions are kept in a `Vec` so that insertion order survives until the
/// next sort: new sessions go to the front, and pruning treats index 0 as the
/// permanent slot. Reads through [`SessionStore::list_sessions`] are always
/// sorted by `(updated_at desc, created_at desc)`.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: Vec<ChatSession>,
    active_session_id: String,
    /// Last timestamp handed out; keeps touches strictly increasing
    last_timestamp: i64,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Populate the store from a persisted snapshot.
    ///
    /// Creates one empty session when nothing was persisted, and falls back to
    /// the first stored session when the persisted active id is missing or
    /// does not name a stored session.
    pub fn initialize(&mut self, persisted: Option<StoreSnapshot>) {
        if let Some(snapshot) = persisted {
            self.last_timestamp = snapshot
                .sessions
                .iter()
                .map(|s| s.updated_at.max(s.created_at))
                .max()
                .unwrap_or_default();
            self.sessions = snapshot.sessions;
            self.active_session_id = snapshot.active_session_id;
            info!(count = self.sessions.len(), "Restored sessions");
        }

        if self.sessions.is_empty() {
            info!("No stored sessions, creating initial session");
            let id = self.create_session(Vec::new());
            self.active_session_id = id;
        }

        if !self.contains(&self.active_session_id) {
            let fallback = self.sessions[0].id.clone();
            debug!(
                stale_id = %self.active_session_id,
                fallback = %fallback,
                "Active session missing, falling back to first stored session"
            );
            self.active_session_id = fallback;
        }

        self.sort();
    }

    /// Current time in milliseconds, strictly greater than any earlier value
    /// until the clock saturates at `i64::MAX`
    pub fn now(&mut self) -> i64 {
        let now = chrono::Utc::now().timestamp_millis();
        self.last_timestamp = now.max(self.last_timestamp.saturating_add(1));
        self.last_timestamp
    }

    /// Insert a new session at the front and return its id. Does not persist.
    pub fn create_session(&mut self, initial_messages: Vec<ChatMessage>) -> String {
        let id = uuid::Uuid::new_v4().to_string();
        let timestamp = self.now();
        let session = ChatSession::new(id.clone(), timestamp, initial_messages);
        debug!(session_id = %id, title = %session.title, "Created session");
        self.sessions.insert(0, session);
        id
    }

    /// Sorted, owned snapshot of all sessions
    pub fn list_sessions(&self) -> Vec<ChatSession> {
        let mut sessions = self.sessions.clone();
        sort_sessions(&mut sessions);
        sessions
    }

    pub fn sort(&mut self) {
        sort_sessions(&mut self.sessions);
    }

    /// Mark a session as recently used. Returns `false` for unknown ids.
    pub fn touch(&mut self, id: &str) -> bool {
        let timestamp = self.now();
        match self.get_mut(id) {
            Some(session) => {
                session.touch(timestamp);
                true
            }
            None => false,
        }
    }

    /// Drop every empty session except the one at index 0
    pub fn prune_empty_trailing(&mut self) {
        if self.sessions.len() <= 1 {
            return;
        }

        let before = self.sessions.len();
        let mut index = 0;
        self.sessions.retain(|session| {
            let keep = index == 0 || !session.is_empty();
            index += 1;
            keep
        });

        let removed = before - self.sessions.len();
        if removed > 0 {
            debug!(removed, "Pruned empty sessions");
        }
    }

    pub fn get(&self, id: &str) -> Option<&ChatSession> {
        self.sessions.iter().find(|session| session.id == id)
    }

    fn get_mut(&mut self, id: &str) -> Option<&mut ChatSession> {
        self.sessions.iter_mut().find(|session| session.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn active_id(&self) -> &str {
        &self.active_session_id
    }

    /// Switch the active pointer. Unknown ids leave the store unchanged.
    pub fn set_active(&mut self, id: &str) -> bool {
        if self.contains(id) {
            self.active_session_id = id.to_string();
            true
        } else {
            false
        }
    }

    pub fn active_session(&self) -> Option<&ChatSession> {
        self.get(&self.active_session_id)
    }

    pub fn active_title(&self) -> &str {
        self.active_session()
            .map(|session| session.title.as_str())
            .unwrap_or(DEFAULT_TITLE)
    }

    /// Copy the live message list into the active session.
    ///
    /// Re-derives a placeholder title, touches the session and re-sorts.
    /// Returns `false` when there is no active session.
    pub fn sync_active(&mut self, messages: &[ChatMessage]) -> bool {
        let timestamp = self.now();
        let active_id = self.active_session_id.clone();
        let Some(active) = self.get_mut(&active_id) else {
            return false;
        };

        active.messages = messages.to_vec();
        active.ensure_title();
        active.touch(timestamp);
        self.sort();
        true
    }

    /// Empty the active session and reset its title
    pub fn clear_active(&mut self) -> bool {
        let timestamp = self.now();
        let active_id = self.active_session_id.clone();
        let Some(active) = self.get_mut(&active_id) else {
            return false;
        };

        active.messages.clear();
        active.title = DEFAULT_TITLE.to_string();
        active.touch(timestamp);
        self.sort();
        true
    }

    pub fn snapshot(&self) -> StoreSnapshot {
        StoreSnapshot {
            active_session_id: self.active_session_id.clone(),
            sessions: self.sessions.clone(),
        }
    }

    pub fn count(&self) -> usize {
        self.sessions.len()
    }
}

fn sort_sessions(sessions: &mut [ChatSession]) {
    sessions.sort_by(|a, b| {
        b.updated_at
            .cmp(&a.updated_at)
            .then_with(|| b.created_at.cmp(&a.created_at))
    });
}
