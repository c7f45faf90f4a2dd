use std::sync::Arc;

use tracing::{debug, warn};

use super::session_repository::{SessionRepository, StoredPayload};
use crate::models::StoreSnapshot;

/// Best-effort persistence on top of a [`SessionRepository`].
///
/// Failures are logged and absorbed: a broken disk must never interrupt the
/// conversation.
#[derive(Clone)]
pub struct SessionPersistence {
    repository: Arc<dyn SessionRepository>,
}

impl SessionPersistence {
    pub fn new(repository: Arc<dyn SessionRepository>) -> Self {
        Self { repository }
    }

    pub fn save(&self, snapshot: &StoreSnapshot) {
        let payload = StoredPayload::from_snapshot(snapshot);
        match self.repository.save(&payload) {
            Ok(()) => debug!(
                sessions = snapshot.sessions.len(),
                active = %snapshot.active_session_id,
                "Persisted sessions"
            ),
            Err(e) => warn!(error = ?e, "Failed to persist sessions"),
        }
    }

    /// Load the stored sessions; `None` when nothing usable was stored
    pub fn load(&self) -> Option<StoreSnapshot> {
        let payload = match self.repository.load() {
            Ok(Some(payload)) => payload,
            Ok(None) => return None,
            Err(e) => {
                warn!(error = ?e, "Failed to restore sessions from storage");
                return None;
            }
        };

        payload.into_snapshot(chrono::Utc::now().timestamp_millis())
    }
}
