use std::sync::Arc;

use parking_lot::Mutex;

use super::error::RepositoryResult;
use super::session_repository::{SessionRepository, StoredPayload};

/// In-memory repository for the session collection.
/// Keeps the serialized JSON text, so reads go through the same parsing as
/// the file repository. Useful for testing and development.
#[derive(Clone, Default)]
pub struct InMemorySessionRepository {
    contents: Arc<Mutex<Option<String>>>,
}

impl InMemorySessionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with raw stored text, e.g. an old or corrupted record
    pub fn with_raw(raw: impl Into<String>) -> Self {
        Self {
            contents: Arc::new(Mutex::new(Some(raw.into()))),
        }
    }

    /// The raw text currently stored
    pub fn raw(&self) -> Option<String> {
        self.contents.lock().clone()
    }
}

impl SessionRepository for InMemorySessionRepository {
    fn load(&self) -> RepositoryResult<Option<StoredPayload>> {
        let contents = self.contents.lock();
        match contents.as_deref() {
            Some(raw) => Ok(Some(serde_json::from_str(raw)?)),
            None => Ok(None),
        }
    }

    fn save(&self, payload: &StoredPayload) -> RepositoryResult<()> {
        let json = serde_json::to_string(payload)?;
        *self.contents.lock() = Some(json);
        Ok(())
    }
}
