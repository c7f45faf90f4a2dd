use std::path::{Path, PathBuf};

use super::error::{RepositoryError, RepositoryResult};
use super::session_repository::{STORAGE_KEY, SessionRepository, StoredPayload};

/// JSON file-based repository for the session collection.
/// Stores everything in a single file, by default
/// `<data dir>/banx/banx_chats.json`.
pub struct SessionJsonRepository {
    path: PathBuf,
}

impl SessionJsonRepository {
    pub fn new() -> RepositoryResult<Self> {
        let data_dir = dirs::data_dir()
            .ok_or_else(|| RepositoryError::InitializationError {
                message: "Could not determine data directory".to_string(),
            })?
            .join("banx");

        Ok(Self::with_path(data_dir.join(format!("{STORAGE_KEY}.json"))))
    }

    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionRepository for SessionJsonRepository {
    fn load(&self) -> RepositoryResult<Option<StoredPayload>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(None);
        }

        let payload: StoredPayload = serde_json::from_str(&content)?;
        Ok(Some(payload))
    }

    fn save(&self, payload: &StoredPayload) -> RepositoryResult<()> {
        // Ensure directory exists
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(payload)?;

        // Write to file atomically (write to temp, then rename)
        let temp_path = self.path.with_extension("json.tmp");
        std::fs::write(&temp_path, json)?;
        std::fs::rename(&temp_path, &self.path)?;

        Ok(())
    }
}
