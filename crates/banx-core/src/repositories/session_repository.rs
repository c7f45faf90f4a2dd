use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::warn;

use super::error::RepositoryResult;
use crate::models::{ChatMessage, ChatSession, StoreSnapshot};
use crate::services::title_generator::DEFAULT_TITLE;

/// Storage key under which the whole session collection is written
pub const STORAGE_KEY: &str = "banx_chats";

/// One session as written to storage.
///
/// Everything except `id` is optional so that older or partially written
/// records still load; missing fields are backfilled in
/// [`StoredPayload::into_snapshot`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredSession {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub created_at: Option<i64>,
    #[serde(default)]
    pub updated_at: Option<i64>,
    #[serde(default, deserialize_with = "deserialize_messages")]
    pub messages: Option<Vec<ChatMessage>>,
}

/// Serializable session collection for persistence
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredPayload {
    #[serde(default)]
    pub active_session_id: Option<String>,
    #[serde(default, deserialize_with = "deserialize_sessions")]
    pub sessions: Option<Vec<StoredSession>>,
}

/// Read a JSON array element by element, dropping elements `parse` rejects.
/// Anything other than an array reads as absent.
fn lenient_list<T>(value: Option<Value>, parse: impl Fn(Value) -> Option<T>) -> Option<Vec<T>> {
    match value? {
        Value::Array(items) => Some(items.into_iter().filter_map(parse).collect()),
        Value::Null => None,
        other => {
            warn!(found = %json_kind(&other), "Expected a stored list, ignoring value");
            None
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn deserialize_sessions<'de, D>(deserializer: D) -> Result<Option<Vec<StoredSession>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(lenient_list(value, |item| match serde_json::from_value(item) {
        Ok(session) => Some(session),
        Err(e) => {
            warn!(error = ?e, "Dropping unreadable stored session");
            None
        }
    }))
}

fn deserialize_messages<'de, D>(deserializer: D) -> Result<Option<Vec<ChatMessage>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(lenient_list(value, parse_stored_message))
}

/// Parse one stored message. A broken attachment costs only the attachment;
/// a message that is unreadable without it is dropped.
fn parse_stored_message(value: Value) -> Option<ChatMessage> {
    let error = match serde_json::from_value::<ChatMessage>(value.clone()) {
        Ok(message) => return Some(message),
        Err(e) => e,
    };

    if let Value::Object(mut fields) = value
        && fields.remove("attachment").is_some()
        && let Ok(message) = serde_json::from_value::<ChatMessage>(Value::Object(fields))
    {
        warn!(error = ?error, message_id = %message.id, "Dropping unreadable attachment");
        return Some(message);
    }

    warn!(error = ?error, "Dropping unreadable stored message");
    None
}

impl StoredPayload {
    pub fn from_snapshot(snapshot: &StoreSnapshot) -> Self {
        Self {
            active_session_id: Some(snapshot.active_session_id.clone()),
            sessions: Some(
                snapshot
                    .sessions
                    .iter()
                    .map(|session| StoredSession {
                        id: Some(session.id.clone()),
                        title: Some(session.title.clone()),
                        created_at: Some(session.created_at),
                        updated_at: Some(session.updated_at),
                        messages: Some(session.messages.clone()),
                    })
                    .collect(),
            ),
        }
    }

    /// Convert into a store snapshot, filling gaps with safe defaults.
    ///
    /// Returns `None` when the payload holds no session list at all. Sessions
    /// without an id are dropped.
    pub fn into_snapshot(self, now: i64) -> Option<StoreSnapshot> {
        let stored = self.sessions?;

        let sessions: Vec<ChatSession> = stored
            .into_iter()
            .filter_map(|session| {
                let Some(id) = session.id.filter(|id| !id.is_empty()) else {
                    warn!("Dropping stored session without an id");
                    return None;
                };
                let title = session
                    .title
                    .filter(|title| !title.trim().is_empty())
                    .unwrap_or_else(|| DEFAULT_TITLE.to_string());
                let created_at = session.created_at.unwrap_or(now);
                let updated_at = session.updated_at.unwrap_or(created_at).max(created_at);

                Some(ChatSession {
                    id,
                    title,
                    created_at,
                    updated_at,
                    messages: session.messages.unwrap_or_default(),
                })
            })
            .collect();

        let active_session_id = self
            .active_session_id
            .or_else(|| sessions.first().map(|session| session.id.clone()))
            .unwrap_or_default();

        Some(StoreSnapshot {
            active_session_id,
            sessions,
        })
    }
}

/// Repository trait for the durable session collection
pub trait SessionRepository: Send + Sync + 'static {
    /// Load the stored payload; `Ok(None)` when nothing was written yet
    fn load(&self) -> RepositoryResult<Option<StoredPayload>>;

    /// Replace the stored payload
    fn save(&self, payload: &StoredPayload) -> RepositoryResult<()>;
}
