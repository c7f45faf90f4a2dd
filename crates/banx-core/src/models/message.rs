use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

/// A file prepared by the attachment provider.
///
/// Images carry a base64 data URL; documents carry their extracted plain text
/// and a short preview. Values are never modified after preparation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Attachment {
    #[serde(rename_all = "camelCase")]
    Image {
        name: String,
        mime_type: String,
        #[serde(alias = "size")]
        size_bytes: u64,
        data_url: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        width: Option<u32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        height: Option<u32>,
    },
    #[serde(rename_all = "camelCase")]
    Document {
        name: String,
        mime_type: String,
        #[serde(alias = "size")]
        size_bytes: u64,
        extracted_text: String,
        snippet: String,
    },
}

impl Attachment {
    pub fn name(&self) -> &str {
        match self {
            Attachment::Image { name, .. } | Attachment::Document { name, .. } => name,
        }
    }

    pub fn mime_type(&self) -> &str {
        match self {
            Attachment::Image { mime_type, .. } | Attachment::Document { mime_type, .. } => {
                mime_type
            }
        }
    }

    pub fn size_bytes(&self) -> u64 {
        match self {
            Attachment::Image { size_bytes, .. } | Attachment::Document { size_bytes, .. } => {
                *size_bytes
            }
        }
    }
}

/// One entry of a conversation
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    #[serde(default = "new_message_id")]
    pub id: String,
    pub role: ChatRole,
    #[serde(default)]
    pub content: String,
    /// Unix timestamp in milliseconds; `0` when an older record lacks it
    #[serde(default)]
    pub created_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment: Option<Attachment>,
}

fn new_message_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

impl ChatMessage {
    pub fn new(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            id: new_message_id(),
            role,
            content: content.into(),
            created_at: chrono::Utc::now().timestamp_millis(),
            attachment: None,
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(ChatRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(ChatRole::Assistant, content)
    }

    pub fn with_attachment(mut self, attachment: Attachment) -> Self {
        self.attachment = Some(attachment);
        self
    }
}
