use serde::{Deserialize, Serialize};

use crate::models::Attachment;
use crate::settings::ChatSettings;

const IMAGE_DATA_URL_PREFIX: &str = "data:image/png;base64,";
const DOCUMENT_SEPARATOR: &str = "\n\n---\n\n";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestRole {
    User,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageUrl {
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

/// Message content: a plain string or an ordered list of parts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

impl MessageContent {
    /// The textual part of the content
    pub fn text(&self) -> String {
        match self {
            MessageContent::Text(text) => text.clone(),
            MessageContent::Parts(parts) => parts
                .iter()
                .filter_map(|part| match part {
                    ContentPart::Text { text } => Some(text.as_str()),
                    ContentPart::ImageUrl { .. } => None,
                })
                .collect::<Vec<_>>()
                .join(""),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestMessage {
    pub role: RequestRole,
    pub content: MessageContent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamOptions {
    pub include_usage: bool,
}

/// Body of a streamed chat completion call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<RequestMessage>,
    pub stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream_options: Option<StreamOptions>,
}

impl ChatRequest {
    fn single_user_message(model: &str, content: MessageContent) -> Self {
        Self {
            model: model.to_string(),
            messages: vec![RequestMessage {
                role: RequestRole::User,
                content,
            }],
            stream: true,
            stream_options: None,
        }
    }

    fn with_usage(mut self) -> Self {
        self.stream_options = Some(StreamOptions {
            include_usage: true,
        });
        self
    }

    /// Text of the final message, echoed by the offline mock reply
    pub fn last_message_text(&self) -> String {
        self.messages
            .last()
            .map(|message| message.content.text())
            .unwrap_or_default()
    }
}

/// Plain prompt for the text model
pub fn build_text_request(settings: &ChatSettings, prompt: &str) -> ChatRequest {
    ChatRequest::single_user_message(
        &settings.text_model,
        MessageContent::Text(prompt.trim().to_string()),
    )
}

/// Optional prompt followed by the image for the vision model
pub fn build_vision_request(settings: &ChatSettings, prompt: &str, data_url: &str) -> ChatRequest {
    let url = if data_url.starts_with("data:") {
        data_url.to_string()
    } else {
        format!("{IMAGE_DATA_URL_PREFIX}{data_url}")
    };

    let mut parts = Vec::with_capacity(2);
    let trimmed = prompt.trim();
    if !trimmed.is_empty() {
        parts.push(ContentPart::Text {
            text: trimmed.to_string(),
        });
    }
    parts.push(ContentPart::ImageUrl {
        image_url: ImageUrl { url },
    });

    ChatRequest::single_user_message(&settings.vision_model, MessageContent::Parts(parts))
        .with_usage()
}

/// Prompt and extracted document text, separated by a rule, for the document model
pub fn build_document_request(
    settings: &ChatSettings,
    prompt: &str,
    extracted_text: &str,
) -> ChatRequest {
    let combined = [prompt.trim(), extracted_text.trim()]
        .into_iter()
        .filter(|piece| !piece.is_empty())
        .collect::<Vec<_>>()
        .join(DOCUMENT_SEPARATOR);

    ChatRequest::single_user_message(&settings.document_model, MessageContent::Text(combined))
        .with_usage()
}

/// Pick the request shape from the attachment variant
pub fn build_request(
    settings: &ChatSettings,
    prompt: &str,
    attachment: Option<&Attachment>,
) -> ChatRequest {
    match attachment {
        None => build_text_request(settings, prompt),
        Some(Attachment::Image { data_url, .. }) => build_vision_request(settings, prompt, data_url),
        Some(Attachment::Document { extracted_text, .. }) => {
            build_document_request(settings, prompt, extracted_text)
        }
    }
}
