use std::sync::Arc;

use async_trait::async_trait;
use futures::StreamExt;
use futures::stream::{self, BoxStream};
use tracing::{debug, error, info};

use super::error::InvocationFailure;
use super::request_builder::ChatRequest;
use crate::models::TokenUsage;
use crate::settings::ChatSettings;

/// Stream chunks emitted during responses
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamChunk {
    Text(String),
    Usage(TokenUsage),
    Done,
}

/// Type alias for response streams
pub type ResponseStream = BoxStream<'static, Result<StreamChunk, InvocationFailure>>;

/// Something that can open a streamed chat completion
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    async fn stream_chat(&self, request: &ChatRequest) -> Result<ResponseStream, InvocationFailure>;
}

/// OpenAI-compatible chat completions over Server-Sent Events
pub struct OpenRouterBackend {
    client: reqwest::Client,
    settings: ChatSettings,
    api_key: String,
}

impl OpenRouterBackend {
    pub fn new(settings: ChatSettings, api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            settings,
            api_key,
        }
    }
}

#[async_trait]
impl CompletionBackend for OpenRouterBackend {
    async fn stream_chat(&self, request: &ChatRequest) -> Result<ResponseStream, InvocationFailure> {
        let url = self.settings.chat_completions_url();
        debug!(model = %request.model, url = %url, "Opening completion stream");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .header("HTTP-Referer", &self.settings.app_origin)
            .header("X-Title", &self.settings.app_title)
            .header("Accept", "text/event-stream")
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(status = status.as_u16(), "Completion request rejected");
            let message = error_message_from_body(&body)
                .or_else(|| status.canonical_reason().map(str::to_string));
            return Err(InvocationFailure::new(Some(status.as_u16()), message));
        }

        let mut byte_stream = response.bytes_stream();
        let stream = async_stream::stream! {
            let mut buffer: Vec<u8> = Vec::new();

            while let Some(chunk_result) = byte_stream.next().await {
                let bytes = match chunk_result {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        yield Err(InvocationFailure::from(e));
                        return;
                    }
                };
                buffer.extend_from_slice(&bytes);

                // Process complete lines (SSE format: "data: {json}\n\n")
                while let Some(line_end) = buffer.iter().position(|b| *b == b'\n') {
                    let line: Vec<u8> = buffer.drain(..=line_end).collect();
                    let line = String::from_utf8_lossy(&line);
                    for event in parse_sse_line(&line) {
                        let stop = matches!(event, Ok(StreamChunk::Done) | Err(_));
                        yield event;
                        if stop {
                            return;
                        }
                    }
                }
            }

            // Process any remaining data in the buffer
            if !buffer.is_empty() {
                let line = String::from_utf8_lossy(&buffer).into_owned();
                for event in parse_sse_line(&line) {
                    yield event;
                }
            }
        };

        Ok(Box::pin(stream))
    }
}

/// Pull a human-readable message out of an API error body
fn error_message_from_body(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value["error"]["message"]
        .as_str()
        .or_else(|| value["message"].as_str())
        .filter(|message| !message.is_empty())
        .map(str::to_string)
}

/// Decode one SSE line into zero or more chunks.
///
/// Comment lines (`: keep-alive`) and non-data fields are ignored; an
/// in-band `{"error": ...}` object becomes a failure.
pub(crate) fn parse_sse_line(line: &str) -> Vec<Result<StreamChunk, InvocationFailure>> {
    let line = line.trim();
    let Some(data) = line.strip_prefix("data:") else {
        return Vec::new();
    };
    let data = data.trim_start();

    if data == "[DONE]" {
        return vec![Ok(StreamChunk::Done)];
    }

    let value: serde_json::Value = match serde_json::from_str(data) {
        Ok(value) => value,
        Err(e) => {
            debug!(error = ?e, "Skipping unparseable stream line");
            return Vec::new();
        }
    };

    if let Some(err) = value.get("error") {
        let status = err["code"].as_u64().and_then(|code| u16::try_from(code).ok());
        let message = err["message"].as_str().map(str::to_string);
        return vec![Err(InvocationFailure::new(status, message))];
    }

    let mut chunks = Vec::new();
    if let Some(piece) = value["choices"][0]["delta"]["content"].as_str()
        && !piece.is_empty()
    {
        chunks.push(Ok(StreamChunk::Text(piece.to_string())));
    }
    if let Some(usage) = value.get("usage").filter(|usage| !usage.is_null())
        && let Ok(usage) = serde_json::from_value::<TokenUsage>(usage.clone())
    {
        chunks.push(Ok(StreamChunk::Usage(usage)));
    }
    chunks
}

/// Entry point for model calls.
///
/// Holds a backend only when a credential is configured; otherwise every
/// request is answered locally with a deterministic mock reply.
#[derive(Clone)]
pub struct ModelClient {
    settings: ChatSettings,
    backend: Option<Arc<dyn CompletionBackend>>,
}

impl ModelClient {
    pub fn new(settings: ChatSettings) -> Self {
        let backend = settings.api_key.clone().map(|api_key| {
            Arc::new(OpenRouterBackend::new(settings.clone(), api_key)) as Arc<dyn CompletionBackend>
        });
        if backend.is_none() {
            info!("No API key configured, using mock responses");
        }
        Self { settings, backend }
    }

    /// Use a specific backend regardless of the configured credential
    pub fn with_backend(settings: ChatSettings, backend: Arc<dyn CompletionBackend>) -> Self {
        Self {
            settings,
            backend: Some(backend),
        }
    }

    pub fn settings(&self) -> &ChatSettings {
        &self.settings
    }

    pub fn is_mock(&self) -> bool {
        self.backend.is_none()
    }

    pub fn mock_reply(request: &ChatRequest) -> String {
        format!(
            "Mock response: configure credential.\n\nYou asked: {}",
            request.last_message_text()
        )
    }

    /// Open a fragment stream for `request`
    pub async fn stream(&self, request: &ChatRequest) -> Result<ResponseStream, InvocationFailure> {
        match &self.backend {
            Some(backend) => backend.stream_chat(request).await,
            None => {
                let reply = Self::mock_reply(request);
                Ok(Box::pin(stream::iter(vec![Ok(StreamChunk::Text(reply))])))
            }
        }
    }
}
