use futures::{Stream, StreamExt};
use tracing::{debug, warn};

use super::error::{ChatError, InvocationFailure};
use super::llm_service::StreamChunk;
use crate::models::{AssistantSlot, ConversationState, TokenUsage};

/// Result of a fully consumed stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamOutcome {
    pub text: String,
    pub usage: Option<TokenUsage>,
}

/// Feeds streamed fragments into one assistant message.
///
/// Each non-empty fragment is appended as soon as it arrives, so observers
/// see the reply grow. The full text is accumulated alongside in case the
/// slot could not take it.
pub struct StreamAssembler<'a> {
    state: &'a mut ConversationState,
    slot: AssistantSlot,
    text: String,
    appended: bool,
    usage: Option<TokenUsage>,
}

impl<'a> StreamAssembler<'a> {
    pub fn new(state: &'a mut ConversationState, slot: AssistantSlot) -> Self {
        Self {
            state,
            slot,
            text: String::new(),
            appended: false,
            usage: None,
        }
    }

    /// Apply one chunk. Returns `false` once the stream signalled completion.
    pub fn push(&mut self, chunk: StreamChunk) -> bool {
        match chunk {
            StreamChunk::Text(piece) => {
                if piece.is_empty() {
                    return true;
                }
                self.text.push_str(&piece);
                if self.state.append_to(&self.slot, &piece) {
                    self.appended = true;
                }
                true
            }
            StreamChunk::Usage(usage) => {
                self.usage = Some(usage);
                true
            }
            StreamChunk::Done => false,
        }
    }

    /// Close out the stream: empty output is an error, and text the slot never
    /// received is appended in one piece.
    pub fn finish(self) -> Result<StreamOutcome, ChatError> {
        if self.text.is_empty() {
            return Err(ChatError::EmptyResponse);
        }

        // Nothing landed only when the slot vanished mid-stream (the list was
        // reset); the retry then fails as well and the reply survives only in
        // the returned outcome.
        if !self.appended && !self.state.append_to(&self.slot, &self.text) {
            warn!(
                message_id = %self.slot.message_id(),
                "Assembled reply could not be written to its message"
            );
        }

        Ok(StreamOutcome {
            text: self.text,
            usage: self.usage,
        })
    }

    /// Drain `stream` to completion
    pub async fn consume<S>(mut self, mut stream: S) -> Result<StreamOutcome, ChatError>
    where
        S: Stream<Item = Result<StreamChunk, InvocationFailure>> + Unpin,
    {
        while let Some(item) = stream.next().await {
            let chunk = item.map_err(|failure| {
                debug!(status = ?failure.status, message = ?failure.message, "Stream failed");
                ChatError::from_failure(&failure)
            })?;
            if !self.push(chunk) {
                break;
            }
        }
        self.finish()
    }
}
