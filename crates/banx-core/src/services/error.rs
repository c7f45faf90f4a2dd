use thiserror::Error;

/// A raw failure from the model API or its transport, before classification
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InvocationFailure {
    /// HTTP-like status code, when one is known
    pub status: Option<u16>,
    pub message: Option<String>,
}

impl InvocationFailure {
    pub fn new(status: Option<u16>, message: Option<String>) -> Self {
        Self { status, message }
    }

    pub fn status(status: u16) -> Self {
        Self::new(Some(status), None)
    }

    pub fn message(message: impl Into<String>) -> Self {
        Self::new(None, Some(message.into()))
    }
}

impl From<reqwest::Error> for InvocationFailure {
    fn from(err: reqwest::Error) -> Self {
        Self::new(err.status().map(|s| s.as_u16()), Some(err.to_string()))
    }
}

/// Failures surfaced to callers of `send_message`
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ChatError {
    #[error("rate limit")]
    RateLimited,

    #[error("invalid key")]
    InvalidKey,

    #[error("model overloaded")]
    ModelOverloaded,

    #[error("empty response")]
    EmptyResponse,

    #[error("{0}")]
    Upstream(String),

    #[error("unexpected response")]
    UnexpectedResponse,
}

impl ChatError {
    /// Classify a raw failure. Every input maps to exactly one variant.
    pub fn from_failure(failure: &InvocationFailure) -> Self {
        match failure.status {
            Some(429) => return ChatError::RateLimited,
            Some(401) | Some(403) => return ChatError::InvalidKey,
            Some(503) => return ChatError::ModelOverloaded,
            _ => {}
        }

        match failure.message.as_deref() {
            Some(message) if !message.is_empty() => ChatError::Upstream(message.to_string()),
            _ => ChatError::UnexpectedResponse,
        }
    }
}

impl From<InvocationFailure> for ChatError {
    fn from(failure: InvocationFailure) -> Self {
        ChatError::from_failure(&failure)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes_take_precedence() {
        let cases = [
            (429, ChatError::RateLimited),
            (401, ChatError::InvalidKey),
            (403, ChatError::InvalidKey),
            (503, ChatError::ModelOverloaded),
        ];

        for (status, expected) in cases {
            let failure = InvocationFailure::new(Some(status), Some("ignored".to_string()));
            assert_eq!(ChatError::from_failure(&failure), expected);
        }
    }

    #[test]
    fn test_messages_match_user_facing_text() {
        assert_eq!(ChatError::RateLimited.to_string(), "rate limit");
        assert_eq!(ChatError::InvalidKey.to_string(), "invalid key");
        assert_eq!(ChatError::ModelOverloaded.to_string(), "model overloaded");
        assert_eq!(ChatError::EmptyResponse.to_string(), "empty response");
        assert_eq!(ChatError::UnexpectedResponse.to_string(), "unexpected response");
    }

    #[test]
    fn test_other_statuses_pass_message_through() {
        let failure = InvocationFailure::new(Some(500), Some("upstream exploded".to_string()));
        assert_eq!(
            ChatError::from_failure(&failure).to_string(),
            "upstream exploded"
        );
    }

    #[test]
    fn test_no_status_and_no_message_is_unexpected() {
        assert_eq!(
            ChatError::from_failure(&InvocationFailure::default()),
            ChatError::UnexpectedResponse
        );
        assert_eq!(
            ChatError::from_failure(&InvocationFailure::message("")),
            ChatError::UnexpectedResponse
        );
        assert_eq!(
            ChatError::from_failure(&InvocationFailure::status(418)),
            ChatError::UnexpectedResponse
        );
    }
}
