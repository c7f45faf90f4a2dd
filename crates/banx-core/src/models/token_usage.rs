use serde::{Deserialize, Serialize};

/// Token usage reported at the end of a streamed reply
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct TokenUsage {
    /// Input tokens consumed
    #[serde(rename = "prompt_tokens", default)]
    pub input_tokens: u32,

    /// Output tokens generated
    #[serde(rename = "completion_tokens", default)]
    pub output_tokens: u32,
}

impl TokenUsage {
    pub fn new(input_tokens: u32, output_tokens: u32) -> Self {
        Self {
            input_tokens,
            output_tokens,
        }
    }

    pub fn total_tokens(&self) -> u32 {
        self.input_tokens.saturating_add(self.output_tokens)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_openai_style_usage() {
        let usage: TokenUsage =
            serde_json::from_str(r#"{"prompt_tokens": 12, "completion_tokens": 30, "total_tokens": 42}"#)
                .unwrap();
        assert_eq!(usage, TokenUsage::new(12, 30));
        assert_eq!(usage.total_tokens(), 42);
        assert_eq!(TokenUsage::new(u32::MAX, 1).total_tokens(), u32::MAX);
    }
}
