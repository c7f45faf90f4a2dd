use serde::{Deserialize, Serialize};

pub const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";
pub const DEFAULT_TEXT_MODEL: &str = "mistralai/devstral-2512:free";
pub const DEFAULT_VISION_MODEL: &str = "nvidia/nemotron-nano-12b-v2-vl:free";
pub const DEFAULT_DOCUMENT_MODEL: &str = "amazon/nova-2-lite-v1:free";
pub const DEFAULT_APP_ORIGIN: &str = "http://localhost";
pub const DEFAULT_APP_TITLE: &str = "Banx Chat";

/// Model API configuration.
///
/// Without an API key the client runs in mock mode and never touches the
/// network.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    pub base_url: String,
    pub text_model: String,
    pub vision_model: String,
    pub document_model: String,
    /// Sent as `HTTP-Referer`
    pub app_origin: String,
    /// Sent as `X-Title`
    pub app_title: String,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            text_model: DEFAULT_TEXT_MODEL.to_string(),
            vision_model: DEFAULT_VISION_MODEL.to_string(),
            document_model: DEFAULT_DOCUMENT_MODEL.to_string(),
            app_origin: DEFAULT_APP_ORIGIN.to_string(),
            app_title: DEFAULT_APP_TITLE.to_string(),
        }
    }
}

impl ChatSettings {
    /// Read settings from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through an arbitrary lookup; blank values count as unset
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let defaults = Self::default();

        Self {
            api_key: read("API_KEY"),
            base_url: read("API_BASE_URL").unwrap_or(defaults.base_url),
            text_model: read("TEXT_MODEL_ID").unwrap_or(defaults.text_model),
            vision_model: read("VISION_MODEL_ID").unwrap_or(defaults.vision_model),
            document_model: read("DOCUMENT_MODEL_ID").unwrap_or(defaults.document_model),
            app_origin: read("APP_ORIGIN").unwrap_or(defaults.app_origin),
            app_title: read("APP_TITLE").unwrap_or(defaults.app_title),
        }
    }

    pub fn with_api_key(mut self, api_key: String) -> Self {
        self.api_key = Some(api_key);
        self
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    pub fn has_credential(&self) -> bool {
        self.api_key.is_some()
    }

    pub fn chat_completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}
