/// A preset describing how the assistant should behave
#[derive(Debug, PartialEq, Eq)]
pub struct ChatMode {
    pub id: &'static str,
    pub label: &'static str,
    pub description: &'static str,
    pub system_prompt: &'static str,
}

pub const DEFAULT_MODE_ID: &str = "web-dev";

pub const CHAT_MODES: &[ChatMode] = &[
    ChatMode {
        id: "web-dev",
        label: "Web Development",
        description: "Front-end and full-stack implementation guidance.",
        system_prompt: "You are a senior web developer specializing in modern JavaScript frameworks. Provide concise, production-ready advice.",
    },
    ChatMode {
        id: "code-gen",
        label: "Code Generation",
        description: "Generate code snippets and explain design choices.",
        system_prompt: "You are an expert software engineer crafting high-quality code with clear explanations and edge-case awareness.",
    },
    ChatMode {
        id: "video-script",
        label: "Video Script Writing",
        description: "Structure scripts for engaging video content.",
        system_prompt: "You are a seasoned video script writer creating compelling narratives with clear call-to-actions.",
    },
];

/// Look up a mode, falling back to the first preset for unknown ids
pub fn find_mode(id: &str) -> &'static ChatMode {
    CHAT_MODES
        .iter()
        .find(|mode| mode.id == id)
        .unwrap_or(&CHAT_MODES[0])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_mode_is_first_preset() {
        assert_eq!(CHAT_MODES[0].id, DEFAULT_MODE_ID);
        assert_eq!(find_mode(DEFAULT_MODE_ID).label, "Web Development");
    }

    #[test]
    fn test_lookup_by_id() {
        assert_eq!(find_mode("video-script").label, "Video Script Writing");
        assert_eq!(find_mode("unknown").id, DEFAULT_MODE_ID);
    }
}
