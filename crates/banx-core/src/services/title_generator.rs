use crate::models::{ChatMessage, ChatRole};

pub const DEFAULT_TITLE: &str = "New Chat";

const MAX_TITLE_LENGTH: usize = 30;
const MAX_TITLE_WORDS: usize = 5;
const ELLIPSIS: char = '…';
const TRAILING_PUNCTUATION: &[char] = &['.', ',', ';', ':', '!', '?'];

/// Collapse every whitespace run into a single space
fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Shorten an over-long snippet, keeping the ellipsis marker at the end
fn clamp_length(snippet: String) -> String {
    if snippet.chars().count() <= MAX_TITLE_LENGTH {
        return snippet;
    }

    let clamped: String = snippet.chars().take(MAX_TITLE_LENGTH).collect();
    let clamped = clamped.trim();
    if clamped.ends_with(ELLIPSIS) {
        return clamped.to_string();
    }

    let stripped = clamped
        .strip_suffix(TRAILING_PUNCTUATION)
        .unwrap_or(clamped)
        .trim();
    format!("{stripped}{ELLIPSIS}")
}

/// Derive a sidebar title from the first non-empty user message.
///
/// Returns `None` when no such message exists, in which case callers keep
/// whatever title the session already has.
pub fn generate_title(messages: &[ChatMessage]) -> Option<String> {
    let first_user_message = messages
        .iter()
        .find(|message| message.role == ChatRole::User && !message.content.trim().is_empty())?;

    let normalized = normalize_whitespace(&first_user_message.content);
    if normalized.is_empty() {
        return None;
    }

    let words: Vec<&str> = normalized.split(' ').collect();
    let mut snippet = words
        .iter()
        .take(MAX_TITLE_WORDS)
        .copied()
        .collect::<Vec<_>>()
        .join(" ");
    if words.len() > MAX_TITLE_WORDS {
        snippet.push(ELLIPSIS);
    }

    let snippet = clamp_length(snippet);
    if snippet.is_empty() {
        Some(DEFAULT_TITLE.to_string())
    } else {
        Some(snippet)
    }
}

/// Whether a title is still the placeholder given to fresh sessions
pub fn is_placeholder(title: &str) -> bool {
    title.is_empty() || title == DEFAULT_TITLE
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(content: &str) -> ChatMessage {
        ChatMessage::user(content)
    }

    #[test]
    fn test_short_message_is_used_verbatim() {
        let title = generate_title(&[user("Explain recursion")]);
        assert_eq!(title.as_deref(), Some("Explain recursion"));
    }

    #[test]
    fn test_word_limit_appends_ellipsis() {
        let title = generate_title(&[user(
            "  please   help me refactor this ugly legacy module today",
        )])
        .unwrap();

        assert_eq!(title, "please help me refactor this…");
        assert!(title.chars().count() <= MAX_TITLE_LENGTH);
        assert!(title.ends_with(ELLIPSIS));
    }

    #[test]
    fn test_long_words_are_hard_truncated() {
        let title =
            generate_title(&[user("internationalization considerations, explained")]).unwrap();

        // 30 kept characters plus the marker
        assert_eq!(title, "internationalization considera…");
        assert_eq!(title.chars().count(), MAX_TITLE_LENGTH + 1);
    }

    #[test]
    fn test_trailing_punctuation_is_stripped_before_ellipsis() {
        // The cut lands right after the comma
        let title = generate_title(&[user("abcdefghijklmnopqrstuvwxyzabc, defgh")]).unwrap();
        assert_eq!(title, "abcdefghijklmnopqrstuvwxyzabc…");
    }

    #[test]
    fn test_skips_assistant_and_blank_messages() {
        let messages = vec![
            ChatMessage::assistant("I am the assistant"),
            user("   "),
            user("Second user message"),
        ];

        assert_eq!(
            generate_title(&messages).as_deref(),
            Some("Second user message")
        );
    }

    #[test]
    fn test_no_user_message_yields_none() {
        assert_eq!(generate_title(&[]), None);
        assert_eq!(generate_title(&[ChatMessage::assistant("hello")]), None);
    }

    #[test]
    fn test_counts_characters_not_bytes() {
        let title = generate_title(&[user("héllo wörld")]).unwrap();
        assert_eq!(title, "héllo wörld");
    }

    #[test]
    fn test_placeholder_detection() {
        assert!(is_placeholder(DEFAULT_TITLE));
        assert!(is_placeholder(""));
        assert!(!is_placeholder("Explain recursion"));
    }
}
