pub mod chat_mode;
pub mod conversation_state;
pub mod message;
pub mod session;
pub mod sessions_store;
pub mod token_usage;

pub use chat_mode::{CHAT_MODES, ChatMode, find_mode};
pub use conversation_state::{AssistantSlot, ChatStatus, ConversationState, MessageListener};
pub use message::{Attachment, ChatMessage, ChatRole};
pub use session::ChatSession;
pub use sessions_store::{SessionStore, StoreSnapshot};
pub use token_usage::TokenUsage;
