pub mod controllers;
pub mod models;
pub mod repositories;
pub mod services;
pub mod settings;

pub use controllers::{SendError, SendRequest, SessionController};
pub use models::{
    Attachment, ChatMessage, ChatRole, ChatSession, ChatStatus, ConversationState, SessionStore,
};
pub use repositories::{InMemorySessionRepository, SessionJsonRepository, SessionRepository};
pub use services::{
    AttachmentError, AttachmentErrorCode, ChatError, CompletionBackend, InvocationFailure,
    ModelClient, ResponseStream, StreamChunk,
};
pub use settings::ChatSettings;
