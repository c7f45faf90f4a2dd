pub mod attachment;
pub mod error;
pub mod llm_service;
pub mod request_builder;
pub mod stream_assembler;
pub mod title_generator;

pub use attachment::{
    AttachmentError, AttachmentErrorCode, AttachmentKind, attachment_kind, prepare_document_attachment,
    prepare_image_attachment, prepare_text_document,
};
pub use error::{ChatError, InvocationFailure};
pub use llm_service::{CompletionBackend, ModelClient, OpenRouterBackend, ResponseStream, StreamChunk};
pub use request_builder::{ChatRequest, build_request};
pub use stream_assembler::{StreamAssembler, StreamOutcome};
pub use title_generator::{DEFAULT_TITLE, generate_title};
