mod common;

use std::sync::Arc;

use banx_core::models::TokenUsage;
use banx_core::services::request_builder::MessageContent;
use banx_core::services::prepare_image_attachment;
use banx_core::{
    ChatError, ChatRole, ChatSettings, ChatStatus, InvocationFailure, SendError, SendRequest, StreamChunk,
};

use common::{RecordingRepository, ScriptedBackend, scripted_controller, text};

#[tokio::test]
async fn streamed_fragments_are_flushed_one_by_one() {
    let backend = ScriptedBackend::new(vec![Ok(vec![
        text("Hel"),
        text("lo"),
        Ok(StreamChunk::Usage(TokenUsage::new(4, 2))),
        Ok(StreamChunk::Done),
    ])]);
    let repo = RecordingRepository::default();
    let mut controller = scripted_controller(backend.clone(), Arc::new(repo.clone()));
    let tails_before = repo.active_tail_contents().len();

    controller
        .send_message(SendRequest::text("Say hello"))
        .await
        .unwrap();

    let messages = controller.conversation().messages();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[1].role, ChatRole::Assistant);
    assert_eq!(messages[1].content, "Hello");
    assert_eq!(controller.conversation().status(), ChatStatus::Idle);

    // user message, empty assistant slot, then one flush per fragment
    let tails = repo.active_tail_contents()[tails_before..].to_vec();
    assert_eq!(tails, vec!["Say hello", "", "Hel", "Hello"]);

    let requests = backend.requests();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].stream);
    assert_eq!(
        requests[0].messages[0].content,
        MessageContent::Text("Say hello".to_string())
    );
}

#[tokio::test]
async fn rate_limit_keeps_partial_reply_and_sessions() {
    let backend = ScriptedBackend::new(vec![Ok(vec![
        text("Partial"),
        Err(InvocationFailure::new(Some(429), Some("Too many requests".to_string()))),
    ])]);
    let repo = RecordingRepository::default();
    let mut controller = scripted_controller(backend, Arc::new(repo.clone()));

    let result = controller.send_message(SendRequest::text("Go")).await;

    assert_eq!(result, Err(SendError::Chat(ChatError::RateLimited)));
    assert_eq!(controller.conversation().status(), ChatStatus::Error);
    assert_eq!(controller.conversation().error_message(), Some("rate limit"));
    assert_eq!(controller.conversation().messages()[1].content, "Partial");

    let sessions = controller.list_sessions();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].messages.len(), 2);
    assert_eq!(sessions[0].messages[1].content, "Partial");
}

#[tokio::test]
async fn rejected_request_is_normalized() {
    let backend = ScriptedBackend::new(vec![Err(InvocationFailure::status(401))]);
    let repo = RecordingRepository::default();
    let mut controller = scripted_controller(backend, Arc::new(repo));

    let result = controller.send_message(SendRequest::text("Hi")).await;

    assert_eq!(result, Err(SendError::Chat(ChatError::InvalidKey)));
    assert_eq!(controller.conversation().error_message(), Some("invalid key"));
    assert_eq!(controller.conversation().messages()[1].content, "");
}

#[tokio::test]
async fn stream_without_content_is_empty_response() {
    let backend = ScriptedBackend::new(vec![Ok(vec![text(""), Ok(StreamChunk::Done)])]);
    let repo = RecordingRepository::default();
    let mut controller = scripted_controller(backend, Arc::new(repo));

    let result = controller.send_message(SendRequest::text("Anything?")).await;

    assert_eq!(result, Err(SendError::Chat(ChatError::EmptyResponse)));
    assert_eq!(controller.conversation().error_message(), Some("empty response"));
}

#[tokio::test]
async fn next_message_clears_previous_error() {
    let backend = ScriptedBackend::new(vec![
        Err(InvocationFailure::status(503)),
        Ok(vec![text("Back online")]),
    ]);
    let repo = RecordingRepository::default();
    let mut controller = scripted_controller(backend, Arc::new(repo));

    let first = controller.send_message(SendRequest::text("Ping")).await;
    assert_eq!(first, Err(SendError::Chat(ChatError::ModelOverloaded)));

    controller
        .send_message(SendRequest::text("Ping again"))
        .await
        .unwrap();
    assert_eq!(controller.conversation().status(), ChatStatus::Idle);
    assert_eq!(controller.conversation().error_message(), None);
    assert_eq!(controller.conversation().messages().len(), 4);
}

#[tokio::test]
async fn image_attachment_goes_to_vision_model() {
    let backend = ScriptedBackend::new(vec![Ok(vec![text("A red dot")])]);
    let repo = RecordingRepository::default();
    let mut controller = scripted_controller(backend.clone(), Arc::new(repo));
    let image = prepare_image_attachment("dot.png", "image/png", &[1, 2, 3], Some((1, 1))).unwrap();

    controller
        .send_message(SendRequest::text("What is this?").with_attachment(image.clone()))
        .await
        .unwrap();

    let requests = backend.requests();
    let request = &requests[0];
    assert_eq!(request.model, ChatSettings::default().vision_model);
    assert!(request.stream_options.is_some_and(|options| options.include_usage));
    assert_eq!(request.last_message_text(), "What is this?");

    let user = &controller.conversation().messages()[0];
    assert_eq!(user.attachment.as_ref(), Some(&image));
}
