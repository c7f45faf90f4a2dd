#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use futures::stream;
use parking_lot::Mutex;

use banx_core::repositories::{
    InMemorySessionRepository, RepositoryResult, SessionRepository, StoredPayload,
};
use banx_core::services::ChatRequest;
use banx_core::{
    ChatSettings, CompletionBackend, InvocationFailure, ModelClient, ResponseStream,
    SessionController, StreamChunk,
};

pub type Script = Result<Vec<Result<StreamChunk, InvocationFailure>>, InvocationFailure>;

/// Completion backend that replays canned streams and remembers requests
#[derive(Default)]
pub struct ScriptedBackend {
    scripts: Mutex<VecDeque<Script>>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedBackend {
    pub fn new(scripts: Vec<Script>) -> Arc<Self> {
        Arc::new(Self {
            scripts: Mutex::new(scripts.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl CompletionBackend for ScriptedBackend {
    async fn stream_chat(&self, request: &ChatRequest) -> Result<ResponseStream, InvocationFailure> {
        self.requests.lock().push(request.clone());
        let script = self.scripts.lock().pop_front().unwrap_or_else(|| Ok(Vec::new()));
        script.map(|chunks| Box::pin(stream::iter(chunks)) as ResponseStream)
    }
}

pub fn text(piece: &str) -> Result<StreamChunk, InvocationFailure> {
    Ok(StreamChunk::Text(piece.to_string()))
}

/// Repository that keeps every saved payload
#[derive(Clone, Default)]
pub struct RecordingRepository {
    inner: InMemorySessionRepository,
    saves: Arc<Mutex<Vec<StoredPayload>>>,
}

impl RecordingRepository {
    pub fn saves(&self) -> Vec<StoredPayload> {
        self.saves.lock().clone()
    }

    /// Content of the last message of the active session, per save
    pub fn active_tail_contents(&self) -> Vec<String> {
        self.saves()
            .into_iter()
            .filter_map(|payload| {
                let active = payload.active_session_id?;
                payload
                    .sessions?
                    .into_iter()
                    .find(|session| session.id.as_deref() == Some(active.as_str()))?
                    .messages?
                    .last()
                    .map(|message| message.content.clone())
            })
            .collect()
    }
}

impl SessionRepository for RecordingRepository {
    fn load(&self) -> RepositoryResult<Option<StoredPayload>> {
        self.inner.load()
    }

    fn save(&self, payload: &StoredPayload) -> RepositoryResult<()> {
        self.saves.lock().push(payload.clone());
        self.inner.save(payload)
    }
}

pub fn scripted_controller(
    backend: Arc<ScriptedBackend>,
    repository: Arc<dyn SessionRepository>,
) -> SessionController {
    let settings = ChatSettings::default().with_api_key("sk-test".to_string());
    let mut controller =
        SessionController::with_client(ModelClient::with_backend(settings, backend), repository);
    controller.initialize();
    controller
}
