pub mod error;
pub mod in_memory_repository;
pub mod persistence;
pub mod session_json_repository;
pub mod session_repository;

pub use error::{RepositoryError, RepositoryResult};
pub use in_memory_repository::InMemorySessionRepository;
pub use persistence::SessionPersistence;
pub use session_json_repository::SessionJsonRepository;
pub use session_repository::{SessionRepository, StoredPayload, StoredSession};
