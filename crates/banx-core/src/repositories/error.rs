use thiserror::Error;

/// Failures of the session storage backends
#[derive(Debug, Error)]
#[allow(clippy::enum_variant_names)]
pub enum RepositoryError {
    #[error("Session storage IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Session storage serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// The session store could not be located or opened, e.g. no data directory
    #[error("Session storage unavailable: {message}")]
    InitializationError { message: String },
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_session_storage() {
        let err = RepositoryError::InitializationError {
            message: "Could not determine data directory".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Session storage unavailable: Could not determine data directory"
        );

        let err: RepositoryError = std::io::Error::other("disk full").into();
        assert_eq!(err.to_string(), "Session storage IO error: disk full");
    }
}
