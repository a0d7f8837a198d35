use thiserror::Error;

/// Errors from repository operations (used by trait definitions in gradepal-core).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database connection error")]
    Connection,

    #[error("query error: {0}")]
    Query(String),

    #[error("entity not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),
}

/// Errors surfaced by a chat turn before streaming starts, or by the
/// one-shot and listing operations.
#[derive(Debug, Error)]
pub enum ChatError {
    /// Malformed request, rejected before any side effect.
    #[error("{0}")]
    Validation(String),

    /// The referenced thread does not exist or belongs to someone else.
    #[error("thread not found")]
    NotFound,

    /// The provider failed or returned no content. The detail is for logs
    /// only and never reaches a client.
    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    /// Another turn is already running on the same thread.
    #[error("a reply is already being generated for this thread")]
    Busy,

    #[error("storage error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Errors from the grade write path.
#[derive(Debug, Error)]
pub enum RecordsError {
    #[error("{0}")]
    Validation(String),

    #[error("only the subject's lecturer may record grades")]
    Forbidden,

    #[error("assessment not found")]
    NotFound,

    #[error("storage error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Errors from the notification bus.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("failed to serialize event: {0}")]
    Serialize(String),
}

/// Failures of the client-side stream consumer.
///
/// A server-sent `{error}` frame is not one of these; it is committed as a
/// visible assistant message instead.
#[derive(Debug, Error)]
pub enum ConsumerError {
    #[error("network error: {0}")]
    Network(String),

    #[error("malformed stream event: {0}")]
    Parse(String),

    #[error("stream ended before a terminal event")]
    Truncated,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_error_display() {
        let err = RepositoryError::Query("syntax error".to_string());
        assert_eq!(err.to_string(), "query error: syntax error");
    }

    #[test]
    fn test_chat_error_wraps_repository_error() {
        let err: ChatError = RepositoryError::NotFound.into();
        assert!(matches!(err, ChatError::Repository(RepositoryError::NotFound)));
    }

    #[test]
    fn test_validation_error_displays_message_verbatim() {
        let err = ChatError::Validation("threadId is required".to_string());
        assert_eq!(err.to_string(), "threadId is required");
    }
}
