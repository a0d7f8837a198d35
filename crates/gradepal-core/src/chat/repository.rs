//! ChatRepository trait definition.
//!
//! Persistence for conversation threads and their append-only messages.

use gradepal_types::chat::{ChatMessage, ChatThread};
use gradepal_types::error::RepositoryError;
use uuid::Uuid;

/// Repository trait for thread and message persistence.
///
/// Implementations live in gradepal-infra (e.g., `SqliteChatRepository`).
/// Uses native async fn in traits (RPITIT, Rust 2024 edition).
pub trait ChatRepository: Send + Sync {
    /// Insert a new thread.
    fn create_thread(
        &self,
        thread: &ChatThread,
    ) -> impl std::future::Future<Output = Result<ChatThread, RepositoryError>> + Send;

    /// Get a thread by its unique ID.
    fn get_thread(
        &self,
        thread_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Option<ChatThread>, RepositoryError>> + Send;

    /// List an owner's threads, ordered by updated_at DESC.
    fn list_threads(
        &self,
        owner_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Vec<ChatThread>, RepositoryError>> + Send;

    /// Append a message and move the thread's updated_at to the message's
    /// creation time, atomically.
    ///
    /// Fails with `RepositoryError::NotFound` if the thread does not exist.
    fn append_message(
        &self,
        message: &ChatMessage,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// All messages of a thread, ordered by created_at ASC.
    fn list_messages(
        &self,
        thread_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Vec<ChatMessage>, RepositoryError>> + Send;
}
