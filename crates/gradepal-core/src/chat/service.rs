//! Conversation store over a [`ChatRepository`].
//!
//! Owns thread resolution (create-or-resolve with ownership checks) and
//! message appends with strictly increasing timestamps.

use std::future::Future;
use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info};
use uuid::Uuid;

use gradepal_types::chat::{ChatMessage, ChatRole, ChatThread};
use gradepal_types::error::{ChatError, RepositoryError};

use super::repository::ChatRepository;

/// Thread and message persistence with ownership rules.
///
/// Generic over `ChatRepository` so gradepal-core never depends on
/// gradepal-infra.
pub struct ConversationStore<C: ChatRepository> {
    repo: C,
    last_timestamp: Mutex<DateTime<Utc>>,
}

impl<C: ChatRepository> ConversationStore<C> {
    pub fn new(repo: C) -> Self {
        Self {
            repo,
            last_timestamp: Mutex::new(DateTime::<Utc>::MIN_UTC),
        }
    }

    pub fn repo(&self) -> &C {
        &self.repo
    }

    /// Resolve `thread_id` for `owner_id`, or create a new thread titled by
    /// `title` when no id is supplied.
    ///
    /// `title` is only awaited on creation. An id that does not exist, or
    /// that belongs to another owner, is `ChatError::NotFound`.
    pub async fn ensure_thread<F, Fut>(
        &self,
        owner_id: Uuid,
        thread_id: Option<Uuid>,
        title: F,
    ) -> Result<ChatThread, ChatError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = String>,
    {
        if let Some(id) = thread_id {
            return self.thread_for_owner(owner_id, id).await;
        }

        let title = title().await;
        let now = self.next_timestamp();
        let thread = ChatThread {
            id: Uuid::now_v7(),
            owner_id,
            title,
            created_at: now,
            updated_at: now,
        };
        let thread = self.repo.create_thread(&thread).await?;
        info!(
            thread_id = %thread.id,
            owner_id = %owner_id,
            title = %thread.title,
            "Thread created"
        );
        Ok(thread)
    }

    /// Fetch a thread, enforcing exclusive ownership.
    pub async fn thread_for_owner(
        &self,
        owner_id: Uuid,
        thread_id: Uuid,
    ) -> Result<ChatThread, ChatError> {
        match self.repo.get_thread(&thread_id).await? {
            Some(thread) if thread.owner_id == owner_id => Ok(thread),
            Some(_) => {
                debug!(
                    thread_id = %thread_id,
                    owner_id = %owner_id,
                    "Thread belongs to another owner"
                );
                Err(ChatError::NotFound)
            }
            None => Err(ChatError::NotFound),
        }
    }

    /// Append one immutable message to a thread.
    pub async fn append_message(
        &self,
        thread_id: Uuid,
        role: ChatRole,
        content: &str,
    ) -> Result<ChatMessage, ChatError> {
        let message = ChatMessage {
            id: Uuid::now_v7(),
            thread_id,
            role,
            content: content.to_string(),
            created_at: self.next_timestamp(),
        };
        self.repo
            .append_message(&message)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => ChatError::NotFound,
                other => ChatError::Repository(other),
            })?;
        debug!(thread_id = %thread_id, role = %role, "Message appended");
        Ok(message)
    }

    /// An owner's threads, most recently updated first.
    pub async fn list_threads(&self, owner_id: Uuid) -> Result<Vec<ChatThread>, ChatError> {
        Ok(self.repo.list_threads(&owner_id).await?)
    }

    /// All messages of a thread in chronological order.
    pub async fn list_messages(&self, thread_id: Uuid) -> Result<Vec<ChatMessage>, ChatError> {
        Ok(self.repo.list_messages(&thread_id).await?)
    }

    /// Messages of a thread the caller owns.
    pub async fn history(
        &self,
        owner_id: Uuid,
        thread_id: Uuid,
    ) -> Result<Vec<ChatMessage>, ChatError> {
        self.thread_for_owner(owner_id, thread_id).await?;
        self.list_messages(thread_id).await
    }

    /// Wall-clock time, nudged forward so that no two timestamps handed out
    /// by this store are equal at microsecond precision.
    fn next_timestamp(&self) -> DateTime<Utc> {
        let mut last = self
            .last_timestamp
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let now = Utc::now();
        let next = if now > *last + Duration::microseconds(1) {
            now
        } else {
            *last + Duration::microseconds(1)
        };
        *last = next;
        next
    }
}
