//! SQLite chat repository implementation.
//!
//! Implements `ChatRepository` from `gradepal-core`: raw queries, private row
//! structs, writes on the writer pool and reads on the reader pool.

use chrono::{DateTime, Utc};
use sqlx::Row;
use uuid::Uuid;

use gradepal_core::chat::repository::ChatRepository;
use gradepal_types::chat::{ChatMessage, ChatRole, ChatThread};
use gradepal_types::error::RepositoryError;

use super::pool::DatabasePool;
use super::{format_datetime, parse_datetime, parse_uuid, query_error};

/// SQLite-backed implementation of `ChatRepository`.
#[derive(Clone)]
pub struct SqliteChatRepository {
    pool: DatabasePool,
}

impl SqliteChatRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

// ---------------------------------------------------------------------------
// Private Row types for SQLite-to-domain mapping
// ---------------------------------------------------------------------------

struct ChatThreadRow {
    id: String,
    owner_id: String,
    title: String,
    created_at: String,
    updated_at: String,
}

impl ChatThreadRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            owner_id: row.try_get("owner_id")?,
            title: row.try_get("title")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn into_thread(self) -> Result<ChatThread, RepositoryError> {
        Ok(ChatThread {
            id: parse_uuid(&self.id, "thread id")?,
            owner_id: parse_uuid(&self.owner_id, "owner_id")?,
            title: self.title,
            created_at: parse_datetime(&self.created_at)?,
            updated_at: parse_datetime(&self.updated_at)?,
        })
    }
}

struct ChatMessageRow {
    id: String,
    thread_id: String,
    role: String,
    content: String,
    created_at: String,
}

impl ChatMessageRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            thread_id: row.try_get("thread_id")?,
            role: row.try_get("role")?,
            content: row.try_get("content")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn into_message(self) -> Result<ChatMessage, RepositoryError> {
        let role: ChatRole = self.role.parse().map_err(RepositoryError::Query)?;
        let created_at: DateTime<Utc> = parse_datetime(&self.created_at)?;
        Ok(ChatMessage {
            id: parse_uuid(&self.id, "message id")?,
            thread_id: parse_uuid(&self.thread_id, "thread_id")?,
            role,
            content: self.content,
            created_at,
        })
    }
}

// ---------------------------------------------------------------------------
// ChatRepository implementation
// ---------------------------------------------------------------------------

impl ChatRepository for SqliteChatRepository {
    async fn create_thread(&self, thread: &ChatThread) -> Result<ChatThread, RepositoryError> {
        sqlx::query(
            r#"INSERT INTO chat_threads (id, owner_id, title, created_at, updated_at)
               VALUES (?, ?, ?, ?, ?)"#,
        )
        .bind(thread.id.to_string())
        .bind(thread.owner_id.to_string())
        .bind(&thread.title)
        .bind(format_datetime(&thread.created_at))
        .bind(format_datetime(&thread.updated_at))
        .execute(&self.pool.writer)
        .await
        .map_err(query_error)?;

        Ok(thread.clone())
    }

    async fn get_thread(&self, thread_id: &Uuid) -> Result<Option<ChatThread>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM chat_threads WHERE id = ?")
            .bind(thread_id.to_string())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(query_error)?;

        match row {
            Some(row) => {
                let thread_row = ChatThreadRow::from_row(&row).map_err(query_error)?;
                Ok(Some(thread_row.into_thread()?))
            }
            None => Ok(None),
        }
    }

    async fn list_threads(&self, owner_id: &Uuid) -> Result<Vec<ChatThread>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT * FROM chat_threads WHERE owner_id = ? ORDER BY updated_at DESC, id DESC",
        )
        .bind(owner_id.to_string())
        .fetch_all(&self.pool.reader)
        .await
        .map_err(query_error)?;

        let mut threads = Vec::with_capacity(rows.len());
        for row in &rows {
            let thread_row = ChatThreadRow::from_row(row).map_err(query_error)?;
            threads.push(thread_row.into_thread()?);
        }
        Ok(threads)
    }

    async fn append_message(&self, message: &ChatMessage) -> Result<(), RepositoryError> {
        let mut tx = self.pool.writer.begin().await.map_err(query_error)?;

        // Bump first so a missing thread is reported before the insert trips
        // the foreign key.
        let bumped = sqlx::query(
            "UPDATE chat_threads SET updated_at = MAX(updated_at, ?) WHERE id = ?",
        )
        .bind(format_datetime(&message.created_at))
        .bind(message.thread_id.to_string())
        .execute(&mut *tx)
        .await
        .map_err(query_error)?;

        if bumped.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        sqlx::query(
            r#"INSERT INTO chat_messages (id, thread_id, role, content, created_at)
               VALUES (?, ?, ?, ?, ?)"#,
        )
        .bind(message.id.to_string())
        .bind(message.thread_id.to_string())
        .bind(message.role.to_string())
        .bind(&message.content)
        .bind(format_datetime(&message.created_at))
        .execute(&mut *tx)
        .await
        .map_err(query_error)?;

        tx.commit().await.map_err(query_error)?;
        Ok(())
    }

    async fn list_messages(&self, thread_id: &Uuid) -> Result<Vec<ChatMessage>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT * FROM chat_messages WHERE thread_id = ? ORDER BY created_at ASC, id ASC",
        )
        .bind(thread_id.to_string())
        .fetch_all(&self.pool.reader)
        .await
        .map_err(query_error)?;

        let mut messages = Vec::with_capacity(rows.len());
        for row in &rows {
            let msg_row = ChatMessageRow::from_row(row).map_err(query_error)?;
            messages.push(msg_row.into_message()?);
        }
        Ok(messages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite::identity::SqliteIdentityRepository;
    use crate::sqlite::pool::test_pool;
    use chrono::{Duration, SubsecRound};
    use gradepal_types::identity::UserRole;

    async fn setup() -> (SqliteChatRepository, Uuid) {
        let pool = test_pool().await;
        let owner = SqliteIdentityRepository::new(pool.clone())
            .create_user("alice", "Alice", UserRole::Student, Some("S1001"))
            .await
            .unwrap();
        (SqliteChatRepository::new(pool), owner.id)
    }

    fn make_thread(owner_id: Uuid, title: &str, at: DateTime<Utc>) -> ChatThread {
        ChatThread {
            id: Uuid::now_v7(),
            owner_id,
            title: title.to_string(),
            created_at: at,
            updated_at: at,
        }
    }

    fn make_message(
        thread_id: Uuid,
        role: ChatRole,
        content: &str,
        at: DateTime<Utc>,
    ) -> ChatMessage {
        ChatMessage {
            id: Uuid::now_v7(),
            thread_id,
            role,
            content: content.to_string(),
            created_at: at,
        }
    }

    #[tokio::test]
    async fn test_create_and_get_thread() {
        let (repo, owner) = setup().await;
        let thread = make_thread(owner, "Calculus Help", Utc::now());
        repo.create_thread(&thread).await.unwrap();

        let fetched = repo.get_thread(&thread.id).await.unwrap().unwrap();
        assert_eq!(fetched.title, "Calculus Help");
        assert_eq!(fetched.owner_id, owner);
        assert_eq!(fetched.created_at, thread.created_at.trunc_subsecs(6));

        assert!(repo.get_thread(&Uuid::now_v7()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_append_bumps_thread_and_orders_messages() {
        let (repo, owner) = setup().await;
        let base = Utc::now();
        let older = make_thread(owner, "older", base);
        let newer = make_thread(owner, "newer", base + Duration::seconds(1));
        repo.create_thread(&older).await.unwrap();
        repo.create_thread(&newer).await.unwrap();

        let threads = repo.list_threads(&owner).await.unwrap();
        assert_eq!(threads[0].id, newer.id);

        // Same-millisecond appends still sort by their microsecond stamps.
        let t = base + Duration::seconds(2);
        repo.append_message(&make_message(older.id, ChatRole::User, "q", t)).await.unwrap();
        let answer_at = t + Duration::microseconds(1);
        repo.append_message(&make_message(older.id, ChatRole::Assistant, "a", answer_at))
            .await
            .unwrap();

        let threads = repo.list_threads(&owner).await.unwrap();
        assert_eq!(threads[0].id, older.id);

        let messages = repo.list_messages(&older.id).await.unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].content, "q");
        assert_eq!(messages[1].role, ChatRole::Assistant);
    }

    #[tokio::test]
    async fn test_append_to_missing_thread_is_not_found() {
        let (repo, _) = setup().await;
        let err = repo
            .append_message(&make_message(Uuid::now_v7(), ChatRole::User, "x", Utc::now()))
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound));
    }

    #[tokio::test]
    async fn test_threads_are_scoped_to_owner() {
        let (repo, owner) = setup().await;
        repo.create_thread(&make_thread(owner, "mine", Utc::now())).await.unwrap();
        assert!(repo.list_threads(&Uuid::now_v7()).await.unwrap().is_empty());
        assert_eq!(repo.list_threads(&owner).await.unwrap().len(), 1);
    }
}
