//! Users and bearer tokens.
//!
//! Tokens are never stored in plaintext: `api_tokens` keys on the lowercase
//! hex SHA-256 of the token, and lookups hash the presented token first.

use chrono::Utc;
use sha2::{Digest, Sha256};
use sqlx::Row;
use uuid::Uuid;

use gradepal_types::error::RepositoryError;
use gradepal_types::identity::{ChatUser, UserRole};

use super::pool::DatabasePool;
use super::{format_datetime, parse_uuid, query_error};

/// Lowercase hex SHA-256 of a bearer token.
pub fn hash_token(token: &str) -> String {
    format!("{:x}", Sha256::digest(token.as_bytes()))
}

/// SQLite-backed user and token store.
#[derive(Clone)]
pub struct SqliteIdentityRepository {
    pool: DatabasePool,
}

struct UserRow {
    id: String,
    username: String,
    role: String,
    student_number: Option<String>,
}

impl UserRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            username: row.try_get("username")?,
            role: row.try_get("role")?,
            student_number: row.try_get("student_number")?,
        })
    }

    fn into_user(self) -> Result<ChatUser, RepositoryError> {
        Ok(ChatUser {
            id: parse_uuid(&self.id, "user id")?,
            username: self.username,
            role: self.role.parse::<UserRole>().map_err(RepositoryError::Query)?,
            student_number: self.student_number,
        })
    }
}

impl SqliteIdentityRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }

    pub async fn create_user(
        &self,
        username: &str,
        full_name: &str,
        role: UserRole,
        student_number: Option<&str>,
    ) -> Result<ChatUser, RepositoryError> {
        let user = ChatUser {
            id: Uuid::now_v7(),
            username: username.to_string(),
            role,
            student_number: student_number
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .map(str::to_string),
        };

        sqlx::query(
            r#"INSERT INTO users (id, username, full_name, role, student_number, created_at)
               VALUES (?, ?, ?, ?, ?, ?)"#,
        )
        .bind(user.id.to_string())
        .bind(&user.username)
        .bind(full_name)
        .bind(user.role.to_string())
        .bind(&user.student_number)
        .bind(format_datetime(&Utc::now()))
        .execute(&self.pool.writer)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                RepositoryError::Conflict(format!("user '{username}' already exists"))
            }
            other => query_error(other),
        })?;

        Ok(user)
    }

    pub async fn find_user_by_username(
        &self,
        username: &str,
    ) -> Result<Option<ChatUser>, RepositoryError> {
        let row = sqlx::query(
            "SELECT id, username, role, student_number FROM users WHERE username = ?",
        )
        .bind(username)
        .fetch_optional(&self.pool.reader)
        .await
        .map_err(query_error)?;

        row.map(|row| UserRow::from_row(&row).map_err(query_error)?.into_user())
            .transpose()
    }

    /// Resolve the user a token hash belongs to.
    pub async fn find_user_by_token_hash(
        &self,
        token_hash: &str,
    ) -> Result<Option<ChatUser>, RepositoryError> {
        let row = sqlx::query(
            r#"SELECT u.id, u.username, u.role, u.student_number
               FROM api_tokens t JOIN users u ON u.id = t.user_id
               WHERE t.token_hash = ?"#,
        )
        .bind(token_hash)
        .fetch_optional(&self.pool.reader)
        .await
        .map_err(query_error)?;

        row.map(|row| UserRow::from_row(&row).map_err(query_error)?.into_user())
            .transpose()
    }

    /// Create a new token for `user_id` and return its plaintext. Only the
    /// hash is stored.
    pub async fn issue_token(&self, user_id: &Uuid) -> Result<String, RepositoryError> {
        let token = format!("gp_{}", Uuid::new_v4().simple());

        let result = sqlx::query(
            r#"INSERT INTO api_tokens (token_hash, user_id, created_at)
               SELECT ?, id, ? FROM users WHERE id = ?"#,
        )
        .bind(hash_token(&token))
        .bind(format_datetime(&Utc::now()))
        .bind(user_id.to_string())
        .execute(&self.pool.writer)
        .await
        .map_err(query_error)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite::pool::test_pool;

    #[test]
    fn test_hash_token_known_value() {
        assert_eq!(
            hash_token(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[tokio::test]
    async fn test_issued_token_resolves_to_user() {
        let repo = SqliteIdentityRepository::new(test_pool().await);
        let user = repo
            .create_user("alice", "Alice Dlamini", UserRole::Student, Some("S1001"))
            .await
            .unwrap();

        let token = repo.issue_token(&user.id).await.unwrap();
        assert!(token.starts_with("gp_"));

        let found = repo
            .find_user_by_token_hash(&hash_token(&token))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found, user);
        assert!(repo.find_user_by_token_hash(&hash_token("gp_wrong")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_username_is_conflict() {
        let repo = SqliteIdentityRepository::new(test_pool().await);
        repo.create_user("bob", "Bob", UserRole::Lecturer, None).await.unwrap();
        let err = repo
            .create_user("bob", "Bob Again", UserRole::Lecturer, None)
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_issue_token_for_unknown_user() {
        let repo = SqliteIdentityRepository::new(test_pool().await);
        let err = repo.issue_token(&Uuid::now_v7()).await.unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound));
    }

    #[tokio::test]
    async fn test_find_by_username() {
        let repo = SqliteIdentityRepository::new(test_pool().await);
        let user = repo.create_user("carol", "", UserRole::Student, Some("  ")).await.unwrap();
        assert_eq!(user.student_number, None);
        let found = repo.find_user_by_username("carol").await.unwrap().unwrap();
        assert_eq!(found.id, user.id);
    }
}
