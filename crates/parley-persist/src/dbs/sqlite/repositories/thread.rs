use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::error::{PersistError, Result};
use crate::models::Thread;

const THREAD_COLUMNS: &str =
    "id, user_id, thread_id, title, created_at, updated_at, is_deleted";

#[derive(Clone)]
pub struct SqliteThreadRepository {
    pool: SqlitePool,
}

impl SqliteThreadRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a new thread with a fresh token
    pub async fn create_thread(&self, user_id: i64, title: Option<String>) -> Result<Thread> {
        let now = Utc::now();
        let sql = format!(
            "INSERT INTO threads (user_id, thread_id, title, created_at, updated_at, is_deleted) \
             VALUES (?, ?, ?, ?, ?, 0) RETURNING {THREAD_COLUMNS}"
        );

        sqlx::query_as::<_, Thread>(&sql)
            .bind(user_id)
            .bind(Uuid::new_v4().to_string())
            .bind(title)
            .bind(now)
            .bind(now)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(ref db) if db.is_foreign_key_violation() => {
                    PersistError::UserNotFound(user_id.to_string())
                }
                other => PersistError::Database(other),
            })
    }

    /// Get thread by ID
    pub async fn get_thread(&self, id: i64) -> Result<Option<Thread>> {
        let sql = format!("SELECT {THREAD_COLUMNS} FROM threads WHERE id = ?");
        Ok(sqlx::query_as::<_, Thread>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    /// Get thread by token
    pub async fn get_thread_by_token(&self, thread_id: &str) -> Result<Option<Thread>> {
        let sql = format!("SELECT {THREAD_COLUMNS} FROM threads WHERE thread_id = ?");
        Ok(sqlx::query_as::<_, Thread>(&sql)
            .bind(thread_id)
            .fetch_optional(&self.pool)
            .await?)
    }

    /// List threads for a user
    pub async fn list_threads(
        &self,
        user_id: i64,
        limit: Option<i64>,
        skip: Option<i64>,
    ) -> Result<Vec<Thread>> {
        // SQLite treats a negative LIMIT as "no limit"
        let sql = format!(
            "SELECT {THREAD_COLUMNS} FROM threads \
             WHERE user_id = ? AND is_deleted = 0 \
             ORDER BY updated_at DESC, id DESC \
             LIMIT ? OFFSET ?"
        );

        Ok(sqlx::query_as::<_, Thread>(&sql)
            .bind(user_id)
            .bind(limit.unwrap_or(-1))
            .bind(skip.unwrap_or(0).max(0))
            .fetch_all(&self.pool)
            .await?)
    }

    /// Bump `updated_at`, setting the title only if the thread has none.
    ///
    /// Deleted threads are left alone and reported as missing.
    pub async fn record_activity(&self, id: i64, title_if_unset: Option<&str>) -> Result<Thread> {
        let sql = format!(
            "UPDATE threads SET updated_at = ?, title = COALESCE(title, ?) \
             WHERE id = ? AND is_deleted = 0 RETURNING {THREAD_COLUMNS}"
        );

        sqlx::query_as::<_, Thread>(&sql)
            .bind(Utc::now())
            .bind(title_if_unset)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| PersistError::ThreadNotFound(id.to_string()))
    }

    /// Replace the title of a live thread
    pub async fn rename_thread(&self, id: i64, title: &str) -> Result<Thread> {
        let sql = format!(
            "UPDATE threads SET title = ?, updated_at = ? \
             WHERE id = ? AND is_deleted = 0 RETURNING {THREAD_COLUMNS}"
        );

        sqlx::query_as::<_, Thread>(&sql)
            .bind(title)
            .bind(Utc::now())
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| PersistError::ThreadNotFound(id.to_string()))
    }

    /// Mark a thread deleted. The row itself is kept.
    pub async fn soft_delete_thread(&self, id: i64) -> Result<()> {
        let result = sqlx::query(
            "UPDATE threads SET is_deleted = 1, updated_at = ? WHERE id = ? AND is_deleted = 0",
        )
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(PersistError::ThreadNotFound(id.to_string()));
        }
        Ok(())
    }

    /// Tokens of soft-deleted threads
    pub async fn list_deleted_thread_tokens(&self) -> Result<Vec<String>> {
        Ok(
            sqlx::query_scalar("SELECT thread_id FROM threads WHERE is_deleted = 1 ORDER BY id")
                .fetch_all(&self.pool)
                .await?,
        )
    }
}
