use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use tracing::instrument;

use crate::checkpoint::Checkpoint;
use crate::error::Result;
use crate::saver::{Backend, CheckpointSaver};

/// Durable checkpoint storage on SQLite.
///
/// One row per thread token; `put` is an upsert so the table always holds
/// the latest state only.
#[derive(Debug, Clone)]
pub struct SqliteSaver {
    pool: SqlitePool,
}

impl SqliteSaver {
    /// Open (creating the file if needed) and run `setup`
    #[instrument(skip_all)]
    pub async fn connect(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);

        // every connection to `:memory:` is a separate database
        let max_connections = if database_url.contains(":memory:") { 1 } else { 5 };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;

        let saver = Self::from_pool(pool);
        saver.setup().await?;
        Ok(saver)
    }

    /// Wrap an existing pool. Call `setup` before first use.
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create the checkpoint table. Safe to call any number of times.
    pub async fn setup(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS checkpoints (
                thread_id  TEXT PRIMARY KEY NOT NULL,
                payload    TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        tracing::debug!("Checkpoint schema ready");
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl CheckpointSaver for SqliteSaver {
    #[instrument(skip(self))]
    async fn get(&self, thread_id: &str) -> Result<Option<Checkpoint>> {
        let payload: Option<String> =
            sqlx::query_scalar("SELECT payload FROM checkpoints WHERE thread_id = ?")
                .bind(thread_id)
                .fetch_optional(&self.pool)
                .await?;

        match payload {
            Some(payload) => Ok(Some(serde_json::from_str(&payload)?)),
            None => Ok(None),
        }
    }

    #[instrument(skip(self, checkpoint), fields(messages = checkpoint.messages.len()))]
    async fn put(&self, thread_id: &str, checkpoint: &Checkpoint) -> Result<()> {
        let payload = serde_json::to_string(checkpoint)?;

        sqlx::query(
            r#"
            INSERT INTO checkpoints (thread_id, payload, updated_at)
            VALUES (?, ?, ?)
            ON CONFLICT(thread_id) DO UPDATE SET
                payload = excluded.payload,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(thread_id)
        .bind(payload)
        .bind(checkpoint.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete(&self, thread_id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM checkpoints WHERE thread_id = ?")
            .bind(thread_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_threads(&self) -> Result<Vec<String>> {
        let rows: Vec<(String, DateTime<Utc>)> = sqlx::query_as(
            "SELECT thread_id, updated_at FROM checkpoints ORDER BY updated_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(|(id, _)| id).collect())
    }

    fn backend(&self) -> Backend {
        Backend::Sqlite
    }
}
