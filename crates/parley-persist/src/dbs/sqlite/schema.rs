use sqlx::SqlitePool;

use crate::error::Result;

const USERS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    username      TEXT NOT NULL UNIQUE,
    email         TEXT UNIQUE,
    password_hash TEXT,
    auth_provider TEXT NOT NULL DEFAULT 'local',
    created_at    TEXT NOT NULL,
    last_login_at TEXT
)
"#;

const THREADS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS threads (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id    INTEGER NOT NULL REFERENCES users(id),
    thread_id  TEXT NOT NULL UNIQUE,
    title      TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    is_deleted INTEGER NOT NULL DEFAULT 0
)
"#;

const THREADS_BY_OWNER_INDEX: &str = r#"
CREATE INDEX IF NOT EXISTS idx_threads_owner
    ON threads (user_id, is_deleted, updated_at)
"#;

/// Create registry tables and indexes if they do not exist
pub async fn init_schema(pool: &SqlitePool) -> Result<()> {
    for statement in [USERS_TABLE, THREADS_TABLE, THREADS_BY_OWNER_INDEX] {
        sqlx::query(statement).execute(pool).await?;
    }
    tracing::debug!("Registry schema ready");
    Ok(())
}
