use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;

use crate::dbs::sqlite::repositories::{SqliteThreadRepository, SqliteUserRepository};
use crate::dbs::sqlite::schema::init_schema;
use crate::error::Result;
use crate::models::{NewUser, Thread, User};
use crate::trait_client::PersistenceClient;

pub struct SqlitePersistenceClient {
    pool: SqlitePool,
    user_repo: SqliteUserRepository,
    thread_repo: SqliteThreadRepository,
}

impl SqlitePersistenceClient {
    /// Connect to SQLite and create client
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let max_connections = if database_url.contains(":memory:") {
            1
        } else {
            max_connections
        };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;

        Ok(Self::from_pool(pool))
    }

    pub fn from_pool(pool: SqlitePool) -> Self {
        Self {
            user_repo: SqliteUserRepository::new(pool.clone()),
            thread_repo: SqliteThreadRepository::new(pool.clone()),
            pool,
        }
    }

    pub async fn init_schema(&self) -> Result<()> {
        init_schema(&self.pool).await
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl PersistenceClient for SqlitePersistenceClient {
    async fn create_user(&self, user: NewUser) -> Result<User> {
        self.user_repo.create_user(user).await
    }

    async fn get_user(&self, user_id: i64) -> Result<Option<User>> {
        self.user_repo.get_user(user_id).await
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        self.user_repo.get_user_by_username(username).await
    }

    async fn touch_login(&self, user_id: i64) -> Result<()> {
        self.user_repo.touch_login(user_id).await
    }

    async fn create_thread(&self, user_id: i64, title: Option<String>) -> Result<Thread> {
        let thread = self.thread_repo.create_thread(user_id, title).await?;
        tracing::debug!(id = thread.id, thread_id = %thread.thread_id, "Thread created");
        Ok(thread)
    }

    async fn get_thread(&self, id: i64) -> Result<Option<Thread>> {
        self.thread_repo.get_thread(id).await
    }

    async fn get_thread_by_token(&self, thread_id: &str) -> Result<Option<Thread>> {
        self.thread_repo.get_thread_by_token(thread_id).await
    }

    async fn list_threads(
        &self,
        user_id: i64,
        limit: Option<i64>,
        skip: Option<i64>,
    ) -> Result<Vec<Thread>> {
        self.thread_repo.list_threads(user_id, limit, skip).await
    }

    async fn record_activity(&self, id: i64, title_if_unset: Option<&str>) -> Result<Thread> {
        self.thread_repo.record_activity(id, title_if_unset).await
    }

    async fn rename_thread(&self, id: i64, title: &str) -> Result<Thread> {
        self.thread_repo.rename_thread(id, title).await
    }

    async fn soft_delete_thread(&self, id: i64) -> Result<()> {
        self.thread_repo.soft_delete_thread(id).await?;
        tracing::debug!(id, "Thread soft-deleted");
        Ok(())
    }

    async fn list_deleted_thread_tokens(&self) -> Result<Vec<String>> {
        self.thread_repo.list_deleted_thread_tokens().await
    }
}
