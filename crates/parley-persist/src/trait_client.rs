use async_trait::async_trait;

use crate::error::Result;
use crate::models::{NewUser, Thread, User};

/// Trait for conversation registry operations
///
/// Implementations provide database-specific CRUD over users and threads.
#[async_trait]
pub trait PersistenceClient: Send + Sync {
    /// Create a user; duplicate username or email is a `Conflict`
    async fn create_user(&self, user: NewUser) -> Result<User>;

    async fn get_user(&self, user_id: i64) -> Result<Option<User>>;

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>>;

    /// Record a login at the current time
    async fn touch_login(&self, user_id: i64) -> Result<()>;

    /// Create a thread with a fresh token
    async fn create_thread(&self, user_id: i64, title: Option<String>) -> Result<Thread>;

    async fn get_thread(&self, id: i64) -> Result<Option<Thread>>;

    async fn get_thread_by_token(&self, thread_id: &str) -> Result<Option<Thread>>;

    /// Non-deleted threads of a user, most recently updated first
    async fn list_threads(
        &self,
        user_id: i64,
        limit: Option<i64>,
        skip: Option<i64>,
    ) -> Result<Vec<Thread>>;

    // Thread writes set only their own columns and never modify deleted rows.

    /// Bump activity time; sets the title only when none is stored yet
    async fn record_activity(&self, id: i64, title_if_unset: Option<&str>) -> Result<Thread>;

    async fn rename_thread(&self, id: i64, title: &str) -> Result<Thread>;

    /// Soft delete; a thread that is already deleted is `ThreadNotFound`
    async fn soft_delete_thread(&self, id: i64) -> Result<()>;

    /// Tokens of soft-deleted threads, for checkpoint sweeps
    async fn list_deleted_thread_tokens(&self) -> Result<Vec<String>>;
}
