use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Registry row for one conversation.
///
/// `thread_id` is the opaque token that keys the checkpoint store; `id` is
/// the relational identity used in URLs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Thread {
    pub id: i64,
    pub user_id: i64,
    pub thread_id: String,
    pub title: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub is_deleted: bool,
}

impl Thread {
    pub fn is_owned_by(&self, user_id: i64) -> bool {
        self.user_id == user_id
    }
}
