use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use parley_persist::Thread;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::{
    auth::CurrentUser,
    error::{ApiError, ApiResult},
    state::AppState,
};

#[derive(Debug, Default, Deserialize)]
pub struct CreateChatRequest {
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RenameChatRequest {
    pub title: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub id: i64,
    pub thread_id: String,
    pub title: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct ListChatsQuery {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub skip: i64,
}

fn default_limit() -> i64 {
    20
}

#[derive(Debug, Serialize)]
pub struct ListChatsResponse {
    pub chats: Vec<ChatResponse>,
    pub has_more: bool,
}

/// List the caller's chats, most recently active first
pub async fn list_chats(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<ListChatsQuery>,
) -> ApiResult<Json<ListChatsResponse>> {
    let limit = query.limit.clamp(1, 100); // Cap at 100

    let threads = state
        .chats
        .list_chats(user.id, Some(limit), Some(query.skip.max(0)))
        .await?;

    let has_more = threads.len() as i64 == limit;
    Ok(Json(ListChatsResponse {
        chats: threads.into_iter().map(ChatResponse::from).collect(),
        has_more,
    }))
}

/// Create a chat
pub async fn create_chat(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    body: Option<Json<CreateChatRequest>>,
) -> ApiResult<(StatusCode, Json<ChatResponse>)> {
    let req = body.map(|Json(req)| req).unwrap_or_default();
    let title = req.title.map(|t| t.trim().to_string()).filter(|t| !t.is_empty());

    let thread = state.chats.create_chat(user.id, title).await?;
    Ok((StatusCode::CREATED, Json(thread.into())))
}

/// Rename a chat
pub async fn rename_chat(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(chat_id): Path<i64>,
    Json(req): Json<RenameChatRequest>,
) -> ApiResult<Json<ChatResponse>> {
    let title = req.title.trim();
    if title.is_empty() {
        return Err(ApiError::BadRequest("title must not be empty".to_string()));
    }

    let thread = state.chats.authorize(chat_id, user.id).await?;
    let thread = state.chats.rename_chat(&thread, title).await?;

    Ok(Json(thread.into()))
}

/// Soft-delete a chat
pub async fn delete_chat(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(chat_id): Path<i64>,
) -> ApiResult<StatusCode> {
    let thread = state.chats.authorize(chat_id, user.id).await?;
    state.chats.delete_chat(&thread).await?;

    Ok(StatusCode::NO_CONTENT)
}

impl From<Thread> for ChatResponse {
    fn from(thread: Thread) -> Self {
        Self {
            id: thread.id,
            thread_id: thread.thread_id,
            title: thread.title,
            created_at: thread.created_at,
            updated_at: thread.updated_at,
        }
    }
}
