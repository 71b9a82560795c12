use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::{
    auth::CurrentUser,
    error::{ApiError, ApiResult},
    service::ChatHistory,
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub content: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SendMessageResponse {
    pub content: String,
    /// True when the reply is a fallback or a step was skipped
    pub degraded: bool,
}

/// Message history of a chat
pub async fn list_messages(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(chat_id): Path<i64>,
) -> ApiResult<Json<ChatHistory>> {
    let thread = state.chats.authorize(chat_id, user.id).await?;
    let history = state.chats.get_history(&thread).await;

    Ok(Json(history.into_inner()))
}

/// Send a message and wait for the assistant's reply
pub async fn send_message(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(chat_id): Path<i64>,
    Json(req): Json<SendMessageRequest>,
) -> ApiResult<Json<SendMessageResponse>> {
    if req.content.trim().is_empty() {
        return Err(ApiError::BadRequest("content must not be empty".to_string()));
    }

    let mut thread = state.chats.authorize(chat_id, user.id).await?;
    let outcome = state
        .chats
        .append_and_run(&mut thread, user.id, &req.content)
        .await?;

    let degraded = outcome.is_degraded();
    Ok(Json(SendMessageResponse {
        content: outcome.into_inner(),
        degraded,
    }))
}
