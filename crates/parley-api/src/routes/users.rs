use axum::{extract::State, http::StatusCode, Json};
use parley_persist::{NewUser, User};
use serde::Deserialize;
use std::sync::Arc;

use crate::{
    auth::CurrentUser,
    error::{ApiError, ApiResult},
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub email: Option<String>,
}

/// Register a user (stand-in for the external auth provider)
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateUserRequest>,
) -> ApiResult<(StatusCode, Json<User>)> {
    let username = req.username.trim();
    if username.is_empty() {
        return Err(ApiError::BadRequest("username must not be empty".to_string()));
    }

    let mut new_user = NewUser::new(username);
    new_user.email = req.email;

    let user = state.persist.create_user(new_user).await?;
    tracing::info!(user_id = user.id, "User registered");

    Ok((StatusCode::CREATED, Json(user)))
}

/// The caller's own account
pub async fn me(CurrentUser(user): CurrentUser) -> Json<User> {
    Json(user)
}
