use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use parley_persist::User;
use std::sync::Arc;

use crate::{error::ApiError, state::AppState};

/// Header carrying the authenticated user id, set by the auth layer in front
pub const USER_HEADER: &str = "x-user-id";

/// The caller, resolved from `x-user-id`
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

#[async_trait]
impl FromRequestParts<Arc<AppState>> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(USER_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ApiError::Unauthorized(format!("missing {USER_HEADER} header")))?;

        let user_id: i64 = raw
            .trim()
            .parse()
            .map_err(|_| ApiError::Unauthorized(format!("invalid {USER_HEADER} header")))?;

        let user = state
            .persist
            .get_user(user_id)
            .await?
            .ok_or_else(|| ApiError::Unauthorized("unknown user".to_string()))?;

        Ok(CurrentUser(user))
    }
}
