use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use crate::{error::ApiResult, state::AppState};

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub services: HashMap<String, String>,
}

/// Health check endpoint
///
/// Reports registry connectivity and which checkpoint backend is serving.
pub async fn health_check(State(state): State<Arc<AppState>>) -> ApiResult<Json<HealthResponse>> {
    let mut services = HashMap::new();

    let database = match state.persist.get_user(0).await {
        Ok(_) => "connected",
        Err(e) => {
            tracing::warn!(error = %e, "Registry health check failed");
            "disconnected"
        }
    };
    services.insert("database".to_string(), database.to_string());
    services.insert(
        "checkpointer".to_string(),
        state.chats.checkpoint_backend().await.to_string(),
    );

    Ok(Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        services,
    }))
}
