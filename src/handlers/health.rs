use axum::extract::State;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct Health {
    pub status: &'static str,
    pub timestamp: DateTime<Utc>,
    pub database: &'static str,
}

/// GET / - Service description
pub async fn root() -> ApiResult<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Ok(ApiResponse::success(
        json!({
            "name": "Blog API",
            "version": version,
            "endpoints": {
                "posts": "/posts[/:postId] (GET public, POST/PATCH/DELETE require a bearer token)",
                "comments": "/posts/:postId/comments (GET public, POST requires a bearer token)",
                "comment": "/comments/:commentId (PATCH/DELETE require a bearer token)",
                "health": "/health (public)",
            }
        }),
        "Blog API is running.",
    ))
}

/// GET /health - Store connectivity
pub async fn health(State(state): State<AppState>) -> ApiResult<Health> {
    if let Err(e) = state.store.ping().await {
        tracing::warn!("Health check failed: {}", e);
        return Err(ApiError::service_unavailable("database unavailable"));
    }

    Ok(ApiResponse::success(
        Health {
            status: "ok",
            timestamp: Utc::now(),
            database: "ok",
        },
        "Service healthy.",
    ))
}
