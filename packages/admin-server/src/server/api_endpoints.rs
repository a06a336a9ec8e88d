//! JSON API endpoints
//!
//! - `GET /api/health` - Health check (no authentication)
//! - `GET /api/tree` - Roots with nested children (administrators only)

use axum::{extract::State, response::Json, routing::get, Router};
use serde::Serialize;

use arbor_core::TreeNode;

use crate::server::{AppState, HttpError};

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: String,
    pub version: String,
}

/// Health check endpoint
///
/// ```bash
/// curl http://localhost:3001/api/health
/// ```
async fn health_check() -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

async fn get_tree(State(state): State<AppState>) -> Result<Json<Vec<TreeNode>>, HttpError> {
    Ok(Json(state.tree_service.list_roots().await?))
}

/// Routes reachable without signing in
pub fn public_routes() -> Router {
    Router::new().route("/api/health", get(health_check))
}

/// Routes behind the role gate
pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/api/tree", get(get_tree))
        .with_state(state)
}
