//! HTTP server for the tree administration UI
//!
//! # Architecture
//!
//! Endpoints are grouped into modules that each contribute a router:
//! - `management_endpoints`: tree page and the create/edit/delete flows
//! - `api_endpoints`: JSON tree view and the health check
//!
//! Everything except the health check is wrapped in the administrator role
//! gate (`auth::require_admin`). Requests are traced with `tower-http`.
//!
//! # Usage
//!
//! ```bash
//! ARBOR_ADMIN_USER=me ARBOR_ADMIN_PASSWORD=secret cargo run --bin arbor-admin
//! ```

use std::sync::Arc;

use axum::{middleware, Router};
use tower_http::trace::TraceLayer;

use arbor_core::TreeService;

use crate::config::{Account, AdminConfig};

pub mod auth;
pub mod forms;
mod api_endpoints;
mod http_error;
mod management_endpoints;

pub use http_error::HttpError;

/// Application state shared across all endpoints
#[derive(Clone)]
pub struct AppState {
    pub tree_service: Arc<TreeService>,
    pub accounts: Arc<Vec<Account>>,
}

impl AppState {
    pub fn new(tree_service: TreeService, accounts: Vec<Account>) -> Self {
        Self {
            tree_service: Arc::new(tree_service),
            accounts: Arc::new(accounts),
        }
    }
}

/// Create the main application router with all endpoint modules
pub fn create_router(state: AppState) -> Router {
    let gated = Router::new()
        .merge(management_endpoints::routes(state.clone()))
        .merge(api_endpoints::routes(state.clone()))
        .route_layer(middleware::from_fn_with_state(state, auth::require_admin));

    Router::new()
        .merge(gated)
        .merge(api_endpoints::public_routes())
        .layer(TraceLayer::new_for_http())
}

/// Start the HTTP server
///
/// # Errors
///
/// Returns error if the server fails to bind or start.
pub async fn start_server(tree_service: TreeService, config: &AdminConfig) -> anyhow::Result<()> {
    let state = AppState::new(tree_service, config.accounts.clone());
    let app = create_router(state);

    let addr = format!("127.0.0.1:{}", config.port);
    tracing::info!("Arbor admin server starting on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
