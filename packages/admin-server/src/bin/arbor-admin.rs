//! Arbor Admin Server Binary
//!
//! # Usage
//!
//! ```bash
//! # Default settings (port 3001, ~/.arbor/database/arbor.db)
//! cargo run --bin arbor-admin
//!
//! # Custom port, fresh demo data
//! ARBOR_PORT=3002 ARBOR_SEED_ON_START=true cargo run --bin arbor-admin
//! ```
//!
//! # Environment Variables
//!
//! - `ARBOR_CONFIG`: JSON preferences file
//! - `ARBOR_PORT`, `ARBOR_DB_PATH`, `ARBOR_ADMIN_USER`, `ARBOR_ADMIN_PASSWORD`,
//!   `ARBOR_SEED_ON_START`: see `arbor_admin::config`
//! - `RUST_LOG`: Logging level (e.g., "info", "debug", "trace")

use std::sync::Arc;

use arbor_admin::{start_server, AdminConfig};
use arbor_core::{DatabaseService, LibsqlStore, TreeService};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    tracing::info!("Arbor Admin Server");

    let config = AdminConfig::load().await?;
    tracing::info!("Port: {}", config.port);
    tracing::info!("Database: {}", config.database_path.display());

    let db = Arc::new(DatabaseService::new(config.database_path.clone()).await?);
    let tree_service = TreeService::new(Arc::new(LibsqlStore::new(db)));

    if config.seed_on_start {
        let count = tree_service.seed().await?;
        tracing::info!("Loaded {} demo nodes", count);
    } else if !tree_service.has_root().await? {
        tracing::info!("Tree is empty, visit /management/load for demo data");
    }

    start_server(tree_service, &config).await?;

    Ok(())
}
