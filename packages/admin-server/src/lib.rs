//! Arbor administration server
//!
//! Web surface over `arbor-core`: role-gated management actions, the
//! collapsible tree page, and runtime configuration.

pub mod config;
pub mod constants;
pub mod server;
pub mod tree_view;

pub use config::{Account, AdminConfig, ConfigError};
pub use server::{create_router, start_server, AppState, HttpError};
pub use tree_view::{render_tree, TreeViewState};
