//! Arbor Core
//!
//! This crate provides data management and tree operations for the Arbor
//! tree-structure admin tool.
//!
//! # Architecture
//!
//! - **Flat storage**: one `nodes` table; the hierarchy is a self-referencing
//!   `parent_id` foreign key
//! - **libsql**: embedded SQLite-compatible database
//! - **Derived children**: child sets are computed by query or by filtering
//!   an in-memory arena, never stored per node
//!
//! # Modules
//!
//! - [`models`] - Data structures (Node, NewNode, TreeNode, ...)
//! - [`services`] - Business services (TreeService, seed data)
//! - [`db`] - Database layer with libsql integration

pub mod db;
pub mod models;
pub mod services;

// Re-export commonly used types
pub use db::{DatabaseError, DatabaseService, LibsqlStore, NodeStore};
pub use models::*;
pub use services::*;
