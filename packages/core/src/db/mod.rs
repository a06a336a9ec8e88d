//! Database Layer
//!
//! This module handles all database interactions using libsql:
//!
//! - Database initialization and connection management (`DatabaseService`)
//! - The `NodeStore` abstraction used by the service layer
//! - `LibsqlStore`, the libsql-backed `NodeStore`
//!
//! # Architecture
//!
//! A single `nodes` table holds the tree. The parent/child relation is the
//! self-referencing `parent_id` foreign key; child sets are always derived
//! by query, never stored.

mod database;
mod error;
mod libsql_store;
mod node_store;

pub use database::{DatabaseService, DbInsertNodeParams, DbUpdateNodeParams};
pub use error::DatabaseError;
pub use libsql_store::LibsqlStore;
pub use node_store::{NodeFilter, NodeStore, ParentFilter};
