//! Service Layer Error Types
//!
//! This module defines error types for tree operations.

use crate::db::DatabaseError;
use crate::models::ValidationError;
use thiserror::Error;

/// Tree operation errors
#[derive(Error, Debug)]
pub enum TreeServiceError {
    /// Node not found by ID
    #[error("Node not found: {id}")]
    NodeNotFound { id: i64 },

    /// Validation failed for node input
    #[error("Node validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),

    /// Target row vanished between load and save
    #[error("Concurrency conflict on node {id}")]
    ConcurrencyConflict { id: i64 },

    /// Database operation failed
    #[error("Database operation failed: {0}")]
    DatabaseError(DatabaseError),
}

impl From<DatabaseError> for TreeServiceError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::ConcurrencyConflict { id } => Self::ConcurrencyConflict { id },
            other => Self::DatabaseError(other),
        }
    }
}

impl TreeServiceError {
    /// Create a node not found error
    pub fn node_not_found(id: i64) -> Self {
        Self::NodeNotFound { id }
    }
}
