//! NodeStore Trait - Database Abstraction Layer
//!
//! This module defines the `NodeStore` trait that abstracts persistence for
//! tree nodes. `TreeService` only talks to this trait, so tests and
//! alternative backends can stand in for the libsql implementation.
//!
//! # Design Decisions
//!
//! 1. **Async-First**: all methods are async; every call is one store
//!    round-trip
//! 2. **Immediate Commit**: each mutation commits before returning; the
//!    `bulk_*` methods commit once for the whole set
//! 3. **Optimistic Concurrency**: `update` and `delete` report
//!    `DatabaseError::ConcurrencyConflict` when the row is gone
//!
//! # Examples
//!
//! ```rust,no_run
//! use arbor_core::db::{DatabaseService, LibsqlStore, NodeStore};
//! use arbor_core::models::NewNode;
//! use std::path::PathBuf;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let db = Arc::new(DatabaseService::new(PathBuf::from("./data/arbor.db")).await?);
//!     let store: Arc<dyn NodeStore> = Arc::new(LibsqlStore::new(db));
//!
//!     let animals = store.create(NewNode::root("Animals")).await?;
//!     let children = store.children(animals.id).await?;
//!     assert!(children.is_empty());
//!     Ok(())
//! }
//! ```

use crate::db::DatabaseError;
use crate::models::{NewNode, Node};
use async_trait::async_trait;

/// Which parent a query is restricted to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ParentFilter {
    /// Every node
    #[default]
    Any,
    /// Nodes without a parent
    Roots,
    /// Direct children of the given node
    ChildrenOf(i64),
}

/// Filter for [`NodeStore::query`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeFilter {
    pub parent: ParentFilter,
    /// Identifiers to leave out of the result
    pub exclude: Vec<i64>,
    /// Order case-insensitively by name instead of by id
    pub order_by_name: bool,
}

impl NodeFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_parent(mut self, parent: ParentFilter) -> Self {
        self.parent = parent;
        self
    }

    pub fn excluding(mut self, ids: impl IntoIterator<Item = i64>) -> Self {
        self.exclude.extend(ids);
        self
    }

    pub fn ordered_by_name(mut self) -> Self {
        self.order_by_name = true;
        self
    }
}

/// Abstraction layer for node persistence operations
///
/// Implementations must be `Send + Sync` so a single store can be shared by
/// every request handler.
#[async_trait]
pub trait NodeStore: Send + Sync {
    /// Persist a new node, returning it with its assigned identifier
    ///
    /// # Errors
    ///
    /// Fails if an explicit id already exists or the parent is missing.
    async fn create(&self, node: NewNode) -> Result<Node, DatabaseError>;

    /// Get node by ID; `Ok(None)` when absent
    async fn get(&self, id: i64) -> Result<Option<Node>, DatabaseError>;

    /// Every node, ordered by id
    async fn get_all(&self) -> Result<Vec<Node>, DatabaseError> {
        self.query(NodeFilter::new()).await
    }

    /// Nodes matching `filter`
    async fn query(&self, filter: NodeFilter) -> Result<Vec<Node>, DatabaseError>;

    /// Direct children of `parent_id`
    async fn children(&self, parent_id: i64) -> Result<Vec<Node>, DatabaseError> {
        self.query(NodeFilter::new().with_parent(ParentFilter::ChildrenOf(parent_id)))
            .await
    }

    /// Direct children of any of `parent_ids`, in a single round-trip
    async fn children_of_any(&self, parent_ids: &[i64]) -> Result<Vec<Node>, DatabaseError>;

    /// Presence check
    async fn exists(&self, id: i64) -> Result<bool, DatabaseError>;

    /// Overwrite name and parent of an existing node
    ///
    /// # Errors
    ///
    /// `ConcurrencyConflict` if no row with `node.id` exists.
    async fn update(&self, node: Node) -> Result<Node, DatabaseError>;

    /// Delete a single node
    ///
    /// # Errors
    ///
    /// `ConcurrencyConflict` if no row with `id` exists.
    async fn delete(&self, id: i64) -> Result<(), DatabaseError>;

    /// Delete a set of nodes in one transaction, returning how many rows went
    async fn bulk_delete(&self, ids: &[i64]) -> Result<u64, DatabaseError>;

    /// Update a set of nodes in one transaction
    ///
    /// # Errors
    ///
    /// `ConcurrencyConflict` (nothing applied) if any node is missing.
    async fn bulk_update(&self, nodes: Vec<Node>) -> Result<(), DatabaseError>;

    /// Insert a set of nodes in one transaction, returning the stored nodes
    async fn bulk_insert(&self, nodes: Vec<NewNode>) -> Result<Vec<Node>, DatabaseError>;

    /// Remove every node and restart identifier assignment
    async fn delete_all(&self) -> Result<u64, DatabaseError>;
}
