//! Tree Service - Hierarchical Node Operations
//!
//! This module provides the business logic layer for the node tree:
//!
//! - Read operations (roots with nested children, children, descendants)
//! - Validated create and update
//! - Cascading delete (node plus every descendant, one commit)
//! - Reparent-and-remove (promote direct children, then delete the node)
//! - Demo reset (clear, seed)
//!
//! # Descendant Collection
//!
//! `collect_descendants` walks the tree one level at a time: each iteration
//! asks the store for the children of every node discovered in the previous
//! level, so the number of round-trips equals the depth of the subtree. A
//! visited set keeps the walk finite and duplicate-free even if the table
//! has been corrupted into a cycle.
//!
//! # Hierarchy Checks
//!
//! `update_node` and `reparent_children_and_remove` refuse to make a node
//! its own ancestor. These checks surface as
//! `ValidationFailed(ValidationError::InvalidParent)`.

use crate::db::{NodeFilter, NodeStore, ParentFilter};
use crate::models::{NewNode, Node, NodeArena, TreeNode, ValidationError};
use crate::services::error::TreeServiceError;
use crate::services::seed::animal_taxonomy;
use std::collections::HashSet;
use std::sync::Arc;

/// Upper bound on parent hops when walking up from a node
const MAX_ANCESTOR_DEPTH: usize = 10_000;

/// Business logic over a [`NodeStore`]
///
/// Cheap to clone; holds only the shared store handle.
#[derive(Clone)]
pub struct TreeService {
    store: Arc<dyn NodeStore>,
}

impl TreeService {
    pub fn new(store: Arc<dyn NodeStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn NodeStore> {
        &self.store
    }

    /// All root nodes with their children attached recursively
    pub async fn list_roots(&self) -> Result<Vec<TreeNode>, TreeServiceError> {
        let nodes = self.store.get_all().await?;
        Ok(NodeArena::new(nodes).into_forest())
    }

    /// Every node, ordered by name (choice lists)
    pub async fn list_nodes(&self) -> Result<Vec<Node>, TreeServiceError> {
        Ok(self.store.query(NodeFilter::new().ordered_by_name()).await?)
    }

    pub async fn get_node(&self, id: i64) -> Result<Option<Node>, TreeServiceError> {
        Ok(self.store.get(id).await?)
    }

    /// Like `get_node`, but a missing node is `NodeNotFound`
    pub async fn require_node(&self, id: i64) -> Result<Node, TreeServiceError> {
        self.store
            .get(id)
            .await?
            .ok_or_else(|| TreeServiceError::node_not_found(id))
    }

    pub async fn exists(&self, id: i64) -> Result<bool, TreeServiceError> {
        Ok(self.store.exists(id).await?)
    }

    /// Direct children of `parent_id`
    pub async fn get_children(&self, parent_id: i64) -> Result<Vec<Node>, TreeServiceError> {
        Ok(self.store.children(parent_id).await?)
    }

    pub async fn has_children(&self, id: i64) -> Result<bool, TreeServiceError> {
        Ok(!self.store.children(id).await?.is_empty())
    }

    /// Every node transitively below `parent_id`, in breadth-first order.
    ///
    /// The parent itself is not included. An unknown `parent_id` simply has
    /// no descendants.
    pub async fn collect_descendants(&self, parent_id: i64) -> Result<Vec<Node>, TreeServiceError> {
        let mut descendants = Vec::new();
        let mut visited = HashSet::from([parent_id]);
        let mut frontier = vec![parent_id];

        while !frontier.is_empty() {
            let children = self.store.children_of_any(&frontier).await?;

            frontier = Vec::with_capacity(children.len());
            for child in children {
                if visited.insert(child.id) {
                    frontier.push(child.id);
                    descendants.push(child);
                } else {
                    tracing::warn!(id = child.id, "cycle detected in node parents");
                }
            }
        }

        Ok(descendants)
    }

    /// Whether `candidate` lies in the subtree below `ancestor`
    ///
    /// Walks up the parent chain from `candidate`, so cost is proportional to
    /// the depth of `candidate` rather than the size of the subtree.
    pub async fn is_descendant(&self, ancestor: i64, candidate: i64) -> Result<bool, TreeServiceError> {
        let mut current = self.store.get(candidate).await?;

        for _ in 0..MAX_ANCESTOR_DEPTH {
            let Some(node) = current else {
                return Ok(false);
            };
            match node.parent_id {
                Some(parent_id) if parent_id == ancestor => return Ok(true),
                Some(parent_id) => current = self.store.get(parent_id).await?,
                None => return Ok(false),
            }
        }

        tracing::warn!(ancestor, candidate, "parent chain exceeded maximum depth");
        Ok(false)
    }

    /// Candidate new parents for the children of `id`: every node except `id`
    /// and its descendants, ordered by name.
    pub async fn movable_targets(&self, id: i64) -> Result<Vec<Node>, TreeServiceError> {
        let excluded = self
            .collect_descendants(id)
            .await?
            .into_iter()
            .map(|node| node.id)
            .chain(std::iter::once(id));

        Ok(self
            .store
            .query(NodeFilter::new().excluding(excluded).ordered_by_name())
            .await?)
    }

    /// Validate and persist a new node
    ///
    /// # Errors
    ///
    /// - `ValidationFailed` for a bad name
    /// - `NodeNotFound` if the chosen parent does not exist
    pub async fn create_node(&self, input: NewNode) -> Result<Node, TreeServiceError> {
        input.validate()?;

        if let Some(parent_id) = input.parent_id {
            if !self.store.exists(parent_id).await? {
                return Err(TreeServiceError::node_not_found(parent_id));
            }
        }

        let node = self.store.create(input).await?;
        tracing::info!(id = node.id, name = %node.name, "node added");
        Ok(node)
    }

    /// Validate and persist a node's new name and parent
    ///
    /// # Errors
    ///
    /// - `ValidationFailed` for a bad name, or a parent that is the node itself
    ///   or one of its descendants
    /// - `NodeNotFound` if the chosen parent does not exist
    /// - `ConcurrencyConflict` if the node vanished; callers should check
    ///   [`TreeService::exists`] to tell a deleted node from a genuine fault
    pub async fn update_node(&self, node: Node) -> Result<Node, TreeServiceError> {
        node.validate()?;

        if let Some(parent_id) = node.parent_id {
            if !self.store.exists(parent_id).await? {
                return Err(TreeServiceError::node_not_found(parent_id));
            }
            if self.is_descendant(node.id, parent_id).await? {
                return Err(ValidationError::InvalidParent(format!(
                    "Cannot move node {} under its descendant {}",
                    node.id, parent_id
                ))
                .into());
            }
        }

        let node = self.store.update(node).await?;
        tracing::info!(id = node.id, name = %node.name, parent_id = ?node.parent_id, "node updated");
        Ok(node)
    }

    /// Delete `id` together with every descendant in one transaction.
    ///
    /// Returns the number of nodes removed.
    pub async fn delete_cascade(&self, id: i64) -> Result<u64, TreeServiceError> {
        let node = self.require_node(id).await?;

        let mut to_remove = vec![node.id];
        to_remove.extend(self.collect_descendants(id).await?.into_iter().map(|n| n.id));

        let removed = self.store.bulk_delete(&to_remove).await?;
        tracing::info!(id, removed, "node removed with descendants");
        Ok(removed)
    }

    /// Move the direct children of `old_parent_id` under `new_parent_id`,
    /// then delete `old_parent_id`.
    ///
    /// Grandchildren stay attached to their own parents, so the whole subtree
    /// moves up one level with `old_parent_id` excised. Returns the number of
    /// children moved.
    ///
    /// # Errors
    ///
    /// - `NodeNotFound` if either node is missing
    /// - `ValidationFailed` if the target is the node itself or one of its
    ///   descendants
    /// - `ConcurrencyConflict` if a child or the node vanished mid-operation
    pub async fn reparent_children_and_remove(
        &self,
        old_parent_id: i64,
        new_parent_id: i64,
    ) -> Result<usize, TreeServiceError> {
        self.require_node(old_parent_id).await?;

        if new_parent_id == old_parent_id {
            return Err(ValidationError::InvalidParent(
                "New parent cannot be the node being removed".to_string(),
            )
            .into());
        }

        if !self.store.exists(new_parent_id).await? {
            return Err(TreeServiceError::node_not_found(new_parent_id));
        }

        if self.is_descendant(old_parent_id, new_parent_id).await? {
            return Err(ValidationError::InvalidParent(format!(
                "New parent {} is a descendant of node {}",
                new_parent_id, old_parent_id
            ))
            .into());
        }

        let children: Vec<Node> = self
            .store
            .children(old_parent_id)
            .await?
            .into_iter()
            .map(|child| Node {
                parent_id: Some(new_parent_id),
                ..child
            })
            .collect();
        let moved = children.len();

        self.store.bulk_update(children).await?;
        self.store.delete(old_parent_id).await?;

        tracing::info!(
            old_parent_id,
            new_parent_id,
            moved,
            "children moved and node removed"
        );
        Ok(moved)
    }

    /// Remove every node
    pub async fn clear(&self) -> Result<u64, TreeServiceError> {
        let removed = self.store.delete_all().await?;
        tracing::info!(removed, "tree cleared");
        Ok(removed)
    }

    /// Replace the tree with the demo animal taxonomy
    pub async fn seed(&self) -> Result<usize, TreeServiceError> {
        self.store.delete_all().await?;
        let inserted = self.store.bulk_insert(animal_taxonomy()).await?;
        tracing::info!(count = inserted.len(), "demo taxonomy loaded");
        Ok(inserted.len())
    }

    /// Whether the tree has at least one root
    pub async fn has_root(&self) -> Result<bool, TreeServiceError> {
        let roots = self
            .store
            .query(NodeFilter::new().with_parent(ParentFilter::Roots))
            .await?;
        Ok(!roots.is_empty())
    }
}
