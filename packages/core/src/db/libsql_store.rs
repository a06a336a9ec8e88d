//! LibsqlStore - NodeStore Implementation for the libsql Backend
//!
//! Thin wrapper around `DatabaseService`: every method delegates to a `db_*`
//! operation and converts `libsql::Row` values into `Node` models.

use crate::db::database::{DbInsertNodeParams, DbUpdateNodeParams};
use crate::db::node_store::{NodeFilter, NodeStore, ParentFilter};
use crate::db::{DatabaseError, DatabaseService};
use crate::models::{NewNode, Node};
use async_trait::async_trait;
use libsql::Row;
use std::collections::HashSet;
use std::sync::Arc;

/// NodeStore implementation backed by a libsql database file
#[derive(Debug, Clone)]
pub struct LibsqlStore {
    db: Arc<DatabaseService>,
}

impl LibsqlStore {
    pub fn new(db: Arc<DatabaseService>) -> Self {
        Self { db }
    }

    /// Underlying database service
    pub fn database(&self) -> &Arc<DatabaseService> {
        &self.db
    }

    /// Convert a row selected with `NODE_COLUMNS` into a Node
    fn row_to_node(row: &Row) -> Result<Node, DatabaseError> {
        let id: i64 = row
            .get(0)
            .map_err(|e| DatabaseError::sql_execution(format!("Failed to get id: {}", e)))?;
        let name: String = row
            .get(1)
            .map_err(|e| DatabaseError::sql_execution(format!("Failed to get name: {}", e)))?;
        let parent_id: Option<i64> = row.get(2).map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to get parent_id: {}", e))
        })?;

        Ok(Node {
            id,
            name,
            parent_id,
        })
    }

    async fn collect_rows(mut rows: libsql::Rows) -> Result<Vec<Node>, DatabaseError> {
        let mut nodes = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| DatabaseError::sql_execution(e.to_string()))?
        {
            nodes.push(Self::row_to_node(&row)?);
        }
        Ok(nodes)
    }
}

#[async_trait]
impl NodeStore for LibsqlStore {
    async fn create(&self, node: NewNode) -> Result<Node, DatabaseError> {
        let id = self
            .db
            .db_insert_node(DbInsertNodeParams {
                id: node.id,
                name: &node.name,
                parent_id: node.parent_id,
            })
            .await?;

        tracing::debug!(id, name = %node.name, parent_id = ?node.parent_id, "node created");

        Ok(Node {
            id,
            name: node.name,
            parent_id: node.parent_id,
        })
    }

    async fn get(&self, id: i64) -> Result<Option<Node>, DatabaseError> {
        match self.db.db_get_node(id).await? {
            Some(row) => Ok(Some(Self::row_to_node(&row)?)),
            None => Ok(None),
        }
    }

    async fn query(&self, filter: NodeFilter) -> Result<Vec<Node>, DatabaseError> {
        let parent = match filter.parent {
            ParentFilter::Any => None,
            ParentFilter::Roots => Some(None),
            ParentFilter::ChildrenOf(parent_id) => Some(Some(parent_id)),
        };

        let rows = self.db.db_query_nodes(parent, filter.order_by_name).await?;
        let mut nodes = Self::collect_rows(rows).await?;

        if !filter.exclude.is_empty() {
            let excluded: HashSet<i64> = filter.exclude.into_iter().collect();
            nodes.retain(|node| !excluded.contains(&node.id));
        }

        Ok(nodes)
    }

    async fn children_of_any(&self, parent_ids: &[i64]) -> Result<Vec<Node>, DatabaseError> {
        if parent_ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = self.db.db_get_children_of(parent_ids).await?;
        Self::collect_rows(rows).await
    }

    async fn exists(&self, id: i64) -> Result<bool, DatabaseError> {
        self.db.db_node_exists(id).await
    }

    async fn update(&self, node: Node) -> Result<Node, DatabaseError> {
        let rows_affected = self
            .db
            .db_update_node(DbUpdateNodeParams {
                id: node.id,
                name: &node.name,
                parent_id: node.parent_id,
            })
            .await?;

        if rows_affected == 0 {
            return Err(DatabaseError::concurrency_conflict(node.id));
        }

        Ok(node)
    }

    async fn delete(&self, id: i64) -> Result<(), DatabaseError> {
        if self.db.db_delete_node(id).await? == 0 {
            return Err(DatabaseError::concurrency_conflict(id));
        }
        Ok(())
    }

    async fn bulk_delete(&self, ids: &[i64]) -> Result<u64, DatabaseError> {
        self.db.db_batch_delete_nodes(ids).await
    }

    async fn bulk_update(&self, nodes: Vec<Node>) -> Result<(), DatabaseError> {
        let params = nodes
            .iter()
            .map(|node| DbUpdateNodeParams {
                id: node.id,
                name: &node.name,
                parent_id: node.parent_id,
            })
            .collect();

        self.db.db_batch_update_nodes(params).await
    }

    async fn bulk_insert(&self, nodes: Vec<NewNode>) -> Result<Vec<Node>, DatabaseError> {
        let params = nodes
            .iter()
            .map(|node| DbInsertNodeParams {
                id: node.id,
                name: &node.name,
                parent_id: node.parent_id,
            })
            .collect();

        let ids = self.db.db_batch_insert_nodes(params).await?;

        Ok(ids
            .into_iter()
            .zip(nodes)
            .map(|(id, node)| Node {
                id,
                name: node.name,
                parent_id: node.parent_id,
            })
            .collect())
    }

    async fn delete_all(&self) -> Result<u64, DatabaseError> {
        self.db.db_delete_all().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn create_test_store() -> (LibsqlStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db = DatabaseService::new(temp_dir.path().join("test.db"))
            .await
            .unwrap();
        (LibsqlStore::new(Arc::new(db)), temp_dir)
    }

    #[tokio::test]
    async fn test_create_then_get_round_trip() {
        let (store, _temp) = create_test_store().await;

        let animals = store.create(NewNode::root("Animals")).await.unwrap();
        let mammals = store
            .create(NewNode::child("Mammals", animals.id))
            .await
            .unwrap();

        let fetched = store.get(mammals.id).await.unwrap().unwrap();
        assert_eq!(fetched.name, "Mammals");
        assert_eq!(fetched.parent_id, Some(animals.id));
        assert_eq!(fetched, mammals);
    }

    #[tokio::test]
    async fn test_query_filters() {
        let (store, _temp) = create_test_store().await;

        let animals = store.create(NewNode::root("Animals")).await.unwrap();
        let plants = store.create(NewNode::root("plants")).await.unwrap();
        let birds = store
            .create(NewNode::child("Birds", animals.id))
            .await
            .unwrap();
        store
            .create(NewNode::child("amphibians", animals.id))
            .await
            .unwrap();

        let roots = store
            .query(NodeFilter::new().with_parent(ParentFilter::Roots))
            .await
            .unwrap();
        assert_eq!(roots.len(), 2);

        let ordered: Vec<String> = store
            .query(NodeFilter::new().ordered_by_name().excluding([plants.id]))
            .await
            .unwrap()
            .into_iter()
            .map(|n| n.name)
            .collect();
        assert_eq!(ordered, vec!["amphibians", "Animals", "Birds"]);

        let children = store.children(animals.id).await.unwrap();
        assert_eq!(children.len(), 2);
        assert!(store.children(birds.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_children_of_any() {
        let (store, _temp) = create_test_store().await;

        let a = store.create(NewNode::root("a")).await.unwrap();
        let b = store.create(NewNode::root("b")).await.unwrap();
        store.create(NewNode::child("a1", a.id)).await.unwrap();
        store.create(NewNode::child("b1", b.id)).await.unwrap();
        store.create(NewNode::child("b2", b.id)).await.unwrap();

        let children = store.children_of_any(&[a.id, b.id]).await.unwrap();
        assert_eq!(children.len(), 3);
        assert!(store.children_of_any(&[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_missing_node_is_conflict() {
        let (store, _temp) = create_test_store().await;

        let result = store.update(Node::new(77, "ghost", None)).await;
        assert!(matches!(
            result,
            Err(DatabaseError::ConcurrencyConflict { id: 77 })
        ));

        let result = store.delete(77).await;
        assert!(matches!(
            result,
            Err(DatabaseError::ConcurrencyConflict { id: 77 })
        ));
    }

    #[tokio::test]
    async fn test_bulk_insert_and_delete_subtree() {
        let (store, _temp) = create_test_store().await;

        let inserted = store
            .bulk_insert(vec![
                NewNode::root("Animals").with_id(1),
                NewNode::child("Mammals", 1).with_id(2),
                NewNode::child("dogs", 2).with_id(3),
            ])
            .await
            .unwrap();
        assert_eq!(
            inserted.iter().map(|n| n.id).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );

        // Parent first: deferred foreign keys only check at commit
        let removed = store.bulk_delete(&[1, 2, 3]).await.unwrap();
        assert_eq!(removed, 3);
        assert!(store.get_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_bulk_delete_partial_subtree_fails() {
        let (store, _temp) = create_test_store().await;

        store
            .bulk_insert(vec![
                NewNode::root("Animals").with_id(1),
                NewNode::child("Mammals", 1).with_id(2),
            ])
            .await
            .unwrap();

        assert!(store.bulk_delete(&[1]).await.is_err());
        assert_eq!(store.get_all().await.unwrap().len(), 2);
    }
}
