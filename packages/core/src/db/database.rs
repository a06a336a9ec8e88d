//! Database Connection Management
//!
//! This module provides the database connection, schema initialization and
//! the raw SQL operations for the `nodes` table using libsql.
//!
//! # Architecture
//!
//! - **Single table**: `nodes(id, name, parent_id)` with a self-referencing
//!   foreign key on `parent_id`
//! - **Deferred foreign keys**: the parent reference is checked at commit,
//!   so a batch may delete a parent before its children
//! - **WAL mode**: Write-Ahead Logging for better concurrency
//! - **Per-call connections**: every operation opens its own connection and
//!   commits before returning; batch operations commit exactly once
//!
//! # Database Connection Patterns
//!
//! **Use `connect_with_timeout()` in async functions.** It applies the busy
//! timeout and enables foreign keys, both of which are per-connection
//! settings in SQLite.
//!
//! ```no_run
//! # use arbor_core::db::DatabaseService;
//! # use std::path::PathBuf;
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let db_service = DatabaseService::new(PathBuf::from("./data/arbor.db")).await?;
//! let conn = db_service.connect_with_timeout().await?;
//! # Ok(())
//! # }
//! ```

use crate::db::error::DatabaseError;
use libsql::{Builder, Database};
use std::path::PathBuf;
use std::sync::Arc;

/// Column list shared by every node query; `row_to_node` relies on this order.
pub(crate) const NODE_COLUMNS: &str = "id, name, parent_id";

/// Database service for managing the libsql connection and schema
///
/// # Examples
///
/// ```no_run
/// use arbor_core::db::DatabaseService;
/// use std::path::PathBuf;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let db_path = PathBuf::from("/path/to/arbor.db");
///     let db_service = DatabaseService::new(db_path).await?;
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct DatabaseService {
    /// libsql database handle (wrapped in Arc for sharing)
    pub db: Arc<Database>,

    /// Path to the database file
    pub db_path: PathBuf,
}

/// Parameters for node insertion
#[derive(Debug, Clone, Copy)]
pub struct DbInsertNodeParams<'a> {
    /// Explicit identifier, or `None` to let AUTOINCREMENT assign one
    pub id: Option<i64>,
    pub name: &'a str,
    pub parent_id: Option<i64>,
}

/// Parameters for node update
#[derive(Debug, Clone, Copy)]
pub struct DbUpdateNodeParams<'a> {
    pub id: i64,
    pub name: &'a str,
    pub parent_id: Option<i64>,
}

impl DatabaseService {
    /// Create a new DatabaseService with the specified database path
    ///
    /// This will:
    /// 1. Ensure the parent directory exists (create if needed)
    /// 2. Open/create the database file
    /// 3. Initialize the schema (CREATE TABLE IF NOT EXISTS)
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the parent directory cannot be created, the
    /// connection fails, or schema initialization fails.
    pub async fn new(db_path: PathBuf) -> Result<Self, DatabaseError> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    if e.kind() == std::io::ErrorKind::PermissionDenied {
                        DatabaseError::permission_denied(db_path.clone())
                    } else {
                        DatabaseError::DirectoryCreationFailed(e)
                    }
                })?;
            }
        }

        let db = Builder::new_local(&db_path)
            .build()
            .await
            .map_err(|e| DatabaseError::connection_failed(db_path.clone(), e))?;

        let service = Self {
            db: Arc::new(db),
            db_path,
        };

        service.initialize_schema().await?;

        tracing::debug!(path = %service.db_path.display(), "database ready");

        Ok(service)
    }

    /// Execute a PRAGMA statement
    ///
    /// PRAGMA statements may return rows, so they go through query() rather
    /// than execute().
    async fn execute_pragma(
        &self,
        conn: &libsql::Connection,
        pragma: &str,
    ) -> Result<(), DatabaseError> {
        let mut stmt = conn.prepare(pragma).await.map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to execute '{}': {}", pragma, e))
        })?;
        let _ = stmt.query(()).await.map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to execute '{}': {}", pragma, e))
        })?;
        Ok(())
    }

    /// Initialize database schema and configuration
    ///
    /// Idempotent: safe to call against an existing database file.
    async fn initialize_schema(&self) -> Result<(), DatabaseError> {
        let conn = self.connect_with_timeout().await?;

        self.execute_pragma(&conn, "PRAGMA journal_mode = WAL")
            .await?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS nodes (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                parent_id INTEGER NULL,
                -- No ON DELETE action: removing a parent with live children must fail.
                -- Checked at COMMIT so one batch can remove a whole subtree.
                FOREIGN KEY (parent_id) REFERENCES nodes(id) DEFERRABLE INITIALLY DEFERRED
            )",
            (),
        )
        .await
        .map_err(|e| {
            DatabaseError::initialization_failed(format!("Failed to create nodes table: {}", e))
        })?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_nodes_parent ON nodes(parent_id)",
            (),
        )
        .await
        .map_err(|e| {
            DatabaseError::initialization_failed(format!(
                "Failed to create idx_nodes_parent: {}",
                e
            ))
        })?;

        Ok(())
    }

    /// Get a raw connection to the database
    ///
    /// Prefer `connect_with_timeout()`; a raw connection has neither the busy
    /// timeout nor foreign key enforcement.
    pub fn connect(&self) -> Result<libsql::Connection, DatabaseError> {
        self.db.connect().map_err(DatabaseError::LibsqlError)
    }

    /// Get a connection with busy timeout and foreign keys configured
    pub async fn connect_with_timeout(&self) -> Result<libsql::Connection, DatabaseError> {
        let conn = self.connect()?;

        self.execute_pragma(&conn, "PRAGMA busy_timeout = 5000")
            .await?;
        self.execute_pragma(&conn, "PRAGMA foreign_keys = ON")
            .await?;

        Ok(conn)
    }

    //
    // NODE OPERATIONS
    // Raw SQL for the NodeStore implementation. Rows are converted to models
    // by `LibsqlStore`.
    //

    /// Insert a node, returning the identifier the row was stored under
    pub async fn db_insert_node(&self, params: DbInsertNodeParams<'_>) -> Result<i64, DatabaseError> {
        let conn = self.connect_with_timeout().await?;

        conn.execute(
            "INSERT INTO nodes (id, name, parent_id) VALUES (?, ?, ?)",
            (params.id, params.name, params.parent_id),
        )
        .await
        .map_err(|e| DatabaseError::sql_execution(format!("Failed to insert node: {}", e)))?;

        Ok(params.id.unwrap_or_else(|| conn.last_insert_rowid()))
    }

    /// Retrieve a single node row by ID
    ///
    /// * `Ok(Some(row))` - Node found
    /// * `Ok(None)` - Node not found in database
    pub async fn db_get_node(&self, id: i64) -> Result<Option<libsql::Row>, DatabaseError> {
        let conn = self.connect_with_timeout().await?;

        let mut stmt = conn
            .prepare(&format!("SELECT {} FROM nodes WHERE id = ?", NODE_COLUMNS))
            .await
            .map_err(|e| {
                DatabaseError::sql_execution(format!("Failed to prepare get_node query: {}", e))
            })?;

        let mut rows = stmt.query([id]).await.map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to execute get_node query: {}", e))
        })?;

        rows.next()
            .await
            .map_err(|e| DatabaseError::sql_execution(e.to_string()))
    }

    /// Check whether a row with `id` exists
    pub async fn db_node_exists(&self, id: i64) -> Result<bool, DatabaseError> {
        let conn = self.connect_with_timeout().await?;

        let mut rows = conn
            .query("SELECT 1 FROM nodes WHERE id = ? LIMIT 1", [id])
            .await
            .map_err(|e| {
                DatabaseError::sql_execution(format!("Failed to execute exists query: {}", e))
            })?;

        let row = rows
            .next()
            .await
            .map_err(|e| DatabaseError::sql_execution(e.to_string()))?;

        Ok(row.is_some())
    }

    /// Query nodes with an optional parent condition
    ///
    /// # Arguments
    ///
    /// * `parent` - `None` for every node, `Some(None)` for roots only,
    ///   `Some(Some(id))` for the children of `id`
    /// * `order_by_name` - order case-insensitively by name (ties by id)
    pub async fn db_query_nodes(
        &self,
        parent: Option<Option<i64>>,
        order_by_name: bool,
    ) -> Result<libsql::Rows, DatabaseError> {
        let conn = self.connect_with_timeout().await?;

        let order_clause = if order_by_name {
            " ORDER BY name COLLATE NOCASE, id"
        } else {
            " ORDER BY id"
        };

        let result = match parent {
            None => {
                conn.query(
                    &format!("SELECT {} FROM nodes{}", NODE_COLUMNS, order_clause),
                    (),
                )
                .await
            }
            Some(None) => {
                conn.query(
                    &format!(
                        "SELECT {} FROM nodes WHERE parent_id IS NULL{}",
                        NODE_COLUMNS, order_clause
                    ),
                    (),
                )
                .await
            }
            Some(Some(parent_id)) => {
                conn.query(
                    &format!(
                        "SELECT {} FROM nodes WHERE parent_id = ?{}",
                        NODE_COLUMNS, order_clause
                    ),
                    [parent_id],
                )
                .await
            }
        };

        result.map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to execute query_nodes: {}", e))
        })
    }

    /// Get the direct children of every parent in `parent_ids` in one query
    ///
    /// Identifiers are integers, so they are inlined into the `IN` list.
    pub async fn db_get_children_of(
        &self,
        parent_ids: &[i64],
    ) -> Result<libsql::Rows, DatabaseError> {
        let conn = self.connect_with_timeout().await?;

        let id_list = parent_ids
            .iter()
            .map(i64::to_string)
            .collect::<Vec<_>>()
            .join(", ");

        conn.query(
            &format!(
                "SELECT {} FROM nodes WHERE parent_id IN ({}) ORDER BY id",
                NODE_COLUMNS, id_list
            ),
            (),
        )
        .await
        .map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to execute get_children_of: {}", e))
        })
    }

    /// Update name and parent of a node
    ///
    /// Returns the number of rows affected (0 = node no longer exists).
    pub async fn db_update_node(&self, params: DbUpdateNodeParams<'_>) -> Result<u64, DatabaseError> {
        let conn = self.connect_with_timeout().await?;

        conn.execute(
            "UPDATE nodes SET name = ?, parent_id = ? WHERE id = ?",
            (params.name, params.parent_id, params.id),
        )
        .await
        .map_err(|e| DatabaseError::sql_execution(format!("Failed to update node: {}", e)))
    }

    /// Delete a node
    ///
    /// Returns the number of rows affected (0 = node didn't exist). Fails if
    /// the node still has children.
    pub async fn db_delete_node(&self, id: i64) -> Result<u64, DatabaseError> {
        let conn = self.connect_with_timeout().await?;

        conn.execute("DELETE FROM nodes WHERE id = ?", [id])
            .await
            .map_err(|e| DatabaseError::sql_execution(format!("Failed to delete node: {}", e)))
    }

    /// Batch insert nodes in a single transaction
    ///
    /// Returns the identifiers in input order. Rolled back on any error.
    pub async fn db_batch_insert_nodes(
        &self,
        nodes: Vec<DbInsertNodeParams<'_>>,
    ) -> Result<Vec<i64>, DatabaseError> {
        if nodes.is_empty() {
            return Ok(Vec::new());
        }

        let conn = self.connect_with_timeout().await?;

        conn.execute("BEGIN TRANSACTION", ()).await.map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to begin transaction: {}", e))
        })?;

        let mut inserted_ids = Vec::with_capacity(nodes.len());

        for params in nodes {
            let result = conn
                .execute(
                    "INSERT INTO nodes (id, name, parent_id) VALUES (?, ?, ?)",
                    (params.id, params.name, params.parent_id),
                )
                .await;

            if let Err(e) = result {
                let _rollback = conn.execute("ROLLBACK", ()).await;
                return Err(DatabaseError::sql_execution(format!(
                    "Failed to insert node '{}': {}",
                    params.name, e
                )));
            }

            inserted_ids.push(params.id.unwrap_or_else(|| conn.last_insert_rowid()));
        }

        Self::commit(&conn).await?;

        Ok(inserted_ids)
    }

    /// Batch update nodes in a single transaction
    ///
    /// Fails with `ConcurrencyConflict` (after rolling back) if any node is
    /// missing.
    pub async fn db_batch_update_nodes(
        &self,
        updates: Vec<DbUpdateNodeParams<'_>>,
    ) -> Result<(), DatabaseError> {
        if updates.is_empty() {
            return Ok(());
        }

        let conn = self.connect_with_timeout().await?;

        conn.execute("BEGIN TRANSACTION", ()).await.map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to begin transaction: {}", e))
        })?;

        for params in updates {
            let result = conn
                .execute(
                    "UPDATE nodes SET name = ?, parent_id = ? WHERE id = ?",
                    (params.name, params.parent_id, params.id),
                )
                .await;

            match result {
                Ok(0) => {
                    let _rollback = conn.execute("ROLLBACK", ()).await;
                    return Err(DatabaseError::concurrency_conflict(params.id));
                }
                Ok(_) => {}
                Err(e) => {
                    let _rollback = conn.execute("ROLLBACK", ()).await;
                    return Err(DatabaseError::sql_execution(format!(
                        "Failed to update node {}: {}",
                        params.id, e
                    )));
                }
            }
        }

        Self::commit(&conn).await
    }

    /// Batch delete nodes in a single transaction
    ///
    /// Returns the number of rows removed. Ids that are already gone are
    /// skipped; the commit fails if a surviving node still points at a
    /// removed one.
    pub async fn db_batch_delete_nodes(&self, ids: &[i64]) -> Result<u64, DatabaseError> {
        if ids.is_empty() {
            return Ok(0);
        }

        let conn = self.connect_with_timeout().await?;

        conn.execute("BEGIN TRANSACTION", ()).await.map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to begin transaction: {}", e))
        })?;

        let mut removed = 0;
        for id in ids {
            match conn.execute("DELETE FROM nodes WHERE id = ?", [*id]).await {
                Ok(rows) => removed += rows,
                Err(e) => {
                    let _rollback = conn.execute("ROLLBACK", ()).await;
                    return Err(DatabaseError::sql_execution(format!(
                        "Failed to delete node {}: {}",
                        id, e
                    )));
                }
            }
        }

        Self::commit(&conn).await?;

        Ok(removed)
    }

    /// Delete every node and restart the identifier sequence
    pub async fn db_delete_all(&self) -> Result<u64, DatabaseError> {
        let conn = self.connect_with_timeout().await?;

        conn.execute("BEGIN TRANSACTION", ()).await.map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to begin transaction: {}", e))
        })?;

        let removed = match conn.execute("DELETE FROM nodes", ()).await {
            Ok(rows) => rows,
            Err(e) => {
                let _rollback = conn.execute("ROLLBACK", ()).await;
                return Err(DatabaseError::sql_execution(format!(
                    "Failed to delete nodes: {}",
                    e
                )));
            }
        };

        if let Err(e) = conn
            .execute("DELETE FROM sqlite_sequence WHERE name = 'nodes'", ())
            .await
        {
            let _rollback = conn.execute("ROLLBACK", ()).await;
            return Err(DatabaseError::sql_execution(format!(
                "Failed to reset node id sequence: {}",
                e
            )));
        }

        Self::commit(&conn).await?;

        Ok(removed)
    }

    async fn commit(conn: &libsql::Connection) -> Result<(), DatabaseError> {
        if let Err(e) = conn.execute("COMMIT", ()).await {
            let _rollback = conn.execute("ROLLBACK", ()).await;
            return Err(DatabaseError::sql_execution(format!(
                "Failed to commit transaction: {}",
                e
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_database_creation() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");

        let db_service = DatabaseService::new(db_path.clone()).await.unwrap();

        assert_eq!(db_service.db_path, db_path);
        assert!(db_path.exists());
    }

    #[tokio::test]
    async fn test_schema_initialization() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");

        let db_service = DatabaseService::new(db_path).await.unwrap();
        let conn = db_service.connect().unwrap();

        let mut stmt = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' AND name='nodes'")
            .await
            .unwrap();
        let mut rows = stmt.query(()).await.unwrap();
        let row = rows.next().await.unwrap().unwrap();
        let table_name: String = row.get(0).unwrap();
        assert_eq!(table_name, "nodes");

        let mut stmt = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='index' AND name='idx_nodes_parent'")
            .await
            .unwrap();
        let mut rows = stmt.query(()).await.unwrap();
        assert!(rows.next().await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_wal_mode_enabled() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");

        let db_service = DatabaseService::new(db_path).await.unwrap();
        let conn = db_service.connect().unwrap();

        let mut stmt = conn.prepare("PRAGMA journal_mode").await.unwrap();
        let mut rows = stmt.query(()).await.unwrap();
        let row = rows.next().await.unwrap().unwrap();
        let mode: String = row.get(0).unwrap();
        assert_eq!(mode.to_lowercase(), "wal");
    }

    #[tokio::test]
    async fn test_foreign_keys_enabled_per_connection() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");

        let db_service = DatabaseService::new(db_path).await.unwrap();
        let conn = db_service.connect_with_timeout().await.unwrap();

        let mut stmt = conn.prepare("PRAGMA foreign_keys").await.unwrap();
        let mut rows = stmt.query(()).await.unwrap();
        let row = rows.next().await.unwrap().unwrap();
        let enabled: i64 = row.get(0).unwrap();
        assert_eq!(enabled, 1);
    }

    #[tokio::test]
    async fn test_parent_directory_creation() {
        let temp_dir = TempDir::new().unwrap();
        let nested_path = temp_dir.path().join("nested").join("dirs").join("test.db");

        let _db_service = DatabaseService::new(nested_path.clone()).await.unwrap();

        assert!(nested_path.exists());
    }

    #[tokio::test]
    async fn test_idempotent_initialization() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");

        let db1 = DatabaseService::new(db_path.clone()).await.unwrap();
        db1.db_insert_node(DbInsertNodeParams {
            id: None,
            name: "Animals",
            parent_id: None,
        })
        .await
        .unwrap();

        let db2 = DatabaseService::new(db_path).await.unwrap();
        assert!(db2.db_node_exists(1).await.unwrap());
    }

    #[tokio::test]
    async fn test_insert_assigns_and_honours_ids() {
        let temp_dir = TempDir::new().unwrap();
        let db = DatabaseService::new(temp_dir.path().join("test.db"))
            .await
            .unwrap();

        let explicit = db
            .db_insert_node(DbInsertNodeParams {
                id: Some(10),
                name: "Animals",
                parent_id: None,
            })
            .await
            .unwrap();
        assert_eq!(explicit, 10);

        let assigned = db
            .db_insert_node(DbInsertNodeParams {
                id: None,
                name: "Mammals",
                parent_id: Some(10),
            })
            .await
            .unwrap();
        assert_eq!(assigned, 11);
    }

    #[tokio::test]
    async fn test_missing_parent_rejected_by_foreign_key() {
        let temp_dir = TempDir::new().unwrap();
        let db = DatabaseService::new(temp_dir.path().join("test.db"))
            .await
            .unwrap();

        let result = db
            .db_insert_node(DbInsertNodeParams {
                id: None,
                name: "orphan",
                parent_id: Some(999),
            })
            .await;
        assert!(result.is_err());
        assert!(!db.db_node_exists(1).await.unwrap());
    }

    #[tokio::test]
    async fn test_deleting_parent_with_children_fails() {
        let temp_dir = TempDir::new().unwrap();
        let db = DatabaseService::new(temp_dir.path().join("test.db"))
            .await
            .unwrap();

        let root = db
            .db_insert_node(DbInsertNodeParams {
                id: None,
                name: "Animals",
                parent_id: None,
            })
            .await
            .unwrap();
        db.db_insert_node(DbInsertNodeParams {
            id: None,
            name: "Mammals",
            parent_id: Some(root),
        })
        .await
        .unwrap();

        assert!(db.db_delete_node(root).await.is_err());
        assert!(db.db_node_exists(root).await.unwrap());
    }

    #[tokio::test]
    async fn test_batch_update_conflict_rolls_back() {
        let temp_dir = TempDir::new().unwrap();
        let db = DatabaseService::new(temp_dir.path().join("test.db"))
            .await
            .unwrap();

        let root = db
            .db_insert_node(DbInsertNodeParams {
                id: None,
                name: "Animals",
                parent_id: None,
            })
            .await
            .unwrap();

        let result = db
            .db_batch_update_nodes(vec![
                DbUpdateNodeParams {
                    id: root,
                    name: "Renamed",
                    parent_id: None,
                },
                DbUpdateNodeParams {
                    id: 404,
                    name: "ghost",
                    parent_id: None,
                },
            ])
            .await;
        assert!(matches!(
            result,
            Err(DatabaseError::ConcurrencyConflict { id: 404 })
        ));

        let row = db.db_get_node(root).await.unwrap().unwrap();
        let name: String = row.get(1).unwrap();
        assert_eq!(name, "Animals");
    }

    #[tokio::test]
    async fn test_delete_all_resets_sequence() {
        let temp_dir = TempDir::new().unwrap();
        let db = DatabaseService::new(temp_dir.path().join("test.db"))
            .await
            .unwrap();

        for name in ["a", "b", "c"] {
            db.db_insert_node(DbInsertNodeParams {
                id: None,
                name,
                parent_id: None,
            })
            .await
            .unwrap();
        }

        assert_eq!(db.db_delete_all().await.unwrap(), 3);

        let id = db
            .db_insert_node(DbInsertNodeParams {
                id: None,
                name: "fresh",
                parent_id: None,
            })
            .await
            .unwrap();
        assert_eq!(id, 1);
    }
}
