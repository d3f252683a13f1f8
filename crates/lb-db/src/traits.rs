//! Database trait definition

use crate::error::DbResult;
use crate::rows::QueryRows;
use async_trait::async_trait;
use lb_core::ColumnInfo;
use std::path::Path;

/// Driver-level access to one warehouse connection.
///
/// Implementations must be Send + Sync for async operation. Every
/// statement error is reported as `DbError::OperationalError` carrying
/// the failing SQL.
#[async_trait]
pub trait Database: Send + Sync {
    /// Run a read query and collect its rows
    async fn query(&self, sql: &str, params: &[serde_json::Value]) -> DbResult<QueryRows>;

    /// Run a statement, returning the number of affected rows
    async fn execute(&self, sql: &str, params: &[serde_json::Value]) -> DbResult<usize>;

    /// Run a bulk load statement reading from a local file bound at `STDIN`
    async fn copy_from_file(&self, sql: &str, path: &Path) -> DbResult<usize>;

    /// Output columns of a query, without running it
    async fn describe(&self, sql: &str) -> DbResult<Vec<ColumnInfo>>;

    /// Open a transaction
    async fn begin(&self) -> DbResult<()>;

    /// Commit the open transaction
    async fn commit(&self) -> DbResult<()>;

    /// Roll back the open transaction
    async fn rollback(&self) -> DbResult<()>;

    /// Roll back synchronously; used when a connection is dropped mid-transaction
    fn rollback_blocking(&self) -> DbResult<()>;

    /// Database type identifier for logging
    fn db_type(&self) -> &'static str;
}
