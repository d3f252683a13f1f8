//! The live warehouse connection used for a run

use crate::error::{DbError, DbResult};
use crate::rows::QueryRows;
use crate::traits::Database;
use lb_core::ColumnInfo;
use lb_jinja::{RenderContext, TemplateRenderer};
use std::io::{Read, Write};
use std::sync::Arc;

/// Log target for every statement sent to the warehouse
pub const SQL_LOG_TARGET: &str = "lb::sql";

/// What to do with a rendered template
pub enum OperationKind<'a> {
    /// Run as a read query and return its rows
    Query,
    /// Run as a statement
    Execute,
    /// Run as a bulk load reading from this input
    Copy(Box<dyn Read + Send + 'a>),
}

impl std::fmt::Debug for OperationKind<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OperationKind::Query => write!(f, "Query"),
            OperationKind::Execute => write!(f, "Execute"),
            OperationKind::Copy(_) => write!(f, "Copy"),
        }
    }
}

/// One live connection to the target warehouse.
///
/// All SQL passes through here, and all templated SQL through
/// [`execute_templated`](Self::execute_templated). At most one
/// transaction is open at a time; a transaction still open when the
/// connection is dropped is rolled back.
pub struct DatabaseConnection {
    db: Box<dyn Database>,
    renderer: Arc<TemplateRenderer>,
    in_transaction: bool,
}

impl DatabaseConnection {
    /// Wrap an open database with the renderer for its adapter
    pub fn new(db: Box<dyn Database>, renderer: Arc<TemplateRenderer>) -> Self {
        Self {
            db,
            renderer,
            in_transaction: false,
        }
    }

    /// Adapter identifier
    pub fn adapter(&self) -> &str {
        self.renderer.adapter()
    }

    /// Renderer used by `execute_templated`
    pub fn renderer(&self) -> &TemplateRenderer {
        &self.renderer
    }

    /// Whether a transaction is open
    pub fn in_transaction(&self) -> bool {
        self.in_transaction
    }

    /// Run a read query
    pub async fn query(&self, sql: &str, params: &[serde_json::Value]) -> DbResult<QueryRows> {
        log::debug!(target: SQL_LOG_TARGET, "query:\n{}", sql);
        self.db.query(sql, params).await
    }

    /// Run a statement, returning affected rows
    pub async fn execute(&self, sql: &str, params: &[serde_json::Value]) -> DbResult<usize> {
        log::debug!(target: SQL_LOG_TARGET, "execute:\n{}", sql);
        let affected = self.db.execute(sql, params).await?;
        log::trace!(target: SQL_LOG_TARGET, "{} row(s) affected", affected);
        Ok(affected)
    }

    /// Bulk load: spool `reader` to a local file bound at the statement's `STDIN` token
    pub async fn copy(&self, sql: &str, mut reader: impl Read) -> DbResult<usize> {
        let mut spool = tempfile::Builder::new()
            .prefix("lb-copy-")
            .suffix(".csv")
            .tempfile()
            .map_err(DbError::Spool)?;
        std::io::copy(&mut reader, &mut spool).map_err(DbError::Spool)?;
        spool.flush().map_err(DbError::Spool)?;

        log::debug!(
            target: SQL_LOG_TARGET,
            "copy from {}:\n{}",
            spool.path().display(),
            sql
        );
        self.db.copy_from_file(sql, spool.path()).await
    }

    /// Output columns of a query
    pub async fn describe(&self, sql: &str) -> DbResult<Vec<ColumnInfo>> {
        log::debug!(target: SQL_LOG_TARGET, "describe:\n{}", sql);
        self.db.describe(sql).await
    }

    /// Open a transaction
    pub async fn begin(&mut self) -> DbResult<()> {
        if self.in_transaction {
            return Err(DbError::TransactionState(
                "begin() called while a transaction is already open".to_string(),
            ));
        }
        log::debug!(target: SQL_LOG_TARGET, "BEGIN");
        self.db.begin().await?;
        self.in_transaction = true;
        Ok(())
    }

    /// Commit the open transaction
    pub async fn commit(&mut self) -> DbResult<()> {
        if !self.in_transaction {
            return Err(DbError::TransactionState(
                "commit() called without an open transaction".to_string(),
            ));
        }
        log::debug!(target: SQL_LOG_TARGET, "COMMIT");
        self.in_transaction = false;
        self.db.commit().await
    }

    /// Undo every statement since `begin()`
    pub async fn rollback(&mut self) -> DbResult<()> {
        if !self.in_transaction {
            return Err(DbError::TransactionState(
                "rollback() called without an open transaction".to_string(),
            ));
        }
        log::debug!(target: SQL_LOG_TARGET, "ROLLBACK");
        self.in_transaction = false;
        self.db.rollback().await
    }

    /// Render a template for this adapter and run it.
    ///
    /// Returns rows for [`OperationKind::Query`] and `None` otherwise.
    pub async fn execute_templated(
        &self,
        template_name: &str,
        ctx: &RenderContext,
        kind: OperationKind<'_>,
    ) -> DbResult<Option<QueryRows>> {
        let sql = self.renderer.render(template_name, ctx)?;
        log::debug!(target: SQL_LOG_TARGET, "template {} ({:?})", template_name, kind);
        match kind {
            OperationKind::Query => self.query(&sql, &[]).await.map(Some),
            OperationKind::Execute => self.execute(&sql, &[]).await.map(|_| None),
            OperationKind::Copy(reader) => self.copy(&sql, reader).await.map(|_| None),
        }
    }
}

impl Drop for DatabaseConnection {
    fn drop(&mut self) {
        if self.in_transaction {
            log::warn!("Connection released with an open transaction; rolling back");
            if let Err(e) = self.db.rollback_blocking() {
                log::warn!("Rollback on release failed: {}", e);
            }
            self.in_transaction = false;
        }
    }
}

impl std::fmt::Debug for DatabaseConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseConnection")
            .field("db", &self.db.db_type())
            .field("adapter", &self.adapter())
            .field("in_transaction", &self.in_transaction)
            .finish()
    }
}

#[cfg(test)]
#[path = "connection_test.rs"]
mod tests;
