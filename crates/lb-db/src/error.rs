//! Error types for lb-db

use lb_jinja::JinjaError;
use thiserror::Error;

/// Database operation errors.
///
/// Driver errors are always translated into one of these variants;
/// statement failures keep the SQL text that failed.
#[derive(Error, Debug)]
pub enum DbError {
    /// Connection could not be established (D001)
    #[error("[D001] Database connection failed: {0}")]
    ConnectionError(String),

    /// A statement failed (D002)
    #[error("[D002] SQL execution failed: {message}\n--- SQL ---\n{sql}")]
    OperationalError { sql: String, message: String },

    /// Transaction control used in the wrong state (D003)
    #[error("[D003] Transaction state error: {0}")]
    TransactionState(String),

    /// Mutex poisoned (D004)
    #[error("[D004] Database mutex poisoned: {0}")]
    MutexPoisoned(String),

    /// SQL template could not be rendered (D005)
    #[error("[D005] {0}")]
    Template(#[from] JinjaError),

    /// Bulk load input could not be spooled (D006)
    #[error("[D006] Failed to spool bulk load input: {0}")]
    Spool(#[source] std::io::Error),
}

impl DbError {
    /// Failing SQL text, for statement errors
    pub fn sql(&self) -> Option<&str> {
        match self {
            DbError::OperationalError { sql, .. } => Some(sql),
            _ => None,
        }
    }
}

/// Result type alias for DbError
pub type DbResult<T> = Result<T, DbError>;
