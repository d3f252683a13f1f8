//! Error types for lb-sql

use thiserror::Error;

/// Failures turning a rendered model body into an AST
#[derive(Error, Debug)]
pub enum SqlError {
    /// sqlparser rejected the text; location is 0 when unknown
    #[error("[S001] SQL parse error at line {line}, column {column}: {message}")]
    ParseError {
        message: String,
        line: usize,
        column: usize,
    },

    #[error("[S002] Model body is empty")]
    EmptySql,

    /// No parser dialect for the adapter
    #[error("[S003] No SQL dialect for adapter '{0}'")]
    UnknownDialect(String),

    /// Model bodies are a single query; got something else
    #[error("[S004] Model body must be a single query, found {0}")]
    NotAQuery(String),

    /// Ephemeral models are inlined as CTEs and have no schema
    #[error("[S005] Ephemeral model '{model}' must be referenced by bare name, not '{reference}'")]
    QualifiedEphemeral { model: String, reference: String },
}

pub type SqlResult<T> = Result<T, SqlError>;
