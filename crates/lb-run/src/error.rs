//! Error types for lb-run

use lb_core::CoreError;
use lb_db::DbError;
use lb_jinja::JinjaError;
use lb_sql::SqlError;
use lb_test::{TestError, TestFailureReport};
use thiserror::Error;

/// Errors raised while loading a project or building its models
#[derive(Error, Debug)]
pub enum RunError {
    /// Project, config or model definition error (R001)
    #[error("[R001] {0}")]
    Core(#[from] CoreError),

    /// Model SQL could not be parsed (R002)
    #[error("[R002] Model '{model}': {source}")]
    Sql {
        model: String,
        #[source]
        source: SqlError,
    },

    /// Model body could not be rendered (R003)
    #[error("[R003] Model '{model}': {source}")]
    Render {
        model: String,
        #[source]
        source: JinjaError,
    },

    /// Warehouse error (R004)
    #[error("[R004] {0}")]
    Db(#[from] DbError),

    /// Column tests failed (R005)
    #[error("[R005] {0}")]
    TestsFailed(TestFailureReport),

    /// Existing relation is incompatible with the model's output (R006)
    #[error("[R006] Schema drift on model '{model}': {message}")]
    SchemaDrift { model: String, message: String },

    /// Model state machine misuse (R007)
    #[error("[R007] Model '{model}' cannot go from {from} to {to}")]
    InvalidTransition {
        model: String,
        from: &'static str,
        to: &'static str,
    },

    /// Seed file could not be read (R008)
    #[error("[R008] Failed to read seed '{path}': {source}")]
    SeedIo {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl RunError {
    /// Whether this is a missing or invalid configuration error
    pub fn is_config_error(&self) -> bool {
        matches!(self, RunError::Core(e) if e.is_config_error())
    }

    /// Failing SQL text, for statement errors
    pub fn sql(&self) -> Option<&str> {
        match self {
            RunError::Db(e) => e.sql(),
            _ => None,
        }
    }
}

impl From<TestError> for RunError {
    fn from(err: TestError) -> Self {
        match err {
            TestError::Failed(report) => RunError::TestsFailed(report),
            TestError::Query(e) => RunError::Db(e),
        }
    }
}

/// Result type alias for RunError
pub type RunResult<T> = Result<T, RunError>;
