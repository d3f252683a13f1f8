//! lb-sql - SQL parsing layer for lightbuild
//!
//! Parses rendered model bodies, extracts the relations a body reads from,
//! and inlines ephemeral models as CTEs.

pub mod error;
pub mod extractor;
pub mod inline;
pub mod parser;

pub use error::{SqlError, SqlResult};
pub use extractor::{extract_dependencies, extract_model_dependencies, qualified_model_references};
pub use inline::{collect_ephemeral_dependencies, inline_ephemeral_ctes};
pub use parser::{SqlDialect, SqlParser};
