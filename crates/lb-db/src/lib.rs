//! lb-db - Database layer for lightbuild
//!
//! This crate provides the async [`Database`] trait with a DuckDB backend,
//! the [`WarehouseAdapter`] capability selected once per project through
//! an [`AdapterRegistry`], and [`DatabaseConnection`], the single seam all
//! rendered SQL passes through.

pub mod adapter;
pub mod connection;
pub mod duckdb;
pub mod error;
pub mod rows;
pub mod traits;

pub use adapter::{AdapterRegistry, DuckDbAdapter, WarehouseAdapter};
pub use connection::{DatabaseConnection, OperationKind};
pub use duckdb::DuckDbBackend;
pub use error::{DbError, DbResult};
pub use rows::{is_truthy, QueryRows};
pub use traits::Database;
