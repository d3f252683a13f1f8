//! lb-core - Core library for lightbuild
//!
//! This crate provides shared types used across all lightbuild components:
//! project configuration, model definitions and their column tests, the
//! model dependency DAG, and the warehouse metadata snapshot used to decide
//! between initial and incremental materialization.

pub mod config;
pub mod dag;
pub mod error;
pub mod model;
pub mod model_name;
pub mod schema_map;
pub mod sql_utils;

pub use config::{ConnectionParams, Materialization, OnTestFail, ProjectConfig};
pub use dag::ModelDag;
pub use error::{CoreError, CoreResult};
pub use model::{load_models, ColumnTests, Model, ModelSchema, TestSpec};
pub use model_name::ModelName;
pub use schema_map::{ColumnInfo, RelationInfo, RelationKind, SchemaMap};
