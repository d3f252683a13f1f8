//! lb-run - Build engine for lightbuild
//!
//! Loads a project into a [`Context`], resolves model dependencies into a
//! [`ProjectGraph`] and builds the models in order on one connection.
//! Each model is carried through its lifecycle by a [`CompiledModel`];
//! the outcome of every model is collected in a [`BuildReport`].

pub mod context;
pub mod error;
pub mod graph;
pub mod model;
pub mod report;
pub mod seed;

pub use context::Context;
pub use error::{RunError, RunResult};
pub use graph::ProjectGraph;
pub use model::{CompiledModel, ModelState, RunOptions, Strategy};
pub use report::{BuildReport, ModelOutcome, ModelResult};
pub use seed::{discover_seeds, load_seed, load_seeds, Seed};
