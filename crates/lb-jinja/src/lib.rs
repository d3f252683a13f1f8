//! lb-jinja - Templating layer for lightbuild
//!
//! Every SQL statement lightbuild issues is rendered from a named template
//! looked up per adapter. This crate provides the [`TemplateStore`]
//! implementations (builtin, project directory, layered), the
//! [`TemplateRenderer`] built on minijinja, and the functions and filters
//! available to templates and model bodies:
//!
//! - `var(name, default?)` reads project variables
//! - `is_incremental()` and `this` in model bodies
//! - `error(msg)` aborts rendering
//! - `ident`, `relation` and `literal` filters for safe SQL text
//! - `adapter` and `run_started_at` globals

pub mod builtins;
pub mod context;
pub mod error;
pub mod functions;
pub mod renderer;
pub mod store;

pub use context::RenderContext;
pub use error::{JinjaError, JinjaResult};
pub use renderer::TemplateRenderer;
pub use store::{BuiltinStore, DirectoryStore, LayeredStore, TemplateStore};
