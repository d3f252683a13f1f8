//! Template renderer for lightbuild

use crate::context::RenderContext;
use crate::error::{JinjaError, JinjaResult};
use crate::functions::{
    error_fn, ident_filter, is_incremental, literal_filter, make_var_fn, relation_filter,
};
use crate::store::{BuiltinStore, TemplateStore};
use chrono::{DateTime, Utc};
use minijinja::{Environment, ErrorKind, Value};
use std::collections::HashMap;
use std::sync::Arc;

/// Renders adapter-specific SQL from named templates and model bodies.
///
/// Templates are resolved lazily through the store for the renderer's
/// adapter and cached by the environment. Rendering has no side effects
/// beyond that cache, so the same inputs always give the same SQL.
pub struct TemplateRenderer {
    adapter: String,
    env: Environment<'static>,
}

impl TemplateRenderer {
    /// Create a renderer for an adapter, store and project variables
    pub fn new(
        adapter: &str,
        store: Arc<dyn TemplateStore>,
        vars: &HashMap<String, serde_yaml::Value>,
    ) -> Self {
        let mut env = Environment::new();

        let loader_adapter = adapter.to_string();
        env.set_loader(move |name| {
            store.resolve(&loader_adapter, name).map_err(|e| {
                minijinja::Error::new(ErrorKind::InvalidOperation, e.to_string())
            })
        });

        let vars: HashMap<String, Value> = vars
            .iter()
            .map(|(k, v)| (k.clone(), Value::from_serialize(v)))
            .collect();
        env.add_function("var", make_var_fn(vars));
        env.add_function("error", error_fn);
        env.add_function("is_incremental", is_incremental);

        env.add_filter("ident", ident_filter);
        env.add_filter("relation", relation_filter);
        env.add_filter("literal", literal_filter);

        env.add_global("adapter", Value::from(adapter));

        let mut renderer = Self {
            adapter: adapter.to_string(),
            env,
        };
        renderer.set_run_started_at(Utc::now());
        renderer
    }

    /// Renderer over the builtin templates only, without project variables
    pub fn builtin(adapter: &str) -> Self {
        Self::new(adapter, Arc::new(BuiltinStore), &HashMap::new())
    }

    /// Adapter this renderer resolves templates for
    pub fn adapter(&self) -> &str {
        &self.adapter
    }

    /// Set the `run_started_at` global
    pub fn set_run_started_at(&mut self, started_at: DateTime<Utc>) {
        self.env
            .add_global("run_started_at", Value::from(started_at.to_rfc3339()));
    }

    /// Whether the store has a template of this name for the adapter
    pub fn has_template(&self, name: &str) -> bool {
        self.env.get_template(name).is_ok()
    }

    /// Render a named template
    pub fn render(&self, name: &str, ctx: &RenderContext) -> JinjaResult<String> {
        let template = self.env.get_template(name).map_err(|e| {
            if e.kind() == ErrorKind::TemplateNotFound {
                JinjaError::TemplateNotFound {
                    adapter: self.adapter.clone(),
                    name: name.to_string(),
                }
            } else {
                JinjaError::from(e)
            }
        })?;
        let sql = template.render(ctx.to_value())?;
        log::trace!("Rendered template {}/{}", self.adapter, name);
        Ok(sql)
    }

    /// Render template text, such as a model body
    pub fn render_str(&self, source: &str, ctx: &RenderContext) -> JinjaResult<String> {
        Ok(self.env.render_str(source, ctx.to_value())?)
    }
}

impl std::fmt::Debug for TemplateRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TemplateRenderer")
            .field("adapter", &self.adapter)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "renderer_test.rs"]
mod tests;
