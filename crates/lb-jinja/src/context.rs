//! Substitution context passed to a template render

use crate::functions::INCREMENTAL_KEY;
use minijinja::Value;
use std::collections::BTreeMap;

/// Named values visible to a template.
///
/// Built with chained `with*` calls:
///
/// ```
/// use lb_jinja::RenderContext;
///
/// let ctx = RenderContext::new()
///     .with("this", "\"main\".\"orders\"")
///     .with("unique_key", vec!["order_id"]);
/// assert!(ctx.contains("this"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct RenderContext {
    values: BTreeMap<String, Value>,
}

impl RenderContext {
    /// Create an empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a value
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Add a JSON value
    pub fn with_json(mut self, key: impl Into<String>, value: &serde_json::Value) -> Self {
        self.insert(key, Value::from_serialize(value));
        self
    }

    /// Add every entry of a JSON parameter map
    pub fn with_params<'a>(
        mut self,
        params: impl IntoIterator<Item = (&'a String, &'a serde_json::Value)>,
    ) -> Self {
        for (key, value) in params {
            self.insert(key.clone(), Value::from_serialize(value));
        }
        self
    }

    /// Set the flag returned by `is_incremental()`
    pub fn with_incremental(self, incremental: bool) -> Self {
        self.with(INCREMENTAL_KEY, incremental)
    }

    /// Insert or replace a value
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(key.into(), value.into());
    }

    /// Whether a key is set
    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Look up a value
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub(crate) fn to_value(&self) -> Value {
        Value::from_iter(self.values.iter().map(|(k, v)| (k.clone(), v.clone())))
    }
}
