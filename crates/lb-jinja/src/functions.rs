//! Functions and filters registered on every template environment

use lb_core::sql_utils::{quote_ident, quote_literal, quote_qualified};
use minijinja::value::{Value, ValueKind};
use minijinja::{Error, ErrorKind, State};
use std::collections::HashMap;

/// Context key read by `is_incremental()`
pub(crate) const INCREMENTAL_KEY: &str = "__incremental_run";

/// `is_incremental()`, reading the flag placed in the render context
///
/// ```jinja
/// {% if is_incremental() %}
///   WHERE updated_at > (SELECT MAX(updated_at) FROM {{ this }})
/// {% endif %}
/// ```
pub(crate) fn is_incremental(state: &State) -> bool {
    state
        .lookup(INCREMENTAL_KEY)
        .map(|v| v.is_true())
        .unwrap_or(false)
}

/// `var(name, default?)` looks up a project variable.
///
/// A missing variable without a default is an error, never an empty string.
///
/// ```jinja
/// {{ var('start_date') }}
/// {{ var('region', 'eu') }}
/// ```
pub(crate) fn make_var_fn(
    vars: HashMap<String, Value>,
) -> impl Fn(&str, Option<Value>) -> Result<Value, Error> + Send + Sync + Clone + 'static {
    move |name: &str, default: Option<Value>| match (vars.get(name), default) {
        (Some(value), _) => Ok(value.clone()),
        (None, Some(default)) => Ok(default),
        (None, None) => Err(Error::new(
            ErrorKind::UndefinedError,
            format!("project variable '{name}' is not set and has no default"),
        )),
    }
}

/// `error(msg)` aborts rendering with a message
pub(crate) fn error_fn(msg: &str) -> Result<String, Error> {
    Err(Error::new(ErrorKind::InvalidOperation, msg.to_string()))
}

/// `{{ column | ident }}` quotes an identifier
pub(crate) fn ident_filter(value: &str) -> String {
    quote_ident(value)
}

/// `{{ "schema.table" | relation }}` quotes each part of a qualified name
pub(crate) fn relation_filter(value: &str) -> String {
    quote_qualified(value)
}

/// `{{ value | literal }}` renders a SQL literal; sequences become a comma list
pub(crate) fn literal_filter(value: Value) -> Result<String, Error> {
    match value.kind() {
        ValueKind::Undefined | ValueKind::None => Ok("NULL".to_string()),
        ValueKind::Bool => Ok(if value.is_true() { "TRUE" } else { "FALSE" }.to_string()),
        ValueKind::Number => Ok(value.to_string()),
        ValueKind::String => Ok(quote_literal(value.as_str().unwrap_or_default())),
        ValueKind::Seq => {
            let items = value
                .try_iter()?
                .map(literal_filter)
                .collect::<Result<Vec<_>, _>>()?;
            Ok(items.join(", "))
        }
        _ => Ok(quote_literal(&value.to_string())),
    }
}

#[cfg(test)]
#[path = "functions_test.rs"]
mod tests;
