//! Ephemeral model inlining
//!
//! Ephemeral models create no database object. Their rendered bodies are
//! prepended as CTEs to every physical model that reads from them.

use std::collections::{HashMap, HashSet};

/// Inline ephemeral model SQL as CTEs in the target SQL.
///
/// `ephemeral_ctes` holds `(model name, rendered body)` pairs in dependency
/// order; nested ephemerals must come before the ephemerals reading them.
///
/// ```
/// use lb_sql::inline::inline_ephemeral_ctes;
///
/// let ctes = vec![(
///     "stg_orders".to_string(),
///     "SELECT id, amount FROM raw_orders".to_string(),
/// )];
/// let sql = inline_ephemeral_ctes("SELECT * FROM stg_orders", &ctes);
/// assert!(sql.starts_with("WITH stg_orders AS"));
/// ```
pub fn inline_ephemeral_ctes(sql: &str, ephemeral_ctes: &[(String, String)]) -> String {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut ctes: Vec<String> = Vec::new();
    for (name, body) in ephemeral_ctes {
        if seen.insert(name.as_str()) {
            let body = body.trim().trim_end_matches(';').trim();
            ctes.push(format!("{name} AS (\n{body}\n)"));
        }
    }

    let trimmed = sql.trim().trim_end_matches(';').trim_end();
    if ctes.is_empty() {
        return trimmed.to_string();
    }

    match strip_with_keyword(trimmed) {
        Some(rest) => format!("WITH {},\n{}", ctes.join(",\n"), rest),
        None => format!("WITH {}\n{}", ctes.join(",\n"), trimmed),
    }
}

/// Return the text after a leading `WITH` keyword, if present
fn strip_with_keyword(sql: &str) -> Option<&str> {
    let head = sql.get(..4)?;
    let next = sql[4..].chars().next()?;
    if head.eq_ignore_ascii_case("with") && next.is_whitespace() {
        Some(sql[4..].trim_start())
    } else {
        None
    }
}

/// Resolve all ephemeral dependencies of a model, including nested ones.
///
/// Walks `model_deps` depth-first from `model_name`, descending only through
/// ephemeral models, and returns their `(name, body)` pairs with every
/// ephemeral placed after the ephemerals it reads from.
pub fn collect_ephemeral_dependencies<F, G>(
    model_name: &str,
    model_deps: &HashMap<String, Vec<String>>,
    is_ephemeral: F,
    get_body: G,
) -> Vec<(String, String)>
where
    F: Fn(&str) -> bool,
    G: Fn(&str) -> Option<String>,
{
    let mut ordered = Vec::new();
    let mut visited = HashSet::new();

    if let Some(deps) = model_deps.get(model_name) {
        collect_recursive(
            deps,
            model_deps,
            &is_ephemeral,
            &get_body,
            &mut ordered,
            &mut visited,
        );
    }

    ordered
}

fn collect_recursive<F, G>(
    deps: &[String],
    model_deps: &HashMap<String, Vec<String>>,
    is_ephemeral: &F,
    get_body: &G,
    ordered: &mut Vec<(String, String)>,
    visited: &mut HashSet<String>,
) where
    F: Fn(&str) -> bool,
    G: Fn(&str) -> Option<String>,
{
    for dep in deps {
        if !visited.insert(dep.clone()) || !is_ephemeral(dep) {
            continue;
        }

        if let Some(nested) = model_deps.get(dep) {
            collect_recursive(nested, model_deps, is_ephemeral, get_body, ordered, visited);
        }

        if let Some(body) = get_body(dep) {
            ordered.push((dep.clone(), body));
        }
    }
}

#[cfg(test)]
#[path = "inline_test.rs"]
mod tests;
