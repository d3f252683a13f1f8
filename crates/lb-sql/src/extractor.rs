//! Relation extraction from SQL AST

use sqlparser::ast::{visit_relations, ObjectName, ObjectNamePart, Statement};
use std::collections::{BTreeSet, HashSet};
use std::ops::ControlFlow;

/// Extract all relation references from SQL statements.
///
/// Uses `visit_relations` to walk the AST, so FROM clauses, JOINs and
/// subqueries are all covered. Names defined by a top-level WITH clause
/// are not relations and are left out. Qualified names are joined with `.`.
pub fn extract_dependencies(statements: &[Statement]) -> BTreeSet<String> {
    let mut deps = BTreeSet::new();

    for stmt in statements {
        let cte_names = top_level_cte_names(stmt);
        let _ = visit_relations(stmt, |relation| {
            let name = object_name_to_string(relation);
            if !(relation.0.len() == 1 && cte_names.contains(&name.to_lowercase())) {
                deps.insert(name);
            }
            ControlFlow::<()>::Continue(())
        });
    }

    deps
}

/// Keep the relations that name a known model.
///
/// Matching uses the last name component, case-insensitively, so both
/// `orders` and `analytics.orders` resolve to the `orders` model.
/// Returned names are spelled as in `known_models`.
pub fn extract_model_dependencies<'a>(
    statements: &[Statement],
    known_models: impl IntoIterator<Item = &'a str>,
) -> BTreeSet<String> {
    let known: Vec<&str> = known_models.into_iter().collect();
    extract_dependencies(statements)
        .into_iter()
        .filter_map(|dep| {
            let last = dep.rsplit('.').next().unwrap_or(&dep).to_string();
            known
                .iter()
                .find(|m| m.eq_ignore_ascii_case(&last))
                .map(|m| m.to_string())
        })
        .collect()
}

/// Qualified references (`main.stg`) to any of `models`.
///
/// Returns `(model, reference)` pairs, the model spelled as in `models`.
/// Models that exist only as inlined CTEs must be referenced by bare name.
pub fn qualified_model_references<'a>(
    statements: &[Statement],
    models: impl IntoIterator<Item = &'a str>,
) -> Vec<(String, String)> {
    let models: Vec<&str> = models.into_iter().collect();
    extract_dependencies(statements)
        .into_iter()
        .filter_map(|dep| {
            let (_, last) = dep.rsplit_once('.')?;
            models
                .iter()
                .find(|m| m.eq_ignore_ascii_case(last))
                .map(|m| (m.to_string(), dep.clone()))
        })
        .collect()
}

fn object_name_to_string(name: &ObjectName) -> String {
    name.0
        .iter()
        .filter_map(|part| match part {
            ObjectNamePart::Identifier(ident) => Some(ident.value.clone()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join(".")
}

fn top_level_cte_names(stmt: &Statement) -> HashSet<String> {
    let Statement::Query(query) = stmt else {
        return HashSet::new();
    };
    query
        .with
        .as_ref()
        .map(|with| {
            with.cte_tables
                .iter()
                .map(|cte| cte.alias.name.value.to_lowercase())
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
#[path = "extractor_test.rs"]
mod tests;
