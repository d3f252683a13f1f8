//! Test execution

use crate::error::{TestError, TestFailureReport};
use lb_core::sql_utils::quote_relation;
use lb_core::{Model, TestSpec};
use lb_db::{is_truthy, DatabaseConnection, DbError, OperationKind};
use lb_jinja::RenderContext;

/// Runs a model's column tests on one connection.
///
/// Tests read the model's relation inside the caller's transaction, so they
/// see the rows the model has just written. Deciding what to do with those
/// rows when a test fails is left to the caller.
pub struct TestRunner<'a> {
    conn: &'a DatabaseConnection,
    schema: &'a str,
}

impl<'a> TestRunner<'a> {
    /// Create a runner for models materialized in `schema`
    pub fn new(conn: &'a DatabaseConnection, schema: &'a str) -> Self {
        Self { conn, schema }
    }

    /// Run every configured test of a model, in declaration order.
    ///
    /// All tests run even after a failure so the report is complete.
    /// A query error stops the run immediately.
    pub async fn run(&self, model: &Model) -> Result<(), TestError> {
        let mut report = TestFailureReport::new(model.name.clone());

        for (column, spec) in model.column_tests.pairs() {
            let passed = self.run_one(model, column, spec).await?;
            if !passed {
                log::debug!("Test {} failed on {}.{}", spec, model.name, column);
                report.record(column, spec.name());
            }
        }

        if report.is_empty() {
            log::debug!(
                "All {} test(s) passed on {}",
                model.column_tests.len(),
                model.name
            );
            Ok(())
        } else {
            Err(TestError::Failed(report))
        }
    }

    /// Run one test; returns `true` when it passed.
    ///
    /// The `tests/<name>` template must yield one scalar. A truthy value
    /// (a non-zero failing row count) is a failure; zero, false or NULL
    /// is a pass.
    pub async fn run_one(
        &self,
        model: &Model,
        column: &str,
        spec: &TestSpec,
    ) -> Result<bool, DbError> {
        let ctx = self.test_context(model, column, spec);
        let template = format!("tests/{}", spec.name());

        let rows = self
            .conn
            .execute_templated(&template, &ctx, OperationKind::Query)
            .await?
            .unwrap_or_default();

        Ok(!rows.scalar().is_some_and(is_truthy))
    }

    fn test_context(&self, model: &Model, column: &str, spec: &TestSpec) -> RenderContext {
        let ctx = match spec.params() {
            Some(params) => RenderContext::new().with_params(params),
            None => RenderContext::new(),
        };
        // Inserted last so parameters never shadow them
        ctx.with("relation", quote_relation(self.schema, &model.name))
            .with("model", model.name.as_str())
            .with("column", column)
            .with("start_field", model.start_field.clone())
    }
}

#[cfg(test)]
#[path = "runner_test.rs"]
mod tests;
