//! Per-run model execution
//!
//! A [`CompiledModel`] carries one model through a run:
//!
//! ```text
//! PENDING -> RENDERED -> MATERIALIZED -> TESTED -> DONE
//!               |             |             |
//!               +-------------+-------------+--> FAILED
//! ```
//!
//! Models without tests go from MATERIALIZED straight to DONE. Everything
//! a model writes and every test it runs happens inside one transaction.

use crate::error::{RunError, RunResult};
use lb_core::{Materialization, Model, OnTestFail, RelationInfo, RelationKind, SchemaMap};
use lb_db::{DatabaseConnection, OperationKind};
use lb_jinja::{RenderContext, TemplateRenderer};
use lb_sql::inline_ephemeral_ctes;
use lb_test::TestRunner;
use std::fmt;

/// Lifecycle state of a model within one run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelState {
    Pending,
    Rendered,
    Materialized,
    Tested,
    Done,
    Failed,
}

impl ModelState {
    fn as_str(self) -> &'static str {
        match self {
            ModelState::Pending => "PENDING",
            ModelState::Rendered => "RENDERED",
            ModelState::Materialized => "MATERIALIZED",
            ModelState::Tested => "TESTED",
            ModelState::Done => "DONE",
            ModelState::Failed => "FAILED",
        }
    }

    fn can_become(self, next: ModelState) -> bool {
        use ModelState::*;
        matches!(
            (self, next),
            (Pending, Rendered)
                | (Rendered, Materialized)
                | (Materialized, Tested)
                | (Materialized, Done)
                | (Tested, Done)
                | (Rendered, Failed)
                | (Materialized, Failed)
                | (Tested, Failed)
        )
    }
}

impl fmt::Display for ModelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a model is written this run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Create or replace the table from the full query (`model/init`)
    Init,
    /// Insert rows absent under the unique key (`model/incremental`)
    Incremental,
    /// Create or replace a view (`model/view`)
    View,
    /// Nothing is written; the body is inlined into dependents
    Ephemeral,
}

impl Strategy {
    /// Choose from the materialization, the refresh flag and whether the
    /// model's table already exists
    pub fn choose(
        materialization: Materialization,
        full_refresh: bool,
        table_exists: bool,
    ) -> Self {
        match materialization {
            Materialization::Table => Strategy::Init,
            Materialization::Incremental if full_refresh || !table_exists => Strategy::Init,
            Materialization::Incremental => Strategy::Incremental,
            Materialization::View => Strategy::View,
            Materialization::Ephemeral => Strategy::Ephemeral,
        }
    }

    fn target_kind(self) -> Option<RelationKind> {
        match self {
            Strategy::Init | Strategy::Incremental => Some(RelationKind::Table),
            Strategy::View => Some(RelationKind::View),
            Strategy::Ephemeral => None,
        }
    }
}

/// Options shared by every model of a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Rebuild incremental models from scratch
    pub full_refresh: bool,
    /// What to do with a model's writes when its tests fail
    pub on_test_fail: OnTestFail,
}

/// One model being built in the current run
pub struct CompiledModel<'a> {
    model: &'a Model,
    schema: String,
    relation: String,
    existing: Option<&'a RelationInfo>,
    strategy: Strategy,
    state: ModelState,
    sql: Option<String>,
}

impl<'a> CompiledModel<'a> {
    /// Prepare a model against the run's warehouse snapshot
    pub fn new(
        model: &'a Model,
        schema: &str,
        relation: String,
        snapshot: &'a SchemaMap,
        full_refresh: bool,
    ) -> Self {
        let existing = snapshot.relation(schema, model.name.as_str());
        let table_exists = existing.is_some_and(|r| r.kind == RelationKind::Table);
        Self {
            model,
            schema: schema.to_string(),
            relation,
            existing,
            strategy: Strategy::choose(model.materialization, full_refresh, table_exists),
            state: ModelState::Pending,
            sql: None,
        }
    }

    /// Current lifecycle state
    pub fn state(&self) -> ModelState {
        self.state
    }

    /// Write strategy chosen for this run
    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// Rendered SELECT, once rendered
    pub fn sql(&self) -> Option<&str> {
        self.sql.as_deref()
    }

    fn invalid_transition(&self, next: ModelState) -> RunError {
        RunError::InvalidTransition {
            model: self.model.name.to_string(),
            from: self.state.as_str(),
            to: next.as_str(),
        }
    }

    fn transition(&mut self, next: ModelState) -> RunResult<()> {
        if !self.state.can_become(next) {
            return Err(self.invalid_transition(next));
        }
        log::debug!("{}: {} -> {}", self.model.name, self.state, next);
        self.state = next;
        Ok(())
    }

    fn fail(&mut self) {
        if self.state.can_become(ModelState::Failed) {
            log::debug!("{}: {} -> {}", self.model.name, self.state, ModelState::Failed);
            self.state = ModelState::Failed;
        }
    }

    /// Render the body and inline upstream ephemeral models
    pub fn render(
        &mut self,
        renderer: &TemplateRenderer,
        ephemerals: &[(String, String)],
    ) -> RunResult<&str> {
        let ctx = RenderContext::new()
            .with("this", self.relation.clone())
            .with_incremental(self.strategy == Strategy::Incremental);
        let body = renderer
            .render_str(&self.model.sql_body, &ctx)
            .map_err(|source| RunError::Render {
                model: self.model.name.to_string(),
                source,
            })?;
        self.sql = Some(inline_ephemeral_ctes(&body, ephemerals));
        self.transition(ModelState::Rendered)?;
        Ok(self.sql.as_deref().unwrap_or_default())
    }

    /// Run the chosen template(s) for the rendered SQL
    pub async fn materialize(&mut self, conn: &DatabaseConnection) -> RunResult<()> {
        let sql = match (&self.sql, self.state) {
            (Some(sql), ModelState::Rendered) => sql.clone(),
            _ => return Err(self.invalid_transition(ModelState::Materialized)),
        };

        if let (Some(existing), Some(target)) = (self.existing, self.strategy.target_kind()) {
            if existing.kind != target {
                log::debug!(
                    "Replacing {} {} with a {}",
                    existing.kind,
                    self.relation,
                    target
                );
                let ctx = RenderContext::new()
                    .with("this", self.relation.clone())
                    .with("kind", existing.kind.to_string());
                conn.execute_templated("model/drop", &ctx, OperationKind::Execute)
                    .await?;
            }
        }

        match self.strategy {
            Strategy::Init => self.write("model/init", conn, &sql).await?,
            Strategy::View => self.write("model/view", conn, &sql).await?,
            Strategy::Incremental => self.write_incremental(conn, &sql).await?,
            Strategy::Ephemeral => {}
        }

        self.transition(ModelState::Materialized)
    }

    async fn write(&self, template: &str, conn: &DatabaseConnection, sql: &str) -> RunResult<()> {
        let ctx = RenderContext::new()
            .with("this", self.relation.clone())
            .with("sql", sql);
        conn.execute_templated(template, &ctx, OperationKind::Execute)
            .await?;
        Ok(())
    }

    async fn write_incremental(&self, conn: &DatabaseConnection, sql: &str) -> RunResult<()> {
        let output = conn.describe(sql).await?;

        if let Some(existing) = self.existing {
            let removed: Vec<&str> = existing
                .columns
                .iter()
                .filter(|c| !output.iter().any(|o| o.name.eq_ignore_ascii_case(&c.name)))
                .map(|c| c.name.as_str())
                .collect();
            if !removed.is_empty() {
                return Err(self.drift(format!("columns removed: {}", removed.join(", "))));
            }

            let changed: Vec<String> = output
                .iter()
                .filter_map(|o| {
                    let old = existing.column(&o.name)?;
                    (!old.data_type.eq_ignore_ascii_case(&o.data_type))
                        .then(|| format!("{} ({} -> {})", o.name, old.data_type, o.data_type))
                })
                .collect();
            if !changed.is_empty() {
                return Err(self.drift(format!("column types changed: {}", changed.join(", "))));
            }

            for added in output.iter().filter(|o| existing.column(&o.name).is_none()) {
                log::info!(
                    "Adding column {} {} to {}",
                    added.name,
                    added.data_type,
                    self.relation
                );
                let ctx = RenderContext::new()
                    .with("this", self.relation.clone())
                    .with("column", added.name.clone())
                    .with("data_type", added.data_type.clone());
                conn.execute_templated("model/add_column", &ctx, OperationKind::Execute)
                    .await?;
            }
        }

        let columns: Vec<String> = output.into_iter().map(|c| c.name).collect();
        let ctx = RenderContext::new()
            .with("this", self.relation.clone())
            .with("sql", sql)
            .with("columns", columns)
            .with("unique_key", self.model.unique_key.clone());
        conn.execute_templated("model/incremental", &ctx, OperationKind::Execute)
            .await?;
        Ok(())
    }

    fn drift(&self, message: String) -> RunError {
        RunError::SchemaDrift {
            model: self.model.name.to_string(),
            message,
        }
    }

    /// Run the model's column tests against its fresh relation
    pub async fn test(&mut self, conn: &DatabaseConnection) -> RunResult<()> {
        TestRunner::new(conn, &self.schema).run(self.model).await?;
        self.transition(ModelState::Tested)
    }

    /// Carry the model from PENDING to DONE inside one transaction.
    ///
    /// On a statement error the transaction is rolled back. On failing
    /// tests the writes are committed under [`OnTestFail::Error`] and
    /// rolled back under [`OnTestFail::ErrorWithRollback`]; either way the
    /// model fails with [`RunError::TestsFailed`].
    pub async fn run(
        mut self,
        conn: &mut DatabaseConnection,
        renderer: &TemplateRenderer,
        ephemerals: &[(String, String)],
        on_test_fail: OnTestFail,
    ) -> RunResult<()> {
        self.render(renderer, ephemerals)?;

        if self.strategy == Strategy::Ephemeral {
            self.transition(ModelState::Materialized)?;
            return self.transition(ModelState::Done);
        }

        if let Err(e) = conn.begin().await {
            self.fail();
            return Err(e.into());
        }

        if let Err(e) = self.materialize(conn).await {
            self.fail();
            rollback_quietly(conn).await;
            return Err(e);
        }

        if self.model.has_tests() {
            match self.test(conn).await {
                Ok(()) => {}
                Err(RunError::TestsFailed(report)) => {
                    self.fail();
                    match on_test_fail {
                        OnTestFail::Error => {
                            log::debug!("Committing {} with failing tests", self.model.name);
                            conn.commit().await?;
                        }
                        OnTestFail::ErrorWithRollback => {
                            log::debug!("Rolling back {} after failing tests", self.model.name);
                            conn.rollback().await?;
                        }
                    }
                    return Err(RunError::TestsFailed(report));
                }
                Err(e) => {
                    self.fail();
                    rollback_quietly(conn).await;
                    return Err(e);
                }
            }
        }

        if let Err(e) = conn.commit().await {
            self.fail();
            return Err(e.into());
        }
        self.transition(ModelState::Done)
    }
}

async fn rollback_quietly(conn: &mut DatabaseConnection) {
    if let Err(e) = conn.rollback().await {
        log::warn!("Rollback failed: {}", e);
    }
}

#[cfg(test)]
#[path = "model_test.rs"]
mod tests;
