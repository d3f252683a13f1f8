//! Project graph: model dependencies and the build run

use crate::context::Context;
use crate::error::{RunError, RunResult};
use crate::model::{CompiledModel, RunOptions};
use crate::report::{BuildReport, ModelOutcome};
use lb_core::{CoreError, Materialization, Model, ModelDag, ModelName};
use lb_db::DatabaseConnection;
use lb_jinja::RenderContext;
use lb_sql::{
    collect_ephemeral_dependencies, extract_model_dependencies, qualified_model_references,
    SqlError, SqlParser,
};
use std::collections::{BTreeSet, HashMap};

/// Models of a project with their resolved dependencies and build order
#[derive(Debug)]
pub struct ProjectGraph {
    models: Vec<Model>,
    dag: ModelDag,
    order: Vec<ModelName>,
    deps: HashMap<String, Vec<String>>,
    ephemeral_sql: HashMap<String, String>,
}

impl ProjectGraph {
    /// Resolve what every model reads and order the models.
    ///
    /// Bodies are rendered with the project's variables and parsed; every
    /// referenced relation naming a model becomes a dependency. Bodies of
    /// incremental models are also rendered as for an incremental run so
    /// references inside `is_incremental()` blocks count too. A model's
    /// references to itself are not dependencies.
    ///
    /// Fails on a dependency cycle, before any SQL is executed.
    pub fn build(models: &[Model], ctx: &Context) -> RunResult<Self> {
        let parser = SqlParser::for_adapter(ctx.adapter_name()).map_err(|e| {
            CoreError::ConfigInvalid {
                message: e.to_string(),
            }
        })?;
        let names: Vec<&str> = models.iter().map(|m| m.name.as_str()).collect();
        let ephemerals: Vec<&str> = models
            .iter()
            .filter(|m| m.materialization == Materialization::Ephemeral)
            .map(|m| m.name.as_str())
            .collect();

        let mut resolved = Vec::with_capacity(models.len());
        let mut ephemeral_sql = HashMap::new();
        for model in models {
            let modes: &[bool] = if model.materialization == Materialization::Incremental {
                &[false, true]
            } else {
                &[false]
            };

            let mut depends_on = BTreeSet::new();
            for &incremental in modes {
                let render_ctx = RenderContext::new()
                    .with("this", ctx.relation(&model.name))
                    .with_incremental(incremental);
                let sql = ctx
                    .renderer()
                    .render_str(&model.sql_body, &render_ctx)
                    .map_err(|source| RunError::Render {
                        model: model.name.to_string(),
                        source,
                    })?;
                let query = parser.parse_query(&sql).map_err(|source| RunError::Sql {
                    model: model.name.to_string(),
                    source,
                })?;
                let statements = std::slice::from_ref(&query);
                if let Some((target, reference)) =
                    qualified_model_references(statements, ephemerals.iter().copied())
                        .into_iter()
                        .next()
                {
                    return Err(RunError::Sql {
                        model: model.name.to_string(),
                        source: SqlError::QualifiedEphemeral {
                            model: target,
                            reference,
                        },
                    });
                }
                for dep in extract_model_dependencies(statements, names.iter().copied()) {
                    if dep != model.name.as_str() {
                        depends_on.insert(ModelName::new(dep));
                    }
                }
                if !incremental && model.materialization == Materialization::Ephemeral {
                    ephemeral_sql.insert(model.name.to_string(), sql);
                }
            }

            log::debug!("{} depends on {:?}", model.name, depends_on);
            resolved.push(model.clone().with_dependencies(depends_on));
        }

        let dag = ModelDag::build(
            resolved
                .iter()
                .map(|m| (m.name.as_str(), m.depends_on.iter().map(ModelName::as_str))),
        )?;
        let order = dag.topological_order()?;

        let deps = resolved
            .iter()
            .map(|m| {
                (
                    m.name.to_string(),
                    m.depends_on.iter().map(ModelName::to_string).collect(),
                )
            })
            .collect();

        Ok(Self {
            models: resolved,
            dag,
            order,
            deps,
            ephemeral_sql,
        })
    }

    /// Models in dependency order; ties keep declaration order
    pub fn execution_order(&self) -> &[ModelName] {
        &self.order
    }

    /// Models with resolved `depends_on`, in declaration order
    pub fn models(&self) -> &[Model] {
        &self.models
    }

    /// Look up a model by name
    pub fn model(&self, name: &str) -> Option<&Model> {
        self.models.iter().find(|m| m.name == name)
    }

    /// Models a model reads from directly
    pub fn dependencies(&self, name: &str) -> Vec<ModelName> {
        self.dag.dependencies(name)
    }

    /// Models reading from a model directly
    pub fn dependents(&self, name: &str) -> Vec<ModelName> {
        self.dag.dependents(name)
    }

    /// Ephemeral models to inline into a model, innermost first
    pub fn ephemerals_for(&self, name: &str) -> Vec<(String, String)> {
        collect_ephemeral_dependencies(
            name,
            &self.deps,
            |dep| self.ephemeral_sql.contains_key(dep),
            |dep| self.ephemeral_sql.get(dep).cloned(),
        )
    }

    /// Build every model in order on one connection.
    ///
    /// A fresh warehouse snapshot is taken first. A model that fails
    /// does not stop the run, but every model downstream of it is
    /// skipped without touching the warehouse.
    pub async fn run(
        &self,
        ctx: &Context,
        conn: &mut DatabaseConnection,
        opts: RunOptions,
    ) -> RunResult<BuildReport> {
        let snapshot = ctx.introspect(conn).await?;
        let schema = ctx.schema();
        let mut report = BuildReport::new();
        // Failed model, or skipped model mapped to the failure upstream of it
        let mut blocked: HashMap<ModelName, ModelName> = HashMap::new();

        log::info!(
            "Running {} model(s){}",
            self.order.len(),
            if opts.full_refresh { " with full refresh" } else { "" }
        );

        for name in &self.order {
            let Some(model) = self.model(name) else {
                continue;
            };

            let upstream = self
                .dag
                .dependencies(name)
                .iter()
                .find_map(|dep| blocked.get(dep).cloned());
            if let Some(upstream) = upstream {
                log::warn!("SKIP {} (upstream model {} failed)", name, upstream);
                blocked.insert(name.clone(), upstream.clone());
                report.push(name.clone(), ModelOutcome::Skipped { upstream });
                continue;
            }

            let compiled = CompiledModel::new(
                model,
                &schema,
                ctx.relation(name),
                snapshot.schemas_context(),
                opts.full_refresh,
            );
            let strategy = compiled.strategy();
            let ephemerals = self.ephemerals_for(name);

            match compiled
                .run(conn, ctx.renderer(), &ephemerals, opts.on_test_fail)
                .await
            {
                Ok(()) => {
                    log::info!("OK {} ({}, {:?})", name, model.materialization, strategy);
                    report.push(name.clone(), ModelOutcome::Done);
                }
                Err(e) => {
                    log::error!("FAIL {}: {}", name, e);
                    blocked.insert(name.clone(), name.clone());
                    report.push(
                        name.clone(),
                        ModelOutcome::Failed {
                            error: e.to_string(),
                        },
                    );
                }
            }
        }

        log::info!(
            "Finished run {}: {} done, {} failed, {} skipped",
            report.run_id,
            report.done_count(),
            report.failed_count(),
            report.skipped_count()
        );
        Ok(report)
    }
}

#[cfg(test)]
#[path = "graph_test.rs"]
mod tests;
