//! List command implementation

use anyhow::{Context as _, Result};
use lb_run::ProjectGraph;
use serde::Serialize;

use super::load_context;
use crate::cli::{GlobalArgs, LsArgs, LsOutput};

#[derive(Debug, Serialize)]
struct ModelInfo {
    name: String,
    materialized: String,
    depends_on: Vec<String>,
    tests: usize,
}

/// Execute the ls command
pub async fn execute(args: &LsArgs, global: &GlobalArgs) -> Result<bool> {
    let ctx = load_context(global)?;
    let graph = ProjectGraph::build(ctx.models(), &ctx).context("Failed to resolve models")?;

    let infos: Vec<ModelInfo> = graph
        .execution_order()
        .iter()
        .filter_map(|name| graph.model(name))
        .map(|model| ModelInfo {
            name: model.name.to_string(),
            materialized: model.materialization.to_string(),
            depends_on: model.depends_on.iter().map(ToString::to_string).collect(),
            tests: model.column_tests.len(),
        })
        .collect();

    match args.output {
        LsOutput::Json => println!("{}", serde_json::to_string_pretty(&infos)?),
        LsOutput::Table => print_table(&infos),
    }
    Ok(true)
}

fn print_table(infos: &[ModelInfo]) {
    let width = infos
        .iter()
        .map(|i| i.name.len())
        .max()
        .unwrap_or(0)
        .max("NAME".len());

    println!("{:<width$}  {:<12}  {:>5}  DEPENDS ON", "NAME", "MATERIALIZED", "TESTS");
    for info in infos {
        let deps = if info.depends_on.is_empty() {
            "-".to_string()
        } else {
            info.depends_on.join(", ")
        };
        println!(
            "{:<width$}  {:<12}  {:>5}  {}",
            info.name, info.materialized, info.tests, deps
        );
    }
    println!("\n{} model(s)", infos.len());
}
