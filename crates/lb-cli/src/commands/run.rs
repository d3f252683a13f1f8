//! Run command implementation

use anyhow::{Context as _, Result};
use lb_run::{BuildReport, ModelOutcome, ProjectGraph, RunOptions};

use super::load_context;
use crate::cli::{GlobalArgs, RunArgs};

/// Execute the run command
pub async fn execute(args: &RunArgs, global: &GlobalArgs) -> Result<bool> {
    let ctx = load_context(global)?;
    let graph = ProjectGraph::build(ctx.models(), &ctx).context("Failed to resolve models")?;

    let opts = RunOptions {
        full_refresh: args.full_refresh,
        on_test_fail: args
            .on_test_fail
            .map(Into::into)
            .unwrap_or(ctx.config().on_test_fail),
    };
    log::debug!("Test failure policy: {}", opts.on_test_fail);

    let mut conn = ctx
        .connect()
        .await
        .context("Failed to connect to warehouse")?;
    let report = graph.run(&ctx, &mut conn, opts).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_problems(&report);
    }
    Ok(report.is_success())
}

fn print_problems(report: &BuildReport) {
    for result in report.problems() {
        match &result.outcome {
            ModelOutcome::Failed { error } => println!("FAIL {}: {}", result.model, error),
            ModelOutcome::Skipped { upstream } => {
                println!("SKIP {}: upstream model {} failed", result.model, upstream)
            }
            ModelOutcome::Done => {}
        }
    }
    println!(
        "Done. {} ok, {} failed, {} skipped",
        report.done_count(),
        report.failed_count(),
        report.skipped_count()
    );
}
