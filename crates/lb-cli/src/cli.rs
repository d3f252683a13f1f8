//! CLI argument definitions using clap derive API

use clap::{Args, Parser, Subcommand, ValueEnum};
use lb_core::OnTestFail;

/// lightbuild - build SQL models into a warehouse and test them
#[derive(Parser, Debug)]
#[command(name = "lb")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Global arguments available to all commands
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Enable debug logging, including every SQL statement sent
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to project directory
    #[arg(short = 'p', long, global = true, default_value = ".")]
    pub project_dir: String,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build every model in dependency order and run its tests
    Run(RunArgs),

    /// Load CSV seed files into the warehouse
    Seed(SeedArgs),

    /// List models in execution order
    Ls(LsArgs),
}

/// Arguments for the run command
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Rebuild incremental models from scratch
    #[arg(long)]
    pub full_refresh: bool,

    /// What to do with a model's data when a test fails (default: from lightbuild.yml)
    #[arg(long, value_enum)]
    pub on_test_fail: Option<TestFailPolicy>,

    /// Print the run report as JSON on stdout
    #[arg(long)]
    pub json: bool,
}

/// Test failure policy as spelled on the command line
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestFailPolicy {
    /// Keep the written data and fail the model
    Error,
    /// Roll back the model's writes and fail the model
    ErrorWithRollback,
}

impl From<TestFailPolicy> for OnTestFail {
    fn from(policy: TestFailPolicy) -> Self {
        match policy {
            TestFailPolicy::Error => OnTestFail::Error,
            TestFailPolicy::ErrorWithRollback => OnTestFail::ErrorWithRollback,
        }
    }
}

/// Arguments for the seed command
#[derive(Args, Debug)]
pub struct SeedArgs {
    /// Seed names to load (comma-separated, default: all)
    #[arg(short, long)]
    pub seeds: Option<String>,
}

/// Arguments for the ls command
#[derive(Args, Debug)]
pub struct LsArgs {
    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub output: LsOutput,
}

/// Ls output formats
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LsOutput {
    /// Aligned table
    Table,
    /// JSON array
    Json,
}

#[cfg(test)]
#[path = "cli_test.rs"]
mod tests;
