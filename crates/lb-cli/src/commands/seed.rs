//! Seed command implementation

use anyhow::{bail, Context as _, Result};
use lb_run::{discover_seeds, load_seed};
use std::collections::HashSet;

use super::load_context;
use crate::cli::{GlobalArgs, SeedArgs};

/// Execute the seed command
pub async fn execute(args: &SeedArgs, global: &GlobalArgs) -> Result<bool> {
    let ctx = load_context(global)?;
    let mut seeds = discover_seeds(&ctx)?;

    if let Some(filter) = &args.seeds {
        let wanted: HashSet<&str> = filter.split(',').map(str::trim).collect();
        if let Some(missing) = wanted
            .iter()
            .find(|name| !seeds.iter().any(|s| s.name == **name))
        {
            bail!("Seed '{}' not found", missing);
        }
        seeds.retain(|s| wanted.contains(s.name.as_str()));
    }

    if seeds.is_empty() {
        println!("No seeds found.");
        return Ok(true);
    }

    let mut conn = ctx
        .connect()
        .await
        .context("Failed to connect to warehouse")?;
    for seed in &seeds {
        let rows = load_seed(&ctx, &mut conn, seed)
            .await
            .with_context(|| format!("Failed to load seed {}", seed.name))?;
        println!("  ✓ {} ({} rows)", seed.name, rows);
    }
    println!("Loaded {} seed(s)", seeds.len());
    Ok(true)
}
