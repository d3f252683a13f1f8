//! CSV seeds loaded into the warehouse

use crate::context::Context;
use crate::error::{RunError, RunResult};
use lb_core::CoreError;
use lb_db::{DatabaseConnection, OperationKind};
use lb_jinja::RenderContext;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// A CSV file under one of the project's seed paths
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Seed {
    /// Table name, from the file stem
    pub name: String,
    /// CSV file
    pub path: PathBuf,
}

/// Find all seeds, sorted by path within each seed directory.
///
/// Seeds and models share one schema, so a seed named like a model is an error.
pub fn discover_seeds(ctx: &Context) -> RunResult<Vec<Seed>> {
    let mut seeds: Vec<Seed> = Vec::new();
    let mut seen: HashMap<String, PathBuf> = HashMap::new();

    for dir in ctx.config().seed_paths_absolute(ctx.root()) {
        if !dir.is_dir() {
            log::debug!("Seed path {} does not exist, skipping", dir.display());
            continue;
        }
        let mut paths = csv_files(&dir)?;
        paths.sort();

        for path in paths {
            let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if let Some(existing) = seen.get(name) {
                return Err(CoreError::ConfigInvalid {
                    message: format!(
                        "Duplicate seed '{}' in {} and {}",
                        name,
                        existing.display(),
                        path.display()
                    ),
                }
                .into());
            }
            if let Some(model) = ctx
                .models()
                .iter()
                .find(|m| m.name.as_str().eq_ignore_ascii_case(name))
            {
                return Err(CoreError::ConfigInvalid {
                    message: format!(
                        "Seed '{}' ({}) has the same relation name as model '{}'",
                        name,
                        path.display(),
                        model.name
                    ),
                }
                .into());
            }
            seen.insert(name.to_string(), path.clone());
            seeds.push(Seed {
                name: name.to_string(),
                path,
            });
        }
    }

    Ok(seeds)
}

fn csv_files(dir: &Path) -> RunResult<Vec<PathBuf>> {
    let io_err = |source| RunError::SeedIo {
        path: dir.display().to_string(),
        source,
    };
    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(io_err)? {
        let path = entry.map_err(io_err)?.path();
        if path.is_file() && path.extension().is_some_and(|e| e.eq_ignore_ascii_case("csv")) {
            paths.push(path);
        }
    }
    Ok(paths)
}

/// Replace a seed's table with the CSV contents; returns the row count
pub async fn load_seed(
    ctx: &Context,
    conn: &mut DatabaseConnection,
    seed: &Seed,
) -> RunResult<usize> {
    let file = std::fs::File::open(&seed.path).map_err(|source| RunError::SeedIo {
        path: seed.path.display().to_string(),
        source,
    })?;
    let relation = ctx.relation(&seed.name);
    let render_ctx = RenderContext::new().with("this", relation.clone());

    conn.begin().await?;
    let loaded = conn
        .execute_templated("seed/load", &render_ctx, OperationKind::Copy(Box::new(file)))
        .await;
    if let Err(e) = loaded {
        if let Err(rollback_err) = conn.rollback().await {
            log::warn!("Rollback failed: {}", rollback_err);
        }
        return Err(e.into());
    }
    conn.commit().await?;

    let rows = conn
        .query(&format!("SELECT COUNT(*) FROM {}", relation), &[])
        .await?;
    let count = rows
        .scalar()
        .and_then(serde_json::Value::as_u64)
        .unwrap_or_default() as usize;
    log::info!("Loaded seed {} ({} rows)", seed.name, count);
    Ok(count)
}

/// Load every seed of the project, in discovery order
pub async fn load_seeds(
    ctx: &Context,
    conn: &mut DatabaseConnection,
) -> RunResult<Vec<(Seed, usize)>> {
    let mut loaded = Vec::new();
    for seed in discover_seeds(ctx)? {
        let rows = load_seed(ctx, conn, &seed).await?;
        loaded.push((seed, rows));
    }
    Ok(loaded)
}
