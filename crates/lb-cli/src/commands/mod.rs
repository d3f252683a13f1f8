//! CLI command implementations
//!
//! Each command returns `Ok(true)` on success and `Ok(false)` when it ran
//! to completion but the project is not in a good state.

pub mod ls;
pub mod run;
pub mod seed;

use anyhow::{Context as _, Result};
use lb_run::Context;
use std::path::Path;

use crate::cli::GlobalArgs;

/// Load the project named by the global `--project-dir`
pub(crate) fn load_context(global: &GlobalArgs) -> Result<Context> {
    let path = Path::new(&global.project_dir);
    Context::load(path)
        .with_context(|| format!("Failed to load project at {}", path.display()))
}
