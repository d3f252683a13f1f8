//! Configuration types and parsing for lightbuild.yml

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::{Path, PathBuf};

/// Config file names looked up in a project directory, in order
pub const CONFIG_FILE_NAMES: [&str; 2] = ["lightbuild.yml", "lightbuild.yaml"];

/// Default schema models are materialized into
pub const DEFAULT_SCHEMA: &str = "main";

/// Main project configuration from lightbuild.yml
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectConfig {
    /// Project name
    pub name: String,

    /// Warehouse adapter identifier (e.g. "duckdb")
    #[serde(default)]
    pub adapter: Option<String>,

    /// Adapter-specific connection settings
    #[serde(default)]
    pub connection: ConnectionParams,

    /// Variables available in templates through `var()`
    #[serde(default)]
    pub vars: HashMap<String, serde_yaml::Value>,

    /// Directories containing model SQL files
    #[serde(default = "default_model_paths")]
    pub model_paths: Vec<String>,

    /// Directories containing CSV seed files
    #[serde(default = "default_seed_paths")]
    pub seed_paths: Vec<String>,

    /// Directories containing adapter template overrides
    #[serde(default = "default_template_paths")]
    pub template_paths: Vec<String>,

    /// Default policy applied when a model's tests fail
    #[serde(default)]
    pub on_test_fail: OnTestFail,
}

/// Adapter-specific connection settings.
///
/// Values are kept as YAML scalars and read back as strings, so
/// `port: 5432` and `port: "5432"` are equivalent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionParams(BTreeMap<String, serde_yaml::Value>);

impl ConnectionParams {
    /// Build connection params from string pairs
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), serde_yaml::Value::String(v.into())))
                .collect(),
        )
    }

    /// Get a setting as a string, if present and scalar
    pub fn get(&self, key: &str) -> Option<String> {
        match self.0.get(key)? {
            serde_yaml::Value::String(s) => Some(s.clone()),
            serde_yaml::Value::Number(n) => Some(n.to_string()),
            serde_yaml::Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    /// Whether a setting is present
    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Schema models are materialized into
    pub fn schema(&self) -> String {
        self.get("schema")
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_SCHEMA.to_string())
    }

    /// Setting keys, sorted
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

/// Materialization type for models
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Materialization {
    /// Create a view
    #[default]
    View,
    /// Create a table, rebuilt on every run
    Table,
    /// Table that only receives rows absent under its unique key
    Incremental,
    /// Inlined as a CTE into dependents, no database object created
    Ephemeral,
}

impl Materialization {
    /// Whether a physical relation is created for this materialization
    pub fn is_physical(&self) -> bool {
        !matches!(self, Materialization::Ephemeral)
    }
}

impl fmt::Display for Materialization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Materialization::View => write!(f, "view"),
            Materialization::Table => write!(f, "table"),
            Materialization::Incremental => write!(f, "incremental"),
            Materialization::Ephemeral => write!(f, "ephemeral"),
        }
    }
}

/// What to do with a model's freshly written data when one of its tests fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OnTestFail {
    /// Fail the model and keep the written data for inspection
    #[default]
    Error,
    /// Roll back the model's writes, then fail the model
    ErrorWithRollback,
}

impl fmt::Display for OnTestFail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OnTestFail::Error => write!(f, "error"),
            OnTestFail::ErrorWithRollback => write!(f, "error_with_rollback"),
        }
    }
}

fn default_model_paths() -> Vec<String> {
    vec!["models".to_string()]
}

fn default_seed_paths() -> Vec<String> {
    vec!["seeds".to_string()]
}

fn default_template_paths() -> Vec<String> {
    vec!["templates".to_string()]
}

impl ProjectConfig {
    /// Load configuration from a file path
    pub fn load(path: &Path) -> CoreResult<Self> {
        if !path.exists() {
            return Err(CoreError::ConfigNotFound {
                path: path.display().to_string(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| CoreError::IoWithPath {
            path: path.display().to_string(),
            source: e,
        })?;
        let config: ProjectConfig =
            serde_yaml::from_str(&content).map_err(|e| CoreError::ConfigParseError {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a project directory
    /// Looks for lightbuild.yml or lightbuild.yaml
    pub fn load_from_dir(dir: &Path) -> CoreResult<Self> {
        for file_name in CONFIG_FILE_NAMES {
            let path = dir.join(file_name);
            if path.exists() {
                return Self::load(&path);
            }
        }
        Err(CoreError::ConfigNotFound {
            path: dir.join(CONFIG_FILE_NAMES[0]).display().to_string(),
        })
    }

    /// Validate the configuration
    fn validate(&self) -> CoreResult<()> {
        if self.name.trim().is_empty() {
            return Err(CoreError::ConfigInvalid {
                message: "Project name cannot be empty".to_string(),
            });
        }

        match self.adapter.as_deref().map(str::trim) {
            None | Some("") => {
                return Err(CoreError::ConfigInvalid {
                    message: "Missing required key 'adapter'".to_string(),
                })
            }
            Some(_) => {}
        }

        if self.model_paths.is_empty() {
            return Err(CoreError::ConfigInvalid {
                message: "At least one model_paths entry must be specified".to_string(),
            });
        }

        Ok(())
    }

    /// Adapter identifier; validated non-empty at load time
    pub fn adapter_name(&self) -> &str {
        self.adapter.as_deref().map(str::trim).unwrap_or_default()
    }

    /// Get a variable value by name
    pub fn get_var(&self, name: &str) -> Option<&serde_yaml::Value> {
        self.vars.get(name)
    }

    /// Resolve relative path strings to absolute paths against a root directory
    fn paths_absolute(paths: &[String], root: &Path) -> Vec<PathBuf> {
        paths.iter().map(|p| root.join(p)).collect()
    }

    /// Get absolute model paths relative to a project root
    pub fn model_paths_absolute(&self, root: &Path) -> Vec<PathBuf> {
        Self::paths_absolute(&self.model_paths, root)
    }

    /// Get absolute seed paths relative to a project root
    pub fn seed_paths_absolute(&self, root: &Path) -> Vec<PathBuf> {
        Self::paths_absolute(&self.seed_paths, root)
    }

    /// Get absolute template paths relative to a project root
    pub fn template_paths_absolute(&self, root: &Path) -> Vec<PathBuf> {
        Self::paths_absolute(&self.template_paths, root)
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
