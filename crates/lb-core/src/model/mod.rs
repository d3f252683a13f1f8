//! Model representation

pub mod testing;

pub use testing::{ColumnTests, TestParams, TestSpec, RESERVED_TEST_PARAMS};

use crate::config::{Materialization, ProjectConfig};
use crate::error::{CoreError, CoreResult};
use crate::model_name::ModelName;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};

/// A named SQL transformation
#[derive(Debug, Clone, Serialize)]
pub struct Model {
    /// Model name (derived from filename without extension)
    pub name: ModelName,

    /// Path to the source SQL file (empty for models built in code)
    pub path: PathBuf,

    /// Template text of the SELECT producing the model
    pub sql_body: String,

    /// How the model is realized in the warehouse
    pub materialization: Materialization,

    /// Columns identifying a row for incremental inserts
    pub unique_key: Vec<String>,

    /// Per-column tests in declaration order
    pub column_tests: ColumnTests,

    /// Column time-based tests default to
    pub start_field: Option<String>,

    /// Human description from the model YAML file
    pub description: Option<String>,

    /// Other models referenced by the body; filled in when the graph is built
    pub depends_on: BTreeSet<ModelName>,
}

/// Unique key as written in YAML: a single (comma separated) string or a list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UniqueKey {
    /// `unique_key: order_id` or `unique_key: "a, b"`
    One(String),
    /// `unique_key: [a, b]`
    Many(Vec<String>),
}

impl UniqueKey {
    fn into_columns(self) -> Vec<String> {
        let raw = match self {
            UniqueKey::One(s) => s.split(',').map(str::to_string).collect(),
            UniqueKey::Many(v) => v,
        };
        raw.into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }
}

/// Model metadata from the sibling `<name>.yml` file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelSchema {
    /// Model description
    #[serde(default)]
    pub description: Option<String>,

    /// Materialization (defaults to view)
    #[serde(default)]
    pub materialized: Option<Materialization>,

    /// Unique key columns, required for incremental models
    #[serde(default)]
    pub unique_key: Option<UniqueKey>,

    /// Column time-based tests default to
    #[serde(default)]
    pub start_field: Option<String>,

    /// Column tests: column name -> list of tests
    #[serde(default)]
    pub columns: serde_yaml::Mapping,
}

impl ModelSchema {
    /// Load a model schema file
    pub fn load(path: &Path) -> CoreResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| CoreError::IoWithPath {
            path: path.display().to_string(),
            source: e,
        })?;
        serde_yaml::from_str(&content).map_err(|e| CoreError::SchemaParse {
            path: path.display().to_string(),
            source: e,
        })
    }
}

impl Model {
    /// Create a view model from a name and body; use the builder methods to configure it
    pub fn new(name: impl Into<String>, sql_body: impl Into<String>) -> Self {
        Self {
            name: ModelName::new(name),
            path: PathBuf::new(),
            sql_body: sql_body.into(),
            materialization: Materialization::default(),
            unique_key: Vec::new(),
            column_tests: ColumnTests::new(),
            start_field: None,
            description: None,
            depends_on: BTreeSet::new(),
        }
    }

    /// Set the materialization
    pub fn materialized(mut self, materialization: Materialization) -> Self {
        self.materialization = materialization;
        self
    }

    /// Set the unique key columns
    pub fn with_unique_key<S: Into<String>>(mut self, columns: impl IntoIterator<Item = S>) -> Self {
        self.unique_key = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Append a column test
    pub fn with_test(mut self, column: impl Into<String>, spec: TestSpec) -> Self {
        self.column_tests.push(column, spec);
        self
    }

    /// Set the start field
    pub fn with_start_field(mut self, column: impl Into<String>) -> Self {
        self.start_field = Some(column.into());
        self
    }

    /// Replace the derived dependencies
    pub fn with_dependencies(mut self, deps: BTreeSet<ModelName>) -> Self {
        self.depends_on = deps;
        self
    }

    /// Load a model from its SQL file and optional sibling YAML file
    pub fn from_file(path: PathBuf) -> CoreResult<Self> {
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| CoreError::ModelParseError {
                name: path.display().to_string(),
                message: "Cannot extract model name from path".to_string(),
            })?
            .to_string();

        let sql_body = std::fs::read_to_string(&path).map_err(|e| CoreError::IoWithPath {
            path: path.display().to_string(),
            source: e,
        })?;

        let yml_path = path.with_extension("yml");
        let yaml_path = path.with_extension("yaml");
        let schema = if yml_path.exists() {
            ModelSchema::load(&yml_path)?
        } else if yaml_path.exists() {
            ModelSchema::load(&yaml_path)?
        } else {
            ModelSchema::default()
        };

        let column_tests =
            ColumnTests::from_yaml(&schema.columns).map_err(|message| CoreError::ModelParseError {
                name: name.clone(),
                message,
            })?;

        let model = Self {
            name: ModelName::new(name),
            path,
            sql_body,
            materialization: schema.materialized.unwrap_or_default(),
            unique_key: schema
                .unique_key
                .map(UniqueKey::into_columns)
                .unwrap_or_default(),
            column_tests,
            start_field: schema.start_field,
            description: schema.description,
            depends_on: BTreeSet::new(),
        };
        model.validate()?;
        Ok(model)
    }

    /// Check the invariants of a single model definition
    pub fn validate(&self) -> CoreResult<()> {
        if self.sql_body.trim().is_empty() {
            return Err(CoreError::ModelParseError {
                name: self.name.to_string(),
                message: "SQL body is empty".to_string(),
            });
        }

        if self.materialization == Materialization::Incremental && self.unique_key.is_empty() {
            return Err(CoreError::ConfigInvalid {
                message: format!(
                    "Incremental model '{}' requires a unique_key",
                    self.name
                ),
            });
        }

        Ok(())
    }

    /// Whether any column tests are configured
    pub fn has_tests(&self) -> bool {
        !self.column_tests.is_empty()
    }
}

/// Discover all models under the project's model paths.
///
/// Models are returned in declaration order: directories are walked
/// depth-first with entries sorted by file name.
pub fn load_models(root: &Path, config: &ProjectConfig) -> CoreResult<Vec<Model>> {
    let mut paths = Vec::new();
    for dir in config.model_paths_absolute(root) {
        if dir.is_dir() {
            discover_sql_files(&dir, &mut paths)?;
        } else {
            log::debug!("Model path {} does not exist, skipping", dir.display());
        }
    }

    let mut models: Vec<Model> = Vec::with_capacity(paths.len());
    let mut seen: HashMap<String, PathBuf> = HashMap::new();
    for path in paths {
        let model = Model::from_file(path)?;
        if let Some(existing) = seen.get(model.name.as_str()) {
            return Err(CoreError::DuplicateModel {
                name: model.name.to_string(),
                path1: existing.display().to_string(),
                path2: model.path.display().to_string(),
            });
        }
        seen.insert(model.name.to_string(), model.path.clone());
        models.push(model);
    }

    Ok(models)
}

fn discover_sql_files(dir: &Path, paths: &mut Vec<PathBuf>) -> CoreResult<()> {
    let mut entries = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(|e| CoreError::IoWithPath {
        path: dir.display().to_string(),
        source: e,
    })? {
        let entry = entry.map_err(|e| CoreError::IoWithPath {
            path: dir.display().to_string(),
            source: e,
        })?;
        if entry
            .file_name()
            .to_str()
            .is_some_and(|n| n.starts_with('.'))
        {
            continue;
        }
        entries.push(entry.path());
    }
    entries.sort();

    for path in entries {
        if path.is_dir() {
            discover_sql_files(&path, paths)?;
        } else if path.extension().is_some_and(|e| e == "sql") {
            paths.push(path);
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "model_test.rs"]
mod tests;
