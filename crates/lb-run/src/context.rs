//! Project context: configuration, models, renderer and warehouse snapshot

use crate::error::RunResult;
use lb_core::sql_utils::quote_relation;
use lb_core::{
    load_models, ColumnInfo, CoreError, Model, ProjectConfig, RelationKind, SchemaMap,
};
use lb_db::{AdapterRegistry, DatabaseConnection, OperationKind, WarehouseAdapter};
use lb_jinja::{LayeredStore, RenderContext, TemplateRenderer};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Everything a run needs to know about a project.
///
/// A context is never mutated. [`Context::introspect`] returns a new
/// context carrying a fresh snapshot of the warehouse metadata.
#[derive(Clone)]
pub struct Context {
    root: PathBuf,
    config: ProjectConfig,
    adapter: Arc<dyn WarehouseAdapter>,
    models: Vec<Model>,
    renderer: Arc<TemplateRenderer>,
    schemas: SchemaMap,
}

impl Context {
    /// Load a project with the default adapter registry
    pub fn load(project_path: &Path) -> RunResult<Self> {
        Self::load_with_registry(project_path, &AdapterRegistry::default())
    }

    /// Load a project, resolving its adapter from `registry`
    pub fn load_with_registry(project_path: &Path, registry: &AdapterRegistry) -> RunResult<Self> {
        if !project_path.is_dir() {
            return Err(CoreError::ProjectNotFound {
                path: project_path.display().to_string(),
            }
            .into());
        }
        let root = project_path.to_path_buf();
        let config = ProjectConfig::load_from_dir(&root)?;

        let adapter_name = config.adapter_name();
        let adapter = registry
            .get(adapter_name)
            .ok_or_else(|| CoreError::ConfigInvalid {
                message: format!(
                    "Unknown adapter '{}' (available: {})",
                    adapter_name,
                    registry.names().join(", ")
                ),
            })?;
        adapter
            .validate(&config.connection)
            .map_err(|message| CoreError::ConfigInvalid { message })?;

        let models = load_models(&root, &config)?;
        for model in &models {
            if !model.materialization.is_physical() && model.has_tests() {
                log::warn!(
                    "Model '{}' is ephemeral; its {} column test(s) will not run",
                    model.name,
                    model.column_tests.len()
                );
            }
        }

        let store = LayeredStore::for_project(config.template_paths_absolute(&root));
        let renderer = TemplateRenderer::new(adapter.name(), Arc::new(store), &config.vars);

        log::debug!(
            "Loaded project '{}' with {} model(s), adapter {}",
            config.name,
            models.len(),
            adapter.name()
        );

        Ok(Self {
            root,
            config,
            adapter,
            models,
            renderer: Arc::new(renderer),
            schemas: SchemaMap::new(),
        })
    }

    /// Project root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Parsed project configuration
    pub fn config(&self) -> &ProjectConfig {
        &self.config
    }

    /// Adapter identifier
    pub fn adapter_name(&self) -> &str {
        self.adapter.name()
    }

    /// Schema models are materialized into
    pub fn schema(&self) -> String {
        self.config.connection.schema()
    }

    /// All models in declaration order
    pub fn models(&self) -> &[Model] {
        &self.models
    }

    /// Look up a model by name
    pub fn model(&self, name: &str) -> Option<&Model> {
        self.models.iter().find(|m| m.name == name)
    }

    /// Renderer for this project's adapter, templates and variables
    pub fn renderer(&self) -> &Arc<TemplateRenderer> {
        &self.renderer
    }

    /// Warehouse metadata snapshot
    pub fn schemas_context(&self) -> &SchemaMap {
        &self.schemas
    }

    /// Open a connection and make the target schema the default
    pub async fn connect(&self) -> RunResult<DatabaseConnection> {
        let db = self.adapter.connect(&self.config.connection, &self.root)?;
        let conn = DatabaseConnection::new(db, Arc::clone(&self.renderer));

        let ctx = RenderContext::new().with("schema", self.schema());
        conn.execute_templated("meta/create_schema", &ctx, OperationKind::Execute)
            .await?;
        conn.execute_templated("meta/use_schema", &ctx, OperationKind::Execute)
            .await?;
        log::debug!("Connected to {} (schema {})", self.adapter_name(), self.schema());
        Ok(conn)
    }

    /// Take a fresh snapshot of the warehouse's relations and columns
    pub async fn introspect(&self, conn: &DatabaseConnection) -> RunResult<Context> {
        let rows = conn
            .execute_templated("meta/relations", &RenderContext::new(), OperationKind::Query)
            .await?
            .unwrap_or_default();

        let mut schemas = SchemaMap::new();
        for i in 0..rows.len() {
            let text = |column: &str| match rows.get(i, column) {
                Some(Value::String(s)) => Some(s.clone()),
                Some(Value::Null) | None => None,
                Some(other) => Some(other.to_string()),
            };
            let (Some(schema), Some(name)) = (text("table_schema"), text("table_name")) else {
                continue;
            };
            let kind = RelationKind::from_table_type(&text("table_type").unwrap_or_default());
            let column = text("column_name").map(|column_name| ColumnInfo {
                name: column_name,
                data_type: text("data_type").unwrap_or_default(),
            });
            schemas.add_column(&schema, &name, kind, column);
        }

        log::debug!("Warehouse snapshot holds {} relation(s)", schemas.len());
        Ok(Context {
            schemas,
            ..self.clone()
        })
    }

    /// Quoted `schema.name` relation of a model
    pub fn relation(&self, model: &str) -> String {
        quote_relation(&self.schema(), model)
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("root", &self.root)
            .field("project", &self.config.name)
            .field("adapter", &self.adapter.name())
            .field("models", &self.models.len())
            .field("relations", &self.schemas.len())
            .finish()
    }
}

#[cfg(test)]
#[path = "context_test.rs"]
mod tests;
