//! Warehouse adapters and their registry
//!
//! An adapter knows which connection settings its warehouse needs and how
//! to open a [`Database`] from them. The project's adapter is looked up
//! once, when the project is loaded.

use crate::duckdb::DuckDbBackend;
use crate::error::DbResult;
use crate::traits::Database;
use lb_core::ConnectionParams;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

/// Capabilities of one warehouse backend
pub trait WarehouseAdapter: Send + Sync {
    /// Adapter identifier, as written in `adapter:` of the project config
    fn name(&self) -> &'static str;

    /// Connection settings that must be present
    fn required_settings(&self) -> &'static [&'static str];

    /// Check connection settings before any connection is attempted
    fn validate(&self, params: &ConnectionParams) -> Result<(), String> {
        let missing: Vec<&str> = self
            .required_settings()
            .iter()
            .copied()
            .filter(|key| params.get(key).map_or(true, |v| v.trim().is_empty()))
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(format!(
                "Adapter '{}' requires connection setting(s): {}",
                self.name(),
                missing.join(", ")
            ))
        }
    }

    /// Open a connection; relative paths resolve against `project_root`
    fn connect(&self, params: &ConnectionParams, project_root: &Path)
        -> DbResult<Box<dyn Database>>;
}

/// DuckDB adapter; `path` is a database file or `:memory:`
#[derive(Debug, Clone, Copy, Default)]
pub struct DuckDbAdapter;

impl WarehouseAdapter for DuckDbAdapter {
    fn name(&self) -> &'static str {
        "duckdb"
    }

    fn required_settings(&self) -> &'static [&'static str] {
        &["path"]
    }

    fn connect(
        &self,
        params: &ConnectionParams,
        project_root: &Path,
    ) -> DbResult<Box<dyn Database>> {
        let path = params.get("path").unwrap_or_else(|| ":memory:".to_string());
        let backend = if path == ":memory:" {
            DuckDbBackend::in_memory()?
        } else {
            let path = Path::new(&path);
            let resolved = if path.is_absolute() {
                path.to_path_buf()
            } else {
                project_root.join(path)
            };
            log::debug!("Opening DuckDB database {}", resolved.display());
            DuckDbBackend::from_path(&resolved)?
        };
        Ok(Box::new(backend))
    }
}

/// Adapters known by name
#[derive(Clone)]
pub struct AdapterRegistry {
    adapters: BTreeMap<&'static str, Arc<dyn WarehouseAdapter>>,
}

impl AdapterRegistry {
    /// Create an empty registry
    pub fn empty() -> Self {
        Self {
            adapters: BTreeMap::new(),
        }
    }

    /// Register an adapter, replacing one with the same name
    pub fn register(&mut self, adapter: Arc<dyn WarehouseAdapter>) {
        self.adapters.insert(adapter.name(), adapter);
    }

    /// Look up an adapter by identifier, case-insensitively
    pub fn get(&self, name: &str) -> Option<Arc<dyn WarehouseAdapter>> {
        self.adapters
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name.trim()))
            .map(|(_, adapter)| Arc::clone(adapter))
    }

    /// Registered adapter identifiers, sorted
    pub fn names(&self) -> Vec<&'static str> {
        self.adapters.keys().copied().collect()
    }
}

impl Default for AdapterRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register(Arc::new(DuckDbAdapter));
        registry
    }
}

impl std::fmt::Debug for AdapterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.adapters.keys()).finish()
    }
}
