//! Error types for lb-core

use thiserror::Error;

/// Failures loading a project: configuration, model files, dependency graph
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("[E001] Config file not found: {path}")]
    ConfigNotFound { path: String },

    #[error("[E002] Failed to parse config {path}: {message}")]
    ConfigParseError { path: String, message: String },

    /// A setting is missing, unknown to the adapter, or out of range
    #[error("[E003] Invalid config: {message}")]
    ConfigInvalid { message: String },

    #[error("[E004] Project directory not found: {path}")]
    ProjectNotFound { path: String },

    /// Model options or column tests that cannot be used as written
    #[error("[E005] Invalid model '{name}': {message}")]
    ModelParseError { name: String, message: String },

    /// `cycle` lists the models in dependency order, first one repeated
    #[error("[E006] Circular dependency detected: {cycle}")]
    CircularDependency { cycle: String },

    #[error("[E007] Duplicate model name '{name}' in {path1} and {path2}")]
    DuplicateModel {
        name: String,
        path1: String,
        path2: String,
    },

    #[error("[E008] Empty name in {context}")]
    EmptyName { context: String },

    #[error("[E009] Failed to read '{path}': {source}")]
    IoWithPath {
        path: String,
        source: std::io::Error,
    },

    #[error("[E010] Failed to parse model file {path}: {source}")]
    SchemaParse {
        path: String,
        source: serde_yaml::Error,
    },
}

impl CoreError {
    /// Missing or invalid project settings, as opposed to model or IO problems
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            CoreError::ConfigNotFound { .. }
                | CoreError::ConfigParseError { .. }
                | CoreError::ConfigInvalid { .. }
        )
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
