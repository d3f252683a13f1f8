//! Error types for lb-jinja

use thiserror::Error;

/// Templating errors
#[derive(Error, Debug)]
pub enum JinjaError {
    /// Template render error (J001)
    #[error("[J001] Template render error: {0}")]
    RenderError(String),

    /// No template for the adapter (J002)
    #[error("[J002] Template '{name}' not found for adapter '{adapter}'")]
    TemplateNotFound { adapter: String, name: String },

    /// Template file could not be read (J003)
    #[error("[J003] Failed to read template '{path}': {source}")]
    TemplateIo {
        path: String,
        source: std::io::Error,
    },
}

/// Result type alias for JinjaError
pub type JinjaResult<T> = Result<T, JinjaError>;

impl From<minijinja::Error> for JinjaError {
    fn from(err: minijinja::Error) -> Self {
        let mut message = err.to_string();
        let mut source = std::error::Error::source(&err);
        while let Some(cause) = source {
            message.push_str(&format!(": {cause}"));
            source = cause.source();
        }
        JinjaError::RenderError(message)
    }
}
