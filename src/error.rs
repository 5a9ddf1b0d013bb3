//! Error types for schema preparation

use thiserror::Error;

/// Result type for schema operations
pub type Result<T> = std::result::Result<T, SchemaError>;

/// Schema preparation errors
#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("Schema of module {module} cannot be used for AI generation")]
    UnsupportedSchema { module: String },

    #[error("Invalid module reference: {0}")]
    InvalidModule(String),

    #[error("Invalid completion: {0}")]
    InvalidCompletion(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Semver error: {0}")]
    Semver(#[from] semver::Error),

    #[error("Config error: {0}")]
    Config(#[from] config_crate::ConfigError),
}
