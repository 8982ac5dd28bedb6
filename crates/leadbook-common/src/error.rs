//! Error types shared across the workspace

use thiserror::Error;

/// Result alias for common operations
pub type Result<T> = std::result::Result<T, CommonError>;

#[derive(Error, Debug)]
pub enum CommonError {
    #[error("Invalid logging configuration: {0}")]
    LogConfig(String),

    #[error("Failed to initialize logging: {0}")]
    LogInit(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed audit job payload: {0}")]
    MalformedJob(#[from] serde_json::Error),

    #[error("Unsupported audit job schema version {found} (this build understands up to {supported})")]
    UnsupportedSchemaVersion { found: u32, supported: u32 },
}
