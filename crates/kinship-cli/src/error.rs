//! Error types for the CLI application.

use kinship_service::ServiceError;
use thiserror::Error;

/// Result type alias for CLI operations.
pub type Result<T> = std::result::Result<T, CliError>;

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Service error
    #[error(transparent)]
    Service(#[from] ServiceError),

    /// Store error outside the service layer
    #[error("Storage error: {0}")]
    Store(#[from] kinship_store::StoreError),

    /// Background worker error
    #[error("Janitor error: {0}")]
    Janitor(#[from] kinship_janitor::JanitorError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    /// A re-inference job ended in error
    #[error("Job failed: {0}")]
    Job(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
