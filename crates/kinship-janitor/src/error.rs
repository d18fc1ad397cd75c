//! Error types for Janitor operations

use kinship_engine::EngineError;
use thiserror::Error;

/// Errors that can occur during Janitor operations
#[derive(Error, Debug)]
pub enum JanitorError {
    /// Storage layer error
    #[error("Storage error: {0}")]
    Store(String),

    /// Propagation failed while replaying a relation
    #[error("Propagation error: {0}")]
    Engine(#[from] EngineError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Worker error (lock or runtime issues)
    #[error("Worker error: {0}")]
    Worker(String),
}
