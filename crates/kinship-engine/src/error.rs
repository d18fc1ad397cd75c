//! Error types for the propagation engine

use kinship_graph::GraphError;
use thiserror::Error;

/// Errors that can occur while propagating inferences
#[derive(Error, Debug)]
pub enum EngineError {
    /// Relationship store error
    #[error("Store error: {0}")]
    Store(String),

    /// Graph substrate error
    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),

    /// The shared store lock was poisoned by a panicking writer
    #[error("Store lock poisoned")]
    LockPoisoned,

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}
