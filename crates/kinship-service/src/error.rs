//! Error types for the inbound operations

use kinship_domain::{ChainError, PersonId};
use kinship_engine::EngineError;
use kinship_janitor::JanitorError;
use thiserror::Error;

/// Result type alias for service operations
pub type Result<T> = std::result::Result<T, ServiceError>;

/// Errors returned to callers of [`KinshipService`](crate::KinshipService)
#[derive(Error, Debug)]
pub enum ServiceError {
    /// The proposed chain could not be parsed
    #[error("Invalid chain: {0}")]
    InvalidChain(#[from] ChainError),

    /// A person tried to relate to themselves
    #[error("Cannot create a relation with yourself")]
    SelfRelation,

    /// The referenced person does not exist or is inactive
    #[error("Person not found: {0}")]
    PersonNotFound(PersonId),

    /// The two people already have a confirmed relation
    #[error("{0} and {1} are already related")]
    AlreadyRelated(PersonId, PersonId),

    /// An application between the two people is still pending
    #[error("A pending application already exists between {0} and {1}")]
    DuplicateApplication(PersonId, PersonId),

    /// Application, edge or job not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// The acting person may not perform this operation
    #[error("Operation not permitted: {0}")]
    Forbidden(String),

    /// The record is not in a state that allows this operation
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Storage layer error
    #[error("Storage error: {0}")]
    Store(String),

    /// Propagation error
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// Repair error
    #[error(transparent)]
    Janitor(#[from] JanitorError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}
