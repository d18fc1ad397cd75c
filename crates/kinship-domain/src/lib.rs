//! Kinship Domain Layer
//!
//! Core model of the kinship inference engine: people, relation chains, the
//! kinship vocabulary, chain composition, graph-path resolution and the
//! trait interfaces the infrastructure crates implement.
//!
//! ## Key Concepts
//!
//! - **Chain**: ordered steps describing how one person reaches another
//! - **Vocabulary**: chain to display term, and chain reversal
//! - **Composition**: A→B plus B→C gives A→C, conservatively
//! - **Path resolution**: typed graph paths to terms, gender-aware
//! - **Edges**: one row per direction, manual or inferred
//!
//! ## Architecture
//!
//! - Pure logic, no I/O
//! - Infrastructure implementations live in other crates
//! - Trait definitions for all external interactions

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod chain;
pub mod compose;
pub mod edge;
pub mod job;
pub mod path;
pub mod person;
pub mod traits;
pub mod vocabulary;

// Re-exports for convenience
pub use chain::{Chain, ChainError, Seniority, Step};
pub use compose::compose;
pub use edge::{
    now_millis, ApplyId, ApplyStatus, ConfirmState, EdgeId, NewApply, NewEdge, Origin, RelationApply,
    RelationEdge, RelationStatus, UpsertOutcome,
};
pub use job::{InferenceJob, JobId, JobStatus, ReinferSummary};
pub use path::{EdgeKind, GenderMap, GraphEdge, GraphPath};
pub use person::{Gender, PersonId};
pub use traits::{EdgeQuery, JobStore, RelationStore};
pub use vocabulary::{is_generic, resolve, reverse, GENERIC_TERM};
