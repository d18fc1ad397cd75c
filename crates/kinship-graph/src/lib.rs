//! Kinship Graph Substrate
//!
//! The graph store is an accelerator, never the system of record. It holds
//! structural edges (`PARENT_OF`, `SPOUSE_OF`, `SIBLING_OF`) and answers two
//! bounded queries: all simple paths between two people and all people within
//! N hops. Any store offering those primitives plus typed edge writes can sit
//! behind [`GraphSubstrate`].
//!
//! Callers treat every call as best-effort and fall back to chain composition
//! when the substrate errors or reports itself unavailable.

#![warn(missing_docs)]

pub mod memory;
pub mod sync;

use async_trait::async_trait;
use kinship_domain::{GraphEdge, GraphPath, PersonId};
use std::collections::BTreeSet;
use thiserror::Error;

pub use memory::MemoryGraph;
pub use sync::structural_edge;

/// Errors returned by a graph substrate
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// The substrate is switched off or unreachable
    #[error("Graph substrate unavailable")]
    Unavailable,

    /// Backend-specific failure
    #[error("Graph backend error: {0}")]
    Backend(String),
}

/// Operations the inference engine needs from a graph store
#[async_trait]
pub trait GraphSubstrate: Send + Sync {
    /// Whether the substrate can currently serve requests
    async fn is_available(&self) -> bool;

    /// Insert or replace a typed edge
    async fn upsert_edge(&self, edge: GraphEdge) -> Result<(), GraphError>;

    /// Remove every edge between `a` and `b`, any kind and direction
    async fn delete_edges(&self, a: PersonId, b: PersonId) -> Result<usize, GraphError>;

    /// All simple paths from `from` to `to` with at most `max_hops` edges
    async fn find_paths(
        &self,
        from: PersonId,
        to: PersonId,
        max_hops: usize,
    ) -> Result<Vec<GraphPath>, GraphError>;

    /// Everyone within `max_hops` of `id`, excluding `id`
    async fn find_neighbors(
        &self,
        id: PersonId,
        max_hops: usize,
    ) -> Result<BTreeSet<PersonId>, GraphError>;
}
