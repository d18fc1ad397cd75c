//! Trait definitions for external interactions
//!
//! These traits define the boundaries between domain logic and infrastructure.
//! Implementations live in other crates.

use crate::edge::{
    ApplyId, ConfirmState, EdgeId, NewApply, NewEdge, Origin, RelationApply, RelationEdge,
    UpsertOutcome,
};
use crate::job::{InferenceJob, JobId};
use crate::path::GenderMap;
use crate::person::{Gender, PersonId};
use std::collections::BTreeSet;

/// Trait for storing relation edges, applications and reading the person directory
///
/// Implemented by the infrastructure layer (kinship-store)
pub trait RelationStore {
    /// Error type for store operations
    type Error;

    // --- Edges ---

    /// Insert an edge as-is
    fn insert_edge(&mut self, edge: NewEdge) -> Result<EdgeId, Self::Error>;

    /// Get an edge by id
    fn get_edge(&self, id: EdgeId) -> Result<Option<RelationEdge>, Self::Error>;

    /// All rows from `owner` to `other`, any origin or state
    fn edges_between(&self, owner: PersonId, other: PersonId) -> Result<Vec<RelationEdge>, Self::Error>;

    /// Query edges matching criteria, ordered by id
    fn query_edges(&self, query: &EdgeQuery) -> Result<Vec<RelationEdge>, Self::Error>;

    /// Atomically write an inferred edge unless the ordered pair is covered.
    ///
    /// Skips when a manual confirmed, an inferred confirmed or an inferred
    /// rejected row exists; confirms a pending inferred row in place.
    fn upsert_inferred(&mut self, edge: NewEdge) -> Result<UpsertOutcome, Self::Error>;

    /// Change the confirmation state of an edge
    fn set_confirm_state(&mut self, id: EdgeId, state: ConfirmState) -> Result<(), Self::Error>;

    /// Delete every row between `a` and `b`, both directions and origins
    fn delete_between(&mut self, a: PersonId, b: PersonId) -> Result<usize, Self::Error>;

    /// Delete inferred rows whose endpoints are both in `people`
    fn delete_inferred_among(&mut self, people: &BTreeSet<PersonId>) -> Result<usize, Self::Error>;

    /// Every person that owns at least one edge, ascending
    fn edge_owners(&self) -> Result<Vec<PersonId>, Self::Error>;

    // --- Applications ---

    /// Record a new pending application
    fn insert_apply(&mut self, apply: NewApply) -> Result<ApplyId, Self::Error>;

    /// Get an application by id
    fn get_apply(&self, id: ApplyId) -> Result<Option<RelationApply>, Self::Error>;

    /// Pending application between two people, either direction
    fn pending_apply_between(&self, a: PersonId, b: PersonId) -> Result<Option<RelationApply>, Self::Error>;

    /// Pending applications addressed to `target`, newest first
    fn pending_applies_for(&self, target: PersonId) -> Result<Vec<RelationApply>, Self::Error>;

    /// Mark an application accepted and insert both manual edges in one transaction
    fn accept_apply(
        &mut self,
        id: ApplyId,
        forward: NewEdge,
        reverse: NewEdge,
    ) -> Result<(EdgeId, EdgeId), Self::Error>;

    /// Mark an application rejected
    fn reject_apply(&mut self, id: ApplyId, reason: Option<&str>) -> Result<(), Self::Error>;

    // --- Person directory ---

    /// Whether the person exists and is active
    fn person_exists(&self, id: PersonId) -> Result<bool, Self::Error>;

    /// Current gender, `Unknown` for unknown people
    fn gender_of(&self, id: PersonId) -> Result<Gender, Self::Error>;

    /// Current genders of many people; missing people are absent from the map
    fn genders_of(&self, ids: &[PersonId]) -> Result<GenderMap, Self::Error>;

    // --- Provided helpers ---

    /// Confirmed rows owned by `owner`
    fn confirmed_edges_from(&self, owner: PersonId) -> Result<Vec<RelationEdge>, Self::Error> {
        self.query_edges(&EdgeQuery {
            owner: Some(owner),
            confirm_state: Some(ConfirmState::Confirmed),
            ..Default::default()
        })
    }

    /// First confirmed row from `owner` to `other`, manual preferred
    fn confirmed_edge(&self, owner: PersonId, other: PersonId) -> Result<Option<RelationEdge>, Self::Error> {
        let mut edges: Vec<RelationEdge> = self
            .edges_between(owner, other)?
            .into_iter()
            .filter(RelationEdge::is_confirmed)
            .collect();
        edges.sort_by_key(|e| (e.origin != Origin::Manual, e.id));
        Ok(edges.into_iter().next())
    }
}

/// Query criteria for retrieving edges
#[derive(Debug, Clone, Default)]
pub struct EdgeQuery {
    /// Filter by owner
    pub owner: Option<PersonId>,

    /// Filter by other person
    pub other: Option<PersonId>,

    /// Rows where the person is owner or other
    pub involving: Option<PersonId>,

    /// Filter by origin
    pub origin: Option<Origin>,

    /// Filter by confirmation state
    pub confirm_state: Option<ConfirmState>,

    /// Maximum results to return
    pub limit: Option<usize>,
}

/// Trait for tracking re-inference jobs
///
/// Implementations evict entries after a TTL; a missing job reads as `None`.
pub trait JobStore: Send + Sync {
    /// Insert or replace a job record
    fn put(&self, job: InferenceJob);

    /// Read a job record
    fn get(&self, id: &JobId) -> Option<InferenceJob>;
}
