//! Inbound operations over the relationship store

use crate::config::KinshipConfig;
use crate::error::{Result, ServiceError};
use kinship_domain::traits::{EdgeQuery, RelationStore};
use kinship_domain::{
    resolve, reverse, ApplyId, ApplyStatus, Chain, ConfirmState, EdgeId, Gender, InferenceJob, JobId,
    JobStore, NewApply, NewEdge, Origin, PersonId, RelationApply, RelationEdge, RelationStatus,
};
use kinship_engine::Propagator;
use kinship_graph::{GraphSubstrate, MemoryGraph};
use kinship_janitor::{collect_network, Janitor, JanitorConfig, MemoryJobStore};
use kinship_store::SqliteStore;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt::Display;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::task::JoinHandle;
use tracing::{debug, info};

fn store_err(e: impl Display) -> ServiceError {
    ServiceError::Store(e.to_string())
}

/// Result of accepting an application
#[derive(Debug)]
pub struct AcceptOutcome {
    /// Applicant to target
    pub forward: EdgeId,
    /// Target to applicant
    pub reverse: EdgeId,
    /// Background propagation started for the new pair
    pub propagation: JoinHandle<()>,
}

/// A person in a network view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NetworkNode {
    /// Person id
    pub id: PersonId,
    /// Current gender
    pub gender: Gender,
}

/// Everyone reachable from a person over confirmed edges, with those edges
#[derive(Debug, Clone, Serialize)]
pub struct NetworkView {
    /// Person the view was requested for
    pub origin: PersonId,
    /// Members, ascending by id
    pub nodes: Vec<NetworkNode>,
    /// Confirmed edges between members
    pub edges: Vec<RelationEdge>,
}

/// Entry point for every user-facing kinship operation
///
/// Synchronous validation and writes happen on the caller's thread under the
/// store lock. Propagation and full re-inference run on spawned tasks, so
/// methods that start them must be called from inside a tokio runtime.
pub struct KinshipService<S> {
    propagator: Propagator<S>,
    jobs: Arc<dyn JobStore>,
    janitor_config: JanitorConfig,
}

impl KinshipService<SqliteStore> {
    /// Open the database named in `config`, with an in-process graph when enabled
    pub fn open(config: &KinshipConfig) -> Result<Self> {
        config.validate()?;
        let store = SqliteStore::new(&config.db_path).map_err(store_err)?;
        let graph = config
            .graph_enabled
            .then(|| Arc::new(MemoryGraph::new()) as Arc<dyn GraphSubstrate>);

        info!(
            db = %config.db_path.display(),
            graph = config.graph_enabled,
            "Kinship service opened"
        );
        Ok(Self::new(store, graph, config))
    }
}

impl<S> KinshipService<S>
where
    S: RelationStore + Send + 'static,
    S::Error: Display,
{
    /// Build a service around an existing store
    pub fn new(store: S, graph: Option<Arc<dyn GraphSubstrate>>, config: &KinshipConfig) -> Self {
        let jobs: Arc<dyn JobStore> = Arc::new(MemoryJobStore::new(config.janitor.job_ttl()));
        Self {
            propagator: Propagator::new(Arc::new(Mutex::new(store)), graph, config.engine.clone()),
            jobs,
            janitor_config: config.janitor.clone(),
        }
    }

    /// Replace the job store
    pub fn with_job_store(mut self, jobs: Arc<dyn JobStore>) -> Self {
        self.jobs = jobs;
        self
    }

    /// Shared store handle
    pub fn store(&self) -> &Arc<Mutex<S>> {
        self.propagator.store()
    }

    /// Propagator used for confirmed edges
    pub fn propagator(&self) -> &Propagator<S> {
        &self.propagator
    }

    fn lock(&self) -> Result<MutexGuard<'_, S>> {
        self.propagator
            .store()
            .lock()
            .map_err(|e| ServiceError::Store(format!("Store lock error: {}", e)))
    }

    /// Mirror every confirmed single-step relation into the graph.
    ///
    /// An in-process graph starts empty; call this once after opening an
    /// existing database. Returns the number of pairs visited.
    pub async fn warm_graph(&self) -> Result<usize> {
        if self.propagator.graph().is_none() {
            return Ok(0);
        }
        let pairs: BTreeSet<(PersonId, PersonId)> = {
            let store = self.lock()?;
            let mut pairs = BTreeSet::new();
            for owner in store.edge_owners().map_err(store_err)? {
                for edge in store.confirmed_edges_from(owner).map_err(store_err)? {
                    if edge.chain.len() == 1 {
                        pairs.insert((owner.min(edge.other_id), owner.max(edge.other_id)));
                    }
                }
            }
            pairs
        };
        for &(a, b) in &pairs {
            self.propagator.sync_pair(a, b).await;
        }
        info!(pairs = pairs.len(), "Graph warmed from store");
        Ok(pairs.len())
    }

    // --- Applications ---

    /// Ask `target` to confirm that `applicant` reaches them through `chain_json`
    pub fn apply_relation(
        &self,
        applicant: PersonId,
        target: PersonId,
        chain_json: &str,
        note: Option<&str>,
    ) -> Result<ApplyId> {
        if applicant == target {
            return Err(ServiceError::SelfRelation);
        }
        let chain = Chain::decode(chain_json)?;

        let mut store = self.lock()?;
        for person in [applicant, target] {
            if !store.person_exists(person).map_err(store_err)? {
                return Err(ServiceError::PersonNotFound(person));
            }
        }
        match status_between(&*store, applicant, target).map_err(store_err)? {
            RelationStatus::Related => return Err(ServiceError::AlreadyRelated(applicant, target)),
            RelationStatus::Pending => return Err(ServiceError::DuplicateApplication(applicant, target)),
            RelationStatus::None => {}
        }

        let proposed_term = resolve(&chain);
        let id = store
            .insert_apply(NewApply {
                applicant_id: applicant,
                target_id: target,
                proposed_chain: chain,
                proposed_term: proposed_term.clone(),
                note: note.map(str::to_string),
            })
            .map_err(store_err)?;

        info!(%applicant, %target, apply_id = %id, term = %proposed_term, "Relation application created");
        Ok(id)
    }

    /// Accept a pending application addressed to `person`.
    ///
    /// Writes both manual edges in one transaction, then starts propagation.
    pub fn accept_application(&self, person: PersonId, apply_id: ApplyId) -> Result<AcceptOutcome> {
        let (apply, forward, reverse_id) = {
            let mut store = self.lock()?;
            let apply = pending_apply_for(&*store, person, apply_id)?;
            let (a, b) = (apply.applicant_id, apply.target_id);

            if store.confirmed_edge(a, b).map_err(store_err)?.is_some_and(|e| e.is_confirmed_manual())
                || store.confirmed_edge(b, a).map_err(store_err)?.is_some_and(|e| e.is_confirmed_manual())
            {
                return Err(ServiceError::AlreadyRelated(a, b));
            }

            let genders = store.genders_of(&[a, b]).map_err(store_err)?;
            let gender_a = genders.get(&a).copied().unwrap_or_default();
            let gender_b = genders.get(&b).copied().unwrap_or_default();

            let forward_chain = apply.proposed_chain.with_target_gender(gender_b);
            let reverse_chain = reverse(&forward_chain, gender_a, gender_b);
            let forward_edge = NewEdge::manual(a, b, resolve(&forward_chain), forward_chain);
            let reverse_edge = NewEdge::manual(b, a, resolve(&reverse_chain), reverse_chain);
            debug!(
                forward = %forward_edge.kinship_term,
                reverse = %reverse_edge.kinship_term,
                "Resolved accepted pair"
            );

            let (forward, reverse_id) = store
                .accept_apply(apply_id, forward_edge, reverse_edge)
                .map_err(store_err)?;
            (apply, forward, reverse_id)
        };

        info!(
            apply_id = %apply_id,
            applicant = %apply.applicant_id,
            target = %apply.target_id,
            "Relation application accepted"
        );
        let propagation = self.propagator.on_edge_confirmed(apply.applicant_id, apply.target_id);
        Ok(AcceptOutcome {
            forward,
            reverse: reverse_id,
            propagation,
        })
    }

    /// Reject a pending application addressed to `person`
    pub fn reject_application(&self, person: PersonId, apply_id: ApplyId, reason: Option<&str>) -> Result<()> {
        let mut store = self.lock()?;
        pending_apply_for(&*store, person, apply_id)?;
        store.reject_apply(apply_id, reason).map_err(store_err)?;
        info!(apply_id = %apply_id, %person, "Relation application rejected");
        Ok(())
    }

    // --- Inferred edges ---

    /// Accept an inferred edge owned by `person` and propagate from it
    pub fn confirm_inferred_edge(&self, person: PersonId, edge_id: EdgeId) -> Result<JoinHandle<()>> {
        let edge = {
            let mut store = self.lock()?;
            let edge = owned_inferred_edge(&*store, person, edge_id)?;
            if edge.is_confirmed() {
                return Err(ServiceError::InvalidState(format!("edge {} is already confirmed", edge_id)));
            }
            store
                .set_confirm_state(edge_id, ConfirmState::Confirmed)
                .map_err(store_err)?;
            edge
        };

        info!(edge_id = %edge_id, %person, term = %edge.kinship_term, "Inferred edge confirmed");
        Ok(self.propagator.on_edge_confirmed(edge.owner_id, edge.other_id))
    }

    /// Reject an inferred edge owned by `person`.
    ///
    /// The row stays as a tombstone so propagation does not write it again.
    pub fn reject_inferred_edge(&self, person: PersonId, edge_id: EdgeId) -> Result<()> {
        let mut store = self.lock()?;
        let edge = owned_inferred_edge(&*store, person, edge_id)?;
        if edge.is_tombstone() {
            return Ok(());
        }
        store
            .set_confirm_state(edge_id, ConfirmState::Rejected)
            .map_err(store_err)?;
        info!(edge_id = %edge_id, %person, term = %edge.kinship_term, "Inferred edge rejected");
        Ok(())
    }

    /// Remove the relation behind an edge owned by `person`.
    ///
    /// Deletes every row between the two people in both directions, then
    /// removes the pair from the graph. Returns the number of rows deleted.
    pub async fn remove_relation(&self, person: PersonId, edge_id: EdgeId) -> Result<usize> {
        let (other, removed) = {
            let mut store = self.lock()?;
            let edge = store
                .get_edge(edge_id)
                .map_err(store_err)?
                .ok_or_else(|| ServiceError::NotFound(format!("edge {}", edge_id)))?;
            if edge.owner_id != person {
                return Err(ServiceError::Forbidden(format!("edge {} belongs to {}", edge_id, edge.owner_id)));
            }
            let removed = store.delete_between(person, edge.other_id).map_err(store_err)?;
            (edge.other_id, removed)
        };

        self.propagator.unsync_pair(person, other).await;
        info!(%person, %other, removed, "Relation removed");
        Ok(removed)
    }

    // --- Reads ---

    /// Repair and return the confirmed network around `person`
    pub fn lookup_network(&self, person: PersonId) -> Result<NetworkView> {
        let mut store = self.lock()?;
        if !store.person_exists(person).map_err(store_err)? {
            return Err(ServiceError::PersonNotFound(person));
        }

        let mut janitor = Janitor::new(self.janitor_config.clone());
        let report = janitor.repair_network(&mut *store, person)?;
        if report.promoted + report.backfilled > 0 {
            debug!(%person, promoted = report.promoted, backfilled = report.backfilled, "Network repaired on read");
        }

        let members = collect_network(&*store, person).map_err(store_err)?;
        let ids: Vec<PersonId> = members.iter().copied().collect();
        let genders = store.genders_of(&ids).map_err(store_err)?;

        let mut edges = Vec::new();
        for &member in &members {
            edges.extend(
                store
                    .confirmed_edges_from(member)
                    .map_err(store_err)?
                    .into_iter()
                    .filter(|e| members.contains(&e.other_id)),
            );
        }
        edges.sort_by_key(|e| e.id);

        let nodes = ids
            .into_iter()
            .map(|id| NetworkNode {
                id,
                gender: genders.get(&id).copied().unwrap_or_default(),
            })
            .collect();
        Ok(NetworkView {
            origin: person,
            nodes,
            edges,
        })
    }

    /// Confirmed edges owned by `person`, manual and inferred
    pub fn my_relations(&self, person: PersonId) -> Result<Vec<RelationEdge>> {
        self.lock()?.confirmed_edges_from(person).map_err(store_err)
    }

    /// Inferred edges owned by `person` still waiting for a decision
    pub fn pending_inferred(&self, person: PersonId) -> Result<Vec<RelationEdge>> {
        self.lock()?
            .query_edges(&EdgeQuery {
                owner: Some(person),
                origin: Some(Origin::Inferred),
                confirm_state: Some(ConfirmState::Pending),
                ..Default::default()
            })
            .map_err(store_err)
    }

    /// Applications addressed to `person`, newest first
    pub fn pending_applications(&self, person: PersonId) -> Result<Vec<RelationApply>> {
        self.lock()?.pending_applies_for(person).map_err(store_err)
    }

    /// Whether two people are related, have an open application, or neither
    pub fn relation_status(&self, a: PersonId, b: PersonId) -> Result<RelationStatus> {
        status_between(&*self.lock()?, a, b).map_err(store_err)
    }

    // --- Jobs ---

    /// Start a full re-inference of the network around `person`
    pub fn start_full_reinference(&self, person: PersonId) -> Result<JobId> {
        if !self.lock()?.person_exists(person).map_err(store_err)? {
            return Err(ServiceError::PersonNotFound(person));
        }
        Ok(Janitor::spawn_reinference(
            self.janitor_config.clone(),
            self.propagator.clone(),
            Arc::clone(&self.jobs),
            person,
        ))
    }

    /// Read a job started by `person`
    pub fn get_job_status(&self, person: PersonId, job_id: JobId) -> Result<InferenceJob> {
        let job = self
            .jobs
            .get(&job_id)
            .ok_or_else(|| ServiceError::NotFound(format!("job {}", job_id)))?;
        if job.owner_id != person {
            return Err(ServiceError::Forbidden(format!("job {} belongs to another person", job_id)));
        }
        Ok(job)
    }
}

fn status_between<S: RelationStore>(store: &S, a: PersonId, b: PersonId) -> std::result::Result<RelationStatus, S::Error> {
    if store.confirmed_edge(a, b)?.is_some() || store.confirmed_edge(b, a)?.is_some() {
        return Ok(RelationStatus::Related);
    }
    if store.pending_apply_between(a, b)?.is_some() {
        return Ok(RelationStatus::Pending);
    }
    Ok(RelationStatus::None)
}

fn pending_apply_for<S>(store: &S, person: PersonId, apply_id: ApplyId) -> Result<RelationApply>
where
    S: RelationStore,
    S::Error: Display,
{
    let apply = store
        .get_apply(apply_id)
        .map_err(store_err)?
        .ok_or_else(|| ServiceError::NotFound(format!("application {}", apply_id)))?;
    if apply.target_id != person {
        return Err(ServiceError::Forbidden(format!(
            "application {} is addressed to {}",
            apply_id, apply.target_id
        )));
    }
    if apply.status != ApplyStatus::Pending {
        return Err(ServiceError::InvalidState(format!(
            "application {} is {}",
            apply_id,
            apply.status.as_str()
        )));
    }
    Ok(apply)
}

fn owned_inferred_edge<S>(store: &S, person: PersonId, edge_id: EdgeId) -> Result<RelationEdge>
where
    S: RelationStore,
    S::Error: Display,
{
    let edge = store
        .get_edge(edge_id)
        .map_err(store_err)?
        .ok_or_else(|| ServiceError::NotFound(format!("edge {}", edge_id)))?;
    if edge.owner_id != person {
        return Err(ServiceError::Forbidden(format!("edge {} belongs to {}", edge_id, edge.owner_id)));
    }
    if edge.origin != Origin::Inferred {
        return Err(ServiceError::InvalidState(format!("edge {} is a manual relation", edge_id)));
    }
    Ok(edge)
}
