//! Diffusing a confirmed relation through the family network

use crate::{EngineConfig, EngineError};
use kinship_domain::path::best_match;
use kinship_domain::traits::RelationStore;
use kinship_domain::{
    compose, is_generic, resolve, reverse, ConfirmState, GraphEdge, NewEdge, PersonId, RelationEdge,
    UpsertOutcome,
};
use kinship_graph::{structural_edge, GraphSubstrate};
use std::collections::BTreeSet;
use std::fmt::Display;
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Which algorithm settled a propagation run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropagationMode {
    /// Paths from the graph substrate
    Graph,
    /// Chain composition over stored edges
    Fallback,
}

/// Outcome of one propagation run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropagationReport {
    /// Algorithm used
    pub mode: PropagationMode,
    /// Inferred rows inserted or upgraded
    pub written: usize,
}

/// Propagation engine
///
/// Holds the shared store and an optional graph substrate. Store access is
/// synchronous and scoped: the lock is taken inside [`Propagator::with_store`]
/// and released before any substrate call is awaited.
///
/// # Examples
///
/// ```no_run
/// use kinship_domain::PersonId;
/// use kinship_engine::{EngineConfig, Propagator};
/// use kinship_store::SqliteStore;
/// use std::sync::{Arc, Mutex};
///
/// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
/// let store = Arc::new(Mutex::new(SqliteStore::new("kinship.db")?));
/// let propagator = Propagator::new(store, None, EngineConfig::default());
///
/// let report = propagator.propagate(PersonId(1), PersonId(2)).await?;
/// println!("{} edges written", report.written);
/// # Ok(())
/// # }
/// ```
pub struct Propagator<S> {
    store: Arc<Mutex<S>>,
    graph: Option<Arc<dyn GraphSubstrate>>,
    config: EngineConfig,
}

impl<S> Clone for Propagator<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            graph: self.graph.clone(),
            config: self.config.clone(),
        }
    }
}

impl<S> Propagator<S>
where
    S: RelationStore + Send + 'static,
    S::Error: Display,
{
    /// Create a propagator; `graph: None` runs composition only
    pub fn new(store: Arc<Mutex<S>>, graph: Option<Arc<dyn GraphSubstrate>>, config: EngineConfig) -> Self {
        Self { store, graph, config }
    }

    /// Shared store handle
    pub fn store(&self) -> &Arc<Mutex<S>> {
        &self.store
    }

    /// Configured substrate, available or not
    pub fn graph(&self) -> Option<&Arc<dyn GraphSubstrate>> {
        self.graph.as_ref()
    }

    /// Engine configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Run `f` under the store lock, mapping store errors
    pub fn with_store<T>(&self, f: impl FnOnce(&mut S) -> Result<T, S::Error>) -> Result<T, EngineError> {
        let mut store = self.store.lock().map_err(|_| EngineError::LockPoisoned)?;
        f(&mut store).map_err(|e| EngineError::Store(e.to_string()))
    }

    /// The substrate, if configured and currently serving
    pub async fn available_graph(&self) -> Option<Arc<dyn GraphSubstrate>> {
        let graph = self.graph.as_ref()?;
        if graph.is_available().await {
            Some(Arc::clone(graph))
        } else {
            warn!("Graph substrate unavailable");
            None
        }
    }

    /// React to a newly confirmed relation between `a` and `b`.
    ///
    /// Mirrors the relation into the substrate, then propagates, on a spawned
    /// task. Failures are logged, never returned; the handle may be dropped.
    pub fn on_edge_confirmed(&self, a: PersonId, b: PersonId) -> JoinHandle<()> {
        let this = self.clone();
        tokio::spawn(async move {
            this.sync_pair(a, b).await;
            match this.propagate(a, b).await {
                Ok(report) => debug!(%a, %b, mode = ?report.mode, written = report.written, "Propagation finished"),
                Err(e) => error!(%a, %b, error = %e, "Propagation failed"),
            }
        })
    }

    /// Propagate from the relation between `a` and `b`, awaiting completion.
    ///
    /// Uses graph paths when the substrate serves; otherwise, or when any
    /// substrate call fails, composes stored chains instead.
    pub async fn propagate(&self, a: PersonId, b: PersonId) -> Result<PropagationReport, EngineError> {
        if let Some(graph) = self.available_graph().await {
            match self.propagate_via_graph(graph.as_ref(), a, b).await {
                Ok(written) => {
                    return Ok(PropagationReport {
                        mode: PropagationMode::Graph,
                        written,
                    })
                }
                Err(e) => warn!(%a, %b, error = %e, "Graph propagation failed, composing chains instead"),
            }
        }

        let written = self.fallback(a, b)?;
        Ok(PropagationReport {
            mode: PropagationMode::Fallback,
            written,
        })
    }

    async fn propagate_via_graph(
        &self,
        graph: &dyn GraphSubstrate,
        a: PersonId,
        b: PersonId,
    ) -> Result<usize, EngineError> {
        let mut written = self.resolve_pair(graph, a, b).await?;
        written += self.infer_from(graph, a, b).await?;
        written += self.infer_from(graph, b, a).await?;

        let radius = self.config.diffusion_radius;
        for c in graph.find_neighbors(b, radius).await? {
            if c == a || c == b {
                continue;
            }
            written += self.infer_from(graph, c, a).await?;
            written += self.infer_from(graph, a, c).await?;
        }
        for d in graph.find_neighbors(a, radius).await? {
            if d == a || d == b {
                continue;
            }
            written += self.infer_from(graph, d, b).await?;
            written += self.infer_from(graph, b, d).await?;
        }
        Ok(written)
    }

    /// Resolve `person` against everyone near `anchor`
    async fn infer_from(
        &self,
        graph: &dyn GraphSubstrate,
        person: PersonId,
        anchor: PersonId,
    ) -> Result<usize, EngineError> {
        let candidates = graph.find_neighbors(anchor, self.config.candidate_radius).await?;
        let mut written = 0;
        for candidate in candidates {
            if candidate == person || candidate == anchor {
                continue;
            }
            written += self.resolve_pair(graph, person, candidate).await?;
        }
        Ok(written)
    }

    /// Resolve both directions between `x` and `y` from graph paths.
    ///
    /// Both directions are written once either best term is specific; a
    /// direction whose own term is generic is stored under the generic term.
    /// Pairs already settled both ways (confirmed or rejected rows) are
    /// skipped before any path search.
    pub async fn resolve_pair(
        &self,
        graph: &dyn GraphSubstrate,
        x: PersonId,
        y: PersonId,
    ) -> Result<usize, EngineError> {
        if x == y {
            return Ok(0);
        }
        let settled = self.with_store(|s| Ok(is_settled(s, x, y)? && is_settled(s, y, x)?))?;
        if settled {
            debug!(%x, %y, "Pair already settled");
            return Ok(0);
        }

        let hops = self.config.path_hop_limit;
        let forward = graph.find_paths(x, y, hops).await?;
        if forward.is_empty() {
            debug!(%x, %y, "No path within hop limit");
            return Ok(0);
        }
        let backward = graph.find_paths(y, x, hops).await?;

        let mut people: BTreeSet<PersonId> = BTreeSet::from([x, y]);
        people.extend(forward.iter().flat_map(|p| p.node_sequence(x)));
        people.extend(backward.iter().flat_map(|p| p.node_sequence(y)));
        let people: Vec<PersonId> = people.into_iter().collect();

        self.with_store(|s| {
            let genders = s.genders_of(&people)?;
            let there = best_match(&forward, x, &genders).map(|best| NewEdge::inferred(x, y, best.term, best.chain));
            let back = best_match(&backward, y, &genders).map(|best| NewEdge::inferred(y, x, best.term, best.chain));
            write_pair(s, there, back)
        })
    }

    /// Compose stored chains around the relation between `a` and `b`.
    ///
    /// Needs a confirmed `a → b` row; does nothing otherwise.
    pub fn fallback(&self, a: PersonId, b: PersonId) -> Result<usize, EngineError> {
        self.with_store(|s| {
            let Some(a2b) = s.confirmed_edge(a, b)? else {
                debug!(%a, %b, "No confirmed edge to compose from");
                return Ok(0);
            };
            let b2a = s.confirmed_edge(b, a)?;

            let mut written = extend_through(s, &a2b)?;
            if let Some(b2a) = b2a {
                written += extend_through(s, &b2a)?;
            }
            Ok(written)
        })
    }

    /// Mirror the confirmed relation between `a` and `b` into the substrate.
    ///
    /// Best effort: only single-step chains are structural, and failures are
    /// logged.
    pub async fn sync_pair(&self, a: PersonId, b: PersonId) {
        let Some(graph) = self.available_graph().await else {
            return;
        };
        let edge = match self.structural_between(a, b) {
            Ok(Some(edge)) => edge,
            Ok(None) => {
                debug!(%a, %b, "Relation is not structural, graph untouched");
                return;
            }
            Err(e) => {
                warn!(%a, %b, error = %e, "Could not read relation for graph sync");
                return;
            }
        };
        if let Err(e) = graph.upsert_edge(edge).await {
            warn!(%a, %b, error = %e, "Graph sync failed");
        }
    }

    /// Drop every substrate edge between `a` and `b`; best effort
    pub async fn unsync_pair(&self, a: PersonId, b: PersonId) {
        let Some(graph) = self.available_graph().await else {
            return;
        };
        match graph.delete_edges(a, b).await {
            Ok(removed) => debug!(%a, %b, removed, "Graph edges removed"),
            Err(e) => warn!(%a, %b, error = %e, "Graph edge removal failed"),
        }
    }

    fn structural_between(&self, a: PersonId, b: PersonId) -> Result<Option<GraphEdge>, EngineError> {
        self.with_store(|s| {
            let genders = s.genders_of(&[a, b])?;
            let gender = |id: PersonId| genders.get(&id).copied().unwrap_or_default();
            for (owner, other) in [(a, b), (b, a)] {
                if let Some(edge) = s.confirmed_edge(owner, other)? {
                    if let Some(structural) =
                        structural_edge(&edge.chain, owner, other, gender(owner), gender(other))
                    {
                        return Ok(Some(structural));
                    }
                }
            }
            Ok(None)
        })
    }
}

/// Confirmed or rejected row from `owner` to `other`
fn is_settled<S: RelationStore>(store: &S, owner: PersonId, other: PersonId) -> Result<bool, S::Error> {
    Ok(store
        .edges_between(owner, other)?
        .iter()
        .any(|e| e.confirm_state != ConfirmState::Pending))
}

/// Write both directions of a pair unless neither term is specific
fn write_pair<S: RelationStore>(
    store: &mut S,
    there: Option<NewEdge>,
    back: Option<NewEdge>,
) -> Result<usize, S::Error> {
    let specific = there
        .iter()
        .chain(back.iter())
        .any(|edge| !is_generic(&edge.kinship_term));
    if !specific {
        if let Some(edge) = there.as_ref().or(back.as_ref()) {
            debug!(owner = %edge.owner_id, other = %edge.other_id, "Only the generic term resolves, nothing written");
        }
        return Ok(0);
    }

    let mut written = 0;
    for edge in there.into_iter().chain(back) {
        written += write_inferred(store, edge)?;
    }
    Ok(written)
}

/// Compose `a2b` with every confirmed edge out of B and write both directions
fn extend_through<S: RelationStore>(store: &mut S, a2b: &RelationEdge) -> Result<usize, S::Error> {
    let (a, b) = (a2b.owner_id, a2b.other_id);
    let a_gender = store.gender_of(a)?;
    let mut written = 0;

    for b2c in store.confirmed_edges_from(b)? {
        let c = b2c.other_id;
        if c == a {
            continue;
        }
        let Some(composed) = compose(&a2b.chain, &b2c.chain) else {
            debug!(%a, %b, %c, "Composition refused");
            continue;
        };
        let c_gender = store.gender_of(c)?;
        let a2c = composed.with_target_gender(c_gender);
        let c2a = reverse(&a2c, a_gender, c_gender);
        let (term, back_term) = (resolve(&a2c), resolve(&c2a));

        written += write_pair(
            store,
            Some(NewEdge::inferred(a, c, term, a2c)),
            Some(NewEdge::inferred(c, a, back_term, c2a)),
        )?;
    }
    Ok(written)
}

fn write_inferred<S: RelationStore>(store: &mut S, edge: NewEdge) -> Result<usize, S::Error> {
    let (owner, other) = (edge.owner_id, edge.other_id);
    let term = edge.kinship_term.clone();
    let outcome = store.upsert_inferred(edge)?;
    match outcome {
        UpsertOutcome::Inserted(id) => info!(%owner, %other, %term, edge_id = %id, "Inferred edge written"),
        UpsertOutcome::Upgraded(id) => info!(%owner, %other, %term, edge_id = %id, "Pending inferred edge confirmed"),
        UpsertOutcome::Skipped => debug!(%owner, %other, "Pair already covered"),
    }
    Ok(usize::from(outcome.wrote()))
}
