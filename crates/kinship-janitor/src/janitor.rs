//! Network repair and full re-inference

use crate::{JanitorConfig, JanitorError, JanitorMetrics, RepairAction};
use kinship_domain::traits::{EdgeQuery, RelationStore};
use kinship_domain::vocabulary::reverse_term;
use kinship_domain::{
    is_generic, resolve, reverse, Chain, ConfirmState, GenderMap, InferenceJob, JobId, JobStore, NewEdge, Origin,
    PersonId, ReinferSummary, RelationEdge,
};
use kinship_engine::Propagator;
use std::collections::{BTreeSet, VecDeque};
use std::fmt::Display;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info};

fn store_err<E: Display>(e: E) -> JanitorError {
    JanitorError::Store(e.to_string())
}

/// Everyone reachable from `origin` over confirmed edges in either
/// direction, `origin` included
pub fn collect_network<S: RelationStore>(store: &S, origin: PersonId) -> Result<BTreeSet<PersonId>, S::Error> {
    let mut network = BTreeSet::from([origin]);
    let mut queue = VecDeque::from([origin]);
    while let Some(person) = queue.pop_front() {
        let edges = store.query_edges(&EdgeQuery {
            involving: Some(person),
            confirm_state: Some(ConfirmState::Confirmed),
            ..Default::default()
        })?;
        for edge in edges {
            let next = if edge.owner_id == person { edge.other_id } else { edge.owner_id };
            if network.insert(next) {
                queue.push_back(next);
            }
        }
    }
    Ok(network)
}

/// Confirmed manual relations inside the network, one per unordered pair
fn manual_pairs<S: RelationStore>(
    store: &S,
    network: &BTreeSet<PersonId>,
) -> Result<Vec<(PersonId, PersonId)>, S::Error> {
    let mut pairs = BTreeSet::new();
    for &person in network {
        let edges = store.query_edges(&EdgeQuery {
            owner: Some(person),
            origin: Some(Origin::Manual),
            confirm_state: Some(ConfirmState::Confirmed),
            ..Default::default()
        })?;
        for edge in edges.iter().filter(|e| network.contains(&e.other_id)) {
            pairs.insert((edge.owner_id.min(edge.other_id), edge.owner_id.max(edge.other_id)));
        }
    }
    Ok(pairs.into_iter().collect())
}

fn inferred_rows<S: RelationStore>(
    store: &S,
    network: &BTreeSet<PersonId>,
    state: ConfirmState,
) -> Result<Vec<RelationEdge>, S::Error> {
    let mut rows = Vec::new();
    for &person in network {
        let edges = store.query_edges(&EdgeQuery {
            owner: Some(person),
            origin: Some(Origin::Inferred),
            confirm_state: Some(state),
            ..Default::default()
        })?;
        rows.extend(edges.into_iter().filter(|e| network.contains(&e.other_id)));
    }
    Ok(rows)
}

/// Reverse row for an inferred edge whose counterpart is missing.
///
/// Prefers reversing the stored chain; falls back to the term table when the
/// chain is missing or reverses to the generic term.
fn reverse_edge(edge: &RelationEdge, genders: &GenderMap) -> Option<NewEdge> {
    let gender = |id: PersonId| genders.get(&id).copied().unwrap_or_default();
    let owner_gender = gender(edge.owner_id);

    let from_chain = (!edge.chain.is_empty())
        .then(|| {
            let chain = reverse(&edge.chain, owner_gender, gender(edge.other_id));
            (resolve(&chain), chain)
        })
        .filter(|(term, _)| !is_generic(term));
    let (term, chain) = match from_chain {
        Some(found) => found,
        None => (reverse_term(&edge.kinship_term, owner_gender), Chain::empty()),
    };
    if is_generic(&term) {
        return None;
    }
    Some(NewEdge::inferred(edge.other_id, edge.owner_id, term, chain))
}

fn advance(jobs: &dyn JobStore, job: &mut InferenceJob, percent: u8, message: String) {
    debug!(job_id = %job.job_id, percent, %message, "Re-inference progress");
    job.progress(percent, message);
    jobs.put(job.clone());
}

/// Counts from one stale-record repair
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepairReport {
    /// People in the repaired network
    pub network_size: usize,
    /// Pending inferred rows confirmed
    pub promoted: usize,
    /// Reverse rows inserted
    pub backfilled: usize,
}

/// Janitor service for network repair and re-inference
///
/// Responsible for:
/// - Confirming pending inferred rows left by older code paths
/// - Completing half-written inferred pairs
/// - Rebuilding every inferred row of a network on request
///
/// # Examples
///
/// ```no_run
/// use kinship_domain::PersonId;
/// use kinship_janitor::Janitor;
/// use kinship_store::SqliteStore;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let mut store = SqliteStore::new("kinship.db")?;
/// let mut janitor = Janitor::default_config();
///
/// let report = janitor.repair_network(&mut store, PersonId(1))?;
/// println!("{} promoted, {} backfilled", report.promoted, report.backfilled);
/// # Ok(())
/// # }
/// ```
pub struct Janitor {
    config: JanitorConfig,
    metrics: JanitorMetrics,
}

impl Janitor {
    /// Create a new Janitor with the given configuration
    pub fn new(config: JanitorConfig) -> Self {
        Self {
            config,
            metrics: JanitorMetrics::new(),
        }
    }

    /// Create a Janitor with default configuration
    pub fn default_config() -> Self {
        Self::new(JanitorConfig::default())
    }

    /// Current configuration
    pub fn config(&self) -> &JanitorConfig {
        &self.config
    }

    /// Get a reference to the current metrics
    pub fn metrics(&self) -> &JanitorMetrics {
        &self.metrics
    }

    /// Reset metrics counters
    pub fn reset_metrics(&mut self) {
        self.metrics.reset();
    }

    /// Repair every network in the store once
    ///
    /// Networks are visited in ascending order of their lowest edge owner;
    /// each person is repaired at most once per sweep.
    pub fn sweep<S>(&mut self, store: &mut S) -> Result<JanitorMetrics, JanitorError>
    where
        S: RelationStore,
        S::Error: Display,
    {
        let start = Instant::now();
        let owners = store.edge_owners().map_err(store_err)?;

        let mut visited = BTreeSet::new();
        for owner in owners {
            if visited.contains(&owner) {
                continue;
            }
            let network = collect_network(store, owner).map_err(store_err)?;
            self.repair_members(store, &network)?;
            visited.extend(network);
        }

        self.metrics.record_sweep();
        self.metrics.total_runtime_ms += start.elapsed().as_millis() as u64;
        Ok(self.metrics.clone())
    }

    /// Repair the network around `origin`
    pub fn repair_network<S>(&mut self, store: &mut S, origin: PersonId) -> Result<RepairReport, JanitorError>
    where
        S: RelationStore,
        S::Error: Display,
    {
        let start = Instant::now();
        let network = collect_network(store, origin).map_err(store_err)?;
        let report = self.repair_members(store, &network)?;
        self.metrics.total_runtime_ms += start.elapsed().as_millis() as u64;
        Ok(report)
    }

    fn repair_members<S>(&mut self, store: &mut S, network: &BTreeSet<PersonId>) -> Result<RepairReport, JanitorError>
    where
        S: RelationStore,
        S::Error: Display,
    {
        let mut report = RepairReport {
            network_size: network.len(),
            ..Default::default()
        };
        if self.config.auto_promote {
            report.promoted = self.promote_pending(store, network)?;
        }
        if self.config.auto_backfill {
            report.backfilled = self.backfill_reverses(store, network)?;
        }
        self.metrics.record_network();

        if report.promoted + report.backfilled > 0 {
            info!(
                network_size = report.network_size,
                promoted = report.promoted,
                backfilled = report.backfilled,
                "Network repaired"
            );
        }
        Ok(report)
    }

    /// Confirm pending inferred rows whose endpoints are both in the network
    fn promote_pending<S>(&mut self, store: &mut S, network: &BTreeSet<PersonId>) -> Result<usize, JanitorError>
    where
        S: RelationStore,
        S::Error: Display,
    {
        let pending = inferred_rows(store, network, ConfirmState::Pending).map_err(store_err)?;
        if self.config.dry_run {
            if !pending.is_empty() {
                info!("DRY RUN: Would confirm {} pending inferred edges", pending.len());
            }
            return Ok(0);
        }

        for edge in &pending {
            store
                .set_confirm_state(edge.id, ConfirmState::Confirmed)
                .map_err(store_err)?;
            debug!(edge_id = %edge.id, owner = %edge.owner_id, other = %edge.other_id, "Pending edge promoted");
        }
        self.metrics.record(RepairAction::Promoted, pending.len());
        Ok(pending.len())
    }

    /// Insert the missing reverse of confirmed inferred rows
    fn backfill_reverses<S>(&mut self, store: &mut S, network: &BTreeSet<PersonId>) -> Result<usize, JanitorError>
    where
        S: RelationStore,
        S::Error: Display,
    {
        let members: Vec<PersonId> = network.iter().copied().collect();
        let genders = store.genders_of(&members).map_err(store_err)?;
        let confirmed = inferred_rows(store, network, ConfirmState::Confirmed).map_err(store_err)?;

        let mut backfilled = 0;
        for edge in confirmed {
            // Any row at all, tombstones included, counts as a reverse
            if !store
                .edges_between(edge.other_id, edge.owner_id)
                .map_err(store_err)?
                .is_empty()
            {
                continue;
            }
            let Some(back) = reverse_edge(&edge, &genders) else {
                debug!(edge_id = %edge.id, term = %edge.kinship_term, "No reverse term for edge");
                continue;
            };
            if self.config.dry_run {
                info!(
                    "DRY RUN: Would insert {} -> {} ({})",
                    back.owner_id, back.other_id, back.kinship_term
                );
                continue;
            }
            let (owner, other, term) = (back.owner_id, back.other_id, back.kinship_term.clone());
            if store.upsert_inferred(back).map_err(store_err)?.wrote() {
                info!(%owner, %other, %term, "Missing reverse edge restored");
                backfilled += 1;
            }
        }
        self.metrics.record(RepairAction::Backfilled, backfilled);
        Ok(backfilled)
    }

    /// Rebuild every inferred row in the job owner's network.
    ///
    /// Stages: collect the network (10%), gather manual relations (30%),
    /// delete inferred rows (50%), refresh graph edges (60%), replay each
    /// manual relation in order (up to 95%). The job record is written
    /// after every stage; the caller marks it finished.
    pub async fn reinfer<S>(
        &mut self,
        propagator: &Propagator<S>,
        jobs: &dyn JobStore,
        job: &mut InferenceJob,
    ) -> Result<ReinferSummary, JanitorError>
    where
        S: RelationStore + Send + 'static,
        S::Error: Display,
    {
        let start = Instant::now();
        let origin = job.owner_id;

        let network = propagator.with_store(|s| collect_network(s, origin))?;
        advance(jobs, job, 10, format!("collected network of {} people", network.len()));

        let pairs = propagator.with_store(|s| manual_pairs(s, &network))?;
        advance(jobs, job, 30, format!("{} manual relations to replay", pairs.len()));

        let deleted = propagator.with_store(|s| s.delete_inferred_among(&network))?;
        self.metrics.record(RepairAction::Deleted, deleted);
        advance(jobs, job, 50, format!("removed {} inferred relations", deleted));

        if propagator.available_graph().await.is_some() {
            for &(a, b) in &pairs {
                propagator.unsync_pair(a, b).await;
                propagator.sync_pair(a, b).await;
            }
        }
        advance(jobs, job, 60, "graph refreshed".to_string());

        for (i, &(a, b)) in pairs.iter().enumerate() {
            propagator.propagate(a, b).await?;
            self.metrics.record(RepairAction::Repropagated, 1);
            let percent = (60 + 35 * (i + 1) / pairs.len()).min(95) as u8;
            advance(jobs, job, percent, format!("replayed {}/{} relations", i + 1, pairs.len()));
        }

        let inferred_after =
            propagator.with_store(|s| inferred_rows(s, &network, ConfirmState::Confirmed).map(|rows| rows.len()))?;
        self.metrics.record_network();
        self.metrics.total_runtime_ms += start.elapsed().as_millis() as u64;

        Ok(ReinferSummary {
            network_size: network.len(),
            manual_edges: pairs.len(),
            deleted_inferred: deleted,
            inferred_after,
        })
    }

    /// Start [`Janitor::reinfer`] for `owner` on a spawned task.
    ///
    /// Returns the job id immediately; progress and the final summary are
    /// read from `jobs`.
    pub fn spawn_reinference<S>(
        config: JanitorConfig,
        propagator: Propagator<S>,
        jobs: Arc<dyn JobStore>,
        owner: PersonId,
    ) -> JobId
    where
        S: RelationStore + Send + 'static,
        S::Error: Display,
    {
        let mut job = InferenceJob::start(owner);
        let job_id = job.job_id;
        jobs.put(job.clone());
        info!(%job_id, %owner, "Full re-inference started");

        tokio::spawn(async move {
            let mut janitor = Janitor::new(config);
            match janitor.reinfer(&propagator, jobs.as_ref(), &mut job).await {
                Ok(summary) => {
                    info!(
                        %job_id,
                        network_size = summary.network_size,
                        inferred_after = summary.inferred_after,
                        "Full re-inference finished"
                    );
                    job.finish(summary);
                }
                Err(e) => {
                    error!(%job_id, error = %e, "Full re-inference failed");
                    job.fail(e.to_string());
                }
            }
            jobs.put(job);
            debug!("{}", janitor.metrics().summary());
        });
        job_id
    }
}
