//! Integration tests for kinship-janitor
//!
//! Family: grandfather 1, father 2, son 3, daughter 4. Only parent links are
//! manual; everything else is inferred.

use kinship_domain::traits::{EdgeQuery, RelationStore};
use kinship_domain::{
    Chain, ConfirmState, Gender, InferenceJob, JobStatus, JobStore, NewEdge, Origin, PersonId,
};
use kinship_engine::{EngineConfig, Propagator};
use kinship_graph::{GraphSubstrate, MemoryGraph};
use kinship_janitor::{Janitor, JanitorConfig, MemoryJobStore, RepairAction};
use kinship_store::SqliteStore;
use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

fn chain(json: &str) -> Chain {
    Chain::decode(json).unwrap()
}

fn family_store() -> SqliteStore {
    let mut store = SqliteStore::new(":memory:").unwrap();
    store.upsert_person(PersonId(1), Gender::Male, None).unwrap();
    store.upsert_person(PersonId(2), Gender::Male, None).unwrap();
    store.upsert_person(PersonId(3), Gender::Male, None).unwrap();
    store.upsert_person(PersonId(4), Gender::Female, None).unwrap();

    let manual = [
        (2, 1, "父亲", r#"["父"]"#),
        (1, 2, "儿子", r#"["子"]"#),
        (3, 2, "父亲", r#"["父"]"#),
        (2, 3, "儿子", r#"["子"]"#),
        (4, 2, "父亲", r#"["父"]"#),
        (2, 4, "女儿", r#"["女"]"#),
    ];
    for (owner, other, term, steps) in manual {
        store
            .insert_edge(NewEdge::manual(PersonId(owner), PersonId(other), term, chain(steps)))
            .unwrap();
    }
    store
}

fn propagator(with_graph: bool) -> Propagator<SqliteStore> {
    let graph: Option<Arc<dyn GraphSubstrate>> = if with_graph {
        Some(Arc::new(MemoryGraph::new()))
    } else {
        None
    };
    Propagator::new(Arc::new(Mutex::new(family_store())), graph, EngineConfig::default())
}

fn inferred_terms(propagator: &Propagator<SqliteStore>) -> BTreeSet<(i64, i64, String)> {
    propagator
        .with_store(|s| {
            s.query_edges(&EdgeQuery {
                origin: Some(Origin::Inferred),
                ..Default::default()
            })
        })
        .unwrap()
        .into_iter()
        .map(|e| (e.owner_id.value(), e.other_id.value(), e.kinship_term))
        .collect()
}

fn manual_rows(propagator: &Propagator<SqliteStore>) -> usize {
    propagator
        .with_store(|s| {
            s.query_edges(&EdgeQuery {
                origin: Some(Origin::Manual),
                ..Default::default()
            })
        })
        .unwrap()
        .len()
}

#[tokio::test]
async fn test_reinference_replaces_inferred_rows() {
    let propagator = propagator(true);
    propagator
        .with_store(|s| {
            s.insert_edge(NewEdge::inferred(PersonId(3), PersonId(4), "表姐", chain(r#"["姐"]"#)))?;
            let mut tombstone = NewEdge::inferred(PersonId(1), PersonId(3), "外孙", Chain::empty());
            tombstone.confirm_state = ConfirmState::Rejected;
            s.insert_edge(tombstone)
        })
        .unwrap();

    let jobs = MemoryJobStore::new(Duration::from_secs(60));
    let mut job = InferenceJob::start(PersonId(3));
    let mut janitor = Janitor::default_config();

    let summary = janitor.reinfer(&propagator, &jobs, &mut job).await.unwrap();
    assert_eq!(summary.network_size, 4);
    assert_eq!(summary.manual_edges, 3);
    assert_eq!(summary.deleted_inferred, 2);
    assert_eq!(summary.inferred_after, 6);
    assert_eq!(janitor.metrics().total(RepairAction::Repropagated), 3);

    let terms = inferred_terms(&propagator);
    assert!(terms.contains(&(3, 1, "爷爷".to_string())));
    assert!(terms.contains(&(1, 3, "孙子".to_string())));
    assert!(terms.contains(&(1, 4, "孙女".to_string())));
    assert!(terms.contains(&(3, 4, "姐/妹".to_string())));
    assert!(!terms.iter().any(|(_, _, term)| term == "表姐" || term == "外孙"));
    assert_eq!(manual_rows(&propagator), 6);

    // Progress was published along the way
    let published = jobs.get(&job.job_id).unwrap();
    assert!(published.percent >= 60);
    assert_eq!(published.status, JobStatus::Running);
}

#[tokio::test]
async fn test_reinference_is_idempotent() {
    let propagator = propagator(true);
    let jobs = MemoryJobStore::new(Duration::from_secs(60));
    let mut janitor = Janitor::default_config();

    let mut first = InferenceJob::start(PersonId(1));
    janitor.reinfer(&propagator, &jobs, &mut first).await.unwrap();
    let after_first = inferred_terms(&propagator);

    let mut second = InferenceJob::start(PersonId(1));
    let summary = janitor.reinfer(&propagator, &jobs, &mut second).await.unwrap();
    assert_eq!(summary.deleted_inferred, after_first.len());
    assert_eq!(inferred_terms(&propagator), after_first);
}

#[tokio::test]
async fn test_reinference_without_graph_composes_chains() {
    let propagator = propagator(false);
    let jobs = MemoryJobStore::new(Duration::from_secs(60));
    let mut job = InferenceJob::start(PersonId(2));

    Janitor::default_config()
        .reinfer(&propagator, &jobs, &mut job)
        .await
        .unwrap();

    let terms = inferred_terms(&propagator);
    assert!(terms.contains(&(3, 1, "爷爷".to_string())));
    assert!(terms.contains(&(1, 4, "孙女".to_string())));
    assert_eq!(manual_rows(&propagator), 6);
}

#[tokio::test]
async fn test_spawned_reinference_finishes_job() {
    let propagator = propagator(true);
    let jobs: Arc<dyn JobStore> = Arc::new(MemoryJobStore::new(Duration::from_secs(60)));

    let job_id = Janitor::spawn_reinference(JanitorConfig::default(), propagator, Arc::clone(&jobs), PersonId(4));

    let mut finished = None;
    for _ in 0..200 {
        if let Some(job) = jobs.get(&job_id).filter(InferenceJob::is_terminal) {
            finished = Some(job);
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    let job = finished.expect("job should finish");
    assert_eq!(job.status, JobStatus::Done);
    assert_eq!(job.percent, 100);
    assert_eq!(job.owner_id, PersonId(4));
    assert_eq!(job.result_summary.unwrap().manual_edges, 3);
}

#[test]
fn test_repair_promotes_and_backfills() {
    let mut store = family_store();
    let mut pending = NewEdge::inferred(PersonId(4), PersonId(1), "爷爷", chain(r#"["父","父"]"#));
    pending.confirm_state = ConfirmState::Pending;
    let pending_id = store.insert_edge(pending).unwrap();

    let mut janitor = Janitor::default_config();
    let report = janitor.repair_network(&mut store, PersonId(2)).unwrap();
    assert_eq!(report.network_size, 4);
    assert_eq!(report.promoted, 1);
    assert_eq!(report.backfilled, 1);

    assert_eq!(
        store.get_edge(pending_id).unwrap().unwrap().confirm_state,
        ConfirmState::Confirmed
    );
    let back = store.confirmed_edge(PersonId(1), PersonId(4)).unwrap().unwrap();
    assert_eq!(back.kinship_term, "孙女");
    assert_eq!(back.origin, Origin::Inferred);

    // Nothing left to do
    let again = janitor.repair_network(&mut store, PersonId(2)).unwrap();
    assert_eq!(again.promoted + again.backfilled, 0);
}

#[test]
fn test_sweep_covers_every_network() {
    let mut store = family_store();
    store.upsert_person(PersonId(10), Gender::Female, None).unwrap();
    store.upsert_person(PersonId(11), Gender::Female, None).unwrap();
    // A second, unconnected family with a half-written pair
    store
        .insert_edge(NewEdge::inferred(PersonId(10), PersonId(11), "女儿", chain(r#"["女"]"#)))
        .unwrap();

    let mut janitor = Janitor::default_config();
    let metrics = janitor.sweep(&mut store).unwrap();
    assert_eq!(metrics.sweep_count, 1);
    assert_eq!(metrics.networks_repaired, 2);
    assert_eq!(metrics.total(RepairAction::Backfilled), 1);

    let back = store.confirmed_edge(PersonId(11), PersonId(10)).unwrap().unwrap();
    assert_eq!(back.kinship_term, "母亲");
}
