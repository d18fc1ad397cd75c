//! Integration tests for kinship-engine
//!
//! A three-generation family: grandfather 1, father 2, son 3, and in the
//! branching cases a second son 4 of the grandfather. Relations are stored in
//! SQLite and mirrored into the in-memory graph.

use kinship_domain::traits::RelationStore;
use kinship_domain::{Chain, ConfirmState, Gender, GraphEdge, NewEdge, Origin, PersonId, GENERIC_TERM};
use kinship_engine::{EngineConfig, PropagationMode, Propagator};
use kinship_graph::{GraphSubstrate, MemoryGraph};
use kinship_store::SqliteStore;
use std::sync::{Arc, Mutex};

fn chain(json: &str) -> Chain {
    Chain::decode(json).unwrap()
}

fn setup(father_gender: Gender) -> (Propagator<SqliteStore>, Arc<MemoryGraph>) {
    let mut store = SqliteStore::new(":memory:").unwrap();
    store.upsert_person(PersonId(1), Gender::Male, Some("grandfather")).unwrap();
    store.upsert_person(PersonId(2), father_gender, Some("parent")).unwrap();
    store.upsert_person(PersonId(3), Gender::Male, Some("son")).unwrap();

    let parent = if father_gender == Gender::Female { r#"["母"]"# } else { r#"["父"]"# };
    let parent_term = if father_gender == Gender::Female { "母亲" } else { "父亲" };
    for edge in [
        NewEdge::manual(PersonId(3), PersonId(2), parent_term, chain(parent)),
        NewEdge::manual(PersonId(2), PersonId(3), "儿子", chain(r#"["子"]"#)),
        NewEdge::manual(PersonId(2), PersonId(1), "父亲", chain(r#"["父"]"#)),
        NewEdge::manual(PersonId(1), PersonId(2), "儿子", chain(r#"["子"]"#)),
    ] {
        store.insert_edge(edge).unwrap();
    }

    let graph = Arc::new(MemoryGraph::new());
    let substrate: Arc<dyn GraphSubstrate> = graph.clone();
    let propagator = Propagator::new(Arc::new(Mutex::new(store)), Some(substrate), EngineConfig::default());
    (propagator, graph)
}

/// Grandfather 1 with sons 2 and 4; 3 is the son of 2. Parent edges only.
async fn setup_branching() -> (Propagator<SqliteStore>, Arc<MemoryGraph>) {
    let (propagator, graph) = setup(Gender::Male);
    propagator
        .with_store(|s| {
            s.upsert_person(PersonId(4), Gender::Male, Some("uncle"))?;
            s.insert_edge(NewEdge::manual(PersonId(4), PersonId(1), "父亲", chain(r#"["父"]"#)))?;
            s.insert_edge(NewEdge::manual(PersonId(1), PersonId(4), "儿子", chain(r#"["子"]"#)))?;
            Ok(())
        })
        .unwrap();
    sync_all(&propagator).await;
    propagator.sync_pair(PersonId(4), PersonId(1)).await;
    (propagator, graph)
}

async fn sync_all(propagator: &Propagator<SqliteStore>) {
    propagator.sync_pair(PersonId(3), PersonId(2)).await;
    propagator.sync_pair(PersonId(2), PersonId(1)).await;
}

fn term(propagator: &Propagator<SqliteStore>, owner: i64, other: i64) -> Option<String> {
    propagator
        .with_store(|s| s.confirmed_edge(PersonId(owner), PersonId(other)))
        .unwrap()
        .map(|e| e.kinship_term)
}

#[tokio::test]
async fn test_graph_mode_infers_grandparent() {
    let (propagator, graph) = setup(Gender::Male);
    sync_all(&propagator).await;
    assert_eq!(graph.edge_count(), 2);

    let report = propagator.propagate(PersonId(3), PersonId(2)).await.unwrap();
    assert_eq!(report.mode, PropagationMode::Graph);
    assert_eq!(report.written, 2);
    assert_eq!(term(&propagator, 3, 1).as_deref(), Some("爷爷"));
    assert_eq!(term(&propagator, 1, 3).as_deref(), Some("孙子"));
}

#[tokio::test]
async fn test_manual_edges_untouched() {
    let (propagator, _graph) = setup(Gender::Male);
    sync_all(&propagator).await;
    propagator.propagate(PersonId(3), PersonId(2)).await.unwrap();

    let rows = propagator
        .with_store(|s| s.edges_between(PersonId(3), PersonId(2)))
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].origin, Origin::Manual);
    assert_eq!(rows[0].kinship_term, "父亲");
}

#[tokio::test]
async fn test_unavailable_graph_falls_back() {
    let (propagator, graph) = setup(Gender::Male);
    sync_all(&propagator).await;
    graph.set_available(false);

    let report = propagator.propagate(PersonId(3), PersonId(2)).await.unwrap();
    assert_eq!(report.mode, PropagationMode::Fallback);
    assert_eq!(term(&propagator, 3, 1).as_deref(), Some("爷爷"));
    assert_eq!(term(&propagator, 1, 3).as_deref(), Some("孙子"));
}

#[tokio::test]
async fn test_store_genders_override_graph_genders() {
    let (propagator, graph) = setup(Gender::Female);
    // Stale edges claim the parent is male
    graph
        .upsert_edge(GraphEdge::parent_of(PersonId(2), PersonId(3), Gender::Male, Gender::Male))
        .await
        .unwrap();
    graph
        .upsert_edge(GraphEdge::parent_of(PersonId(1), PersonId(2), Gender::Male, Gender::Male))
        .await
        .unwrap();

    let written = propagator
        .resolve_pair(graph.as_ref(), PersonId(3), PersonId(1))
        .await
        .unwrap();
    assert_eq!(written, 2);
    assert_eq!(term(&propagator, 3, 1).as_deref(), Some("外公"));
    assert_eq!(term(&propagator, 1, 3).as_deref(), Some("外孙"));
}

#[tokio::test]
async fn test_rejected_edge_not_recreated() {
    let (propagator, _graph) = setup(Gender::Male);
    sync_all(&propagator).await;
    propagator
        .with_store(|s| {
            let mut tombstone = NewEdge::inferred(PersonId(3), PersonId(1), "爷爷", chain(r#"["父","父"]"#));
            tombstone.confirm_state = ConfirmState::Rejected;
            s.insert_edge(tombstone)
        })
        .unwrap();

    let report = propagator.propagate(PersonId(3), PersonId(2)).await.unwrap();
    assert_eq!(report.written, 1);
    assert_eq!(term(&propagator, 3, 1), None);
    assert_eq!(term(&propagator, 1, 3).as_deref(), Some("孙子"));
}

#[tokio::test]
async fn test_pending_edge_upgraded_in_place() {
    let (propagator, _graph) = setup(Gender::Male);
    sync_all(&propagator).await;
    propagator
        .with_store(|s| {
            let mut pending = NewEdge::inferred(PersonId(3), PersonId(1), "亲属", Chain::empty());
            pending.confirm_state = ConfirmState::Pending;
            s.insert_edge(pending)
        })
        .unwrap();

    propagator.propagate(PersonId(3), PersonId(2)).await.unwrap();

    let rows = propagator
        .with_store(|s| s.edges_between(PersonId(3), PersonId(1)))
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].confirm_state, ConfirmState::Confirmed);
    assert_eq!(rows[0].kinship_term, "爷爷");
}

#[tokio::test]
async fn test_on_edge_confirmed_syncs_then_propagates() {
    let (propagator, graph) = setup(Gender::Male);

    propagator.on_edge_confirmed(PersonId(3), PersonId(2)).await.unwrap();
    assert_eq!(graph.edge_count(), 1);
    assert_eq!(term(&propagator, 3, 1), None);

    propagator.on_edge_confirmed(PersonId(2), PersonId(1)).await.unwrap();
    assert_eq!(graph.edge_count(), 2);
    assert_eq!(term(&propagator, 3, 1).as_deref(), Some("爷爷"));
}

#[tokio::test]
async fn test_unsync_pair_removes_graph_edges() {
    let (propagator, graph) = setup(Gender::Male);
    sync_all(&propagator).await;

    propagator.unsync_pair(PersonId(2), PersonId(3)).await;
    assert_eq!(graph.edge_count(), 1);
}

#[tokio::test]
async fn test_generic_direction_written_with_specific_reverse() {
    let (propagator, graph) = setup_branching().await;
    assert_eq!(graph.edge_count(), 3);

    // Uncle to nephew runs up, down, down and has no specific term
    let written = propagator
        .resolve_pair(graph.as_ref(), PersonId(4), PersonId(3))
        .await
        .unwrap();
    assert_eq!(written, 2);
    assert_eq!(term(&propagator, 3, 4).as_deref(), Some("叔/伯"));

    let uncle_side = propagator
        .with_store(|s| s.confirmed_edge(PersonId(4), PersonId(3)))
        .unwrap()
        .unwrap();
    assert_eq!(uncle_side.kinship_term, GENERIC_TERM);
    assert_eq!(uncle_side.origin, Origin::Inferred);
    assert_eq!(uncle_side.chain.key(), "父,子,子");
}

#[tokio::test]
async fn test_branching_family_reaches_both_sides() {
    let (propagator, _graph) = setup_branching().await;

    let report = propagator.propagate(PersonId(4), PersonId(1)).await.unwrap();
    assert_eq!(report.mode, PropagationMode::Graph);

    let uncle_relations: Vec<PersonId> = propagator
        .with_store(|s| s.confirmed_edges_from(PersonId(4)))
        .unwrap()
        .into_iter()
        .map(|e| e.other_id)
        .collect();
    assert!(uncle_relations.contains(&PersonId(3)));
    assert_eq!(term(&propagator, 3, 4).as_deref(), Some("叔/伯"));
}
