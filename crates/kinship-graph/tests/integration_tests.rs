//! Integration tests for the in-memory graph substrate

use kinship_domain::path::resolve_best;
use kinship_domain::{Gender, GenderMap, GraphEdge, PersonId, Seniority};
use kinship_graph::{GraphError, GraphSubstrate, MemoryGraph};

fn p(id: i64) -> PersonId {
    PersonId(id)
}

/// Grandfather 1, father 2, mother 3, children 4 and 5, uncle 6
async fn family() -> MemoryGraph {
    let graph = MemoryGraph::new();
    graph.upsert_edge(GraphEdge::parent_of(p(1), p(2), Gender::Male, Gender::Male)).await.unwrap();
    graph.upsert_edge(GraphEdge::parent_of(p(1), p(6), Gender::Male, Gender::Male)).await.unwrap();
    graph.upsert_edge(GraphEdge::spouse_of(p(2), p(3))).await.unwrap();
    graph.upsert_edge(GraphEdge::parent_of(p(2), p(4), Gender::Male, Gender::Male)).await.unwrap();
    graph.upsert_edge(GraphEdge::parent_of(p(2), p(5), Gender::Male, Gender::Female)).await.unwrap();
    graph.upsert_edge(GraphEdge::sibling_of(p(4), p(5), Seniority::Older)).await.unwrap();
    graph
}

#[tokio::test]
async fn test_neighbors_bounded_by_hops() {
    let graph = family().await;

    let one = graph.find_neighbors(p(4), 1).await.unwrap();
    assert_eq!(one.into_iter().collect::<Vec<_>>(), vec![p(2), p(5)]);

    let two = graph.find_neighbors(p(4), 2).await.unwrap();
    assert_eq!(two.into_iter().collect::<Vec<_>>(), vec![p(1), p(2), p(3), p(5)]);

    let three = graph.find_neighbors(p(4), 3).await.unwrap();
    assert!(three.contains(&p(6)));
    assert!(!three.contains(&p(4)));
}

#[tokio::test]
async fn test_find_paths_are_simple_and_bounded() {
    let graph = family().await;

    let paths = graph.find_paths(p(4), p(5), 2).await.unwrap();
    // Direct sibling edge and the route through the father
    assert_eq!(paths.len(), 2);
    assert!(paths.iter().any(|path| path.len() == 1));

    let none = graph.find_paths(p(4), p(6), 2).await.unwrap();
    assert!(none.is_empty());

    let uncle = graph.find_paths(p(4), p(6), 3).await.unwrap();
    assert_eq!(uncle.len(), 1);
    assert_eq!(uncle[0].node_sequence(p(4)), vec![p(2), p(1), p(6)]);
}

#[tokio::test]
async fn test_paths_resolve_to_terms() {
    let graph = family().await;
    let genders: GenderMap = [
        (p(1), Gender::Male),
        (p(2), Gender::Male),
        (p(3), Gender::Female),
        (p(4), Gender::Male),
        (p(5), Gender::Female),
    ]
    .into_iter()
    .collect();

    let to_grandfather = graph.find_paths(p(4), p(1), 4).await.unwrap();
    assert_eq!(resolve_best(&to_grandfather, p(4), &genders).as_deref(), Some("爷爷"));

    let to_sister = graph.find_paths(p(4), p(5), 4).await.unwrap();
    assert_eq!(resolve_best(&to_sister, p(4), &genders).as_deref(), Some("妹妹"));
}

#[tokio::test]
async fn test_upsert_replaces_same_kind() {
    let graph = MemoryGraph::new();
    graph.upsert_edge(GraphEdge::sibling_of(p(1), p(2), Seniority::Older)).await.unwrap();
    graph.upsert_edge(GraphEdge::sibling_of(p(2), p(1), Seniority::Older)).await.unwrap();
    assert_eq!(graph.edge_count(), 1);

    let edges = graph.edges().unwrap();
    assert_eq!(edges[0].src, p(2));
}

#[tokio::test]
async fn test_delete_edges_between_pair() {
    let graph = family().await;
    let before = graph.edge_count();
    assert_eq!(graph.delete_edges(p(5), p(4)).await.unwrap(), 1);
    assert_eq!(graph.edge_count(), before - 1);
    assert_eq!(graph.delete_edges(p(5), p(4)).await.unwrap(), 0);
}

#[tokio::test]
async fn test_unavailable_graph_errors() {
    let graph = family().await;
    graph.set_available(false);

    assert!(!graph.is_available().await);
    assert_eq!(graph.find_neighbors(p(4), 2).await, Err(GraphError::Unavailable));
    assert_eq!(
        graph.upsert_edge(GraphEdge::spouse_of(p(7), p(8))).await,
        Err(GraphError::Unavailable)
    );

    graph.set_available(true);
    assert!(graph.find_paths(p(4), p(1), 4).await.is_ok());
}
