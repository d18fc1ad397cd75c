//! Integration tests for kinship-store
//!
//! These tests verify edge, application and directory operations against a
//! real SQLite database.

use kinship_domain::traits::{EdgeQuery, RelationStore};
use kinship_domain::{
    ApplyStatus, Chain, ConfirmState, Gender, NewApply, NewEdge, Origin, PersonId, UpsertOutcome,
};
use kinship_store::{SqliteStore, StoreError};
use std::collections::BTreeSet;

fn chain(json: &str) -> Chain {
    Chain::decode(json).unwrap()
}

fn store_with_people() -> SqliteStore {
    let mut store = SqliteStore::new(":memory:").unwrap();
    store.upsert_person(PersonId(1), Gender::Male, Some("Wei")).unwrap();
    store.upsert_person(PersonId(2), Gender::Female, Some("Lan")).unwrap();
    store.upsert_person(PersonId(3), Gender::Male, None).unwrap();
    store
}

#[test]
fn test_store_initialization() {
    let store = SqliteStore::new(":memory:");
    assert!(store.is_ok(), "Store should initialize successfully");
}

#[test]
fn test_insert_and_get_edge() {
    let mut store = store_with_people();
    let id = store
        .insert_edge(NewEdge::manual(PersonId(1), PersonId(2), "母亲", chain(r#"["母"]"#)))
        .unwrap();

    let edge = store.get_edge(id).unwrap().expect("edge should exist");
    assert_eq!(edge.owner_id, PersonId(1));
    assert_eq!(edge.other_id, PersonId(2));
    assert_eq!(edge.kinship_term, "母亲");
    assert_eq!(edge.chain.key(), "母");
    assert_eq!(edge.origin, Origin::Manual);
    assert!(edge.is_confirmed());
    assert!(edge.confirmed_at.is_some());
}

#[test]
fn test_upsert_inferred_respects_manual_rows() {
    let mut store = store_with_people();
    store
        .insert_edge(NewEdge::manual(PersonId(1), PersonId(3), "父亲", chain(r#"["父"]"#)))
        .unwrap();

    let outcome = store
        .upsert_inferred(NewEdge::inferred(PersonId(1), PersonId(3), "叔叔", Chain::empty()))
        .unwrap();
    assert_eq!(outcome, UpsertOutcome::Skipped);

    let rows = store.edges_between(PersonId(1), PersonId(3)).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].kinship_term, "父亲");
}

#[test]
fn test_upsert_inferred_insert_then_skip() {
    let mut store = store_with_people();
    let first = store
        .upsert_inferred(NewEdge::inferred(PersonId(2), PersonId(3), "儿子", chain(r#"["子"]"#)))
        .unwrap();
    assert!(matches!(first, UpsertOutcome::Inserted(_)));

    let second = store
        .upsert_inferred(NewEdge::inferred(PersonId(2), PersonId(3), "儿子", chain(r#"["子"]"#)))
        .unwrap();
    assert_eq!(second, UpsertOutcome::Skipped);
}

#[test]
fn test_upsert_inferred_upgrades_pending() {
    let mut store = store_with_people();
    let mut pending = NewEdge::inferred(PersonId(2), PersonId(3), "亲属", Chain::empty());
    pending.confirm_state = ConfirmState::Pending;
    let id = store.insert_edge(pending).unwrap();

    let outcome = store
        .upsert_inferred(NewEdge::inferred(PersonId(2), PersonId(3), "儿子", chain(r#"["子"]"#)))
        .unwrap();
    assert_eq!(outcome, UpsertOutcome::Upgraded(id));

    let edge = store.get_edge(id).unwrap().unwrap();
    assert!(edge.is_confirmed());
    assert_eq!(edge.kinship_term, "儿子");
}

#[test]
fn test_tombstone_blocks_inference() {
    let mut store = store_with_people();
    let id = store
        .insert_edge(NewEdge::inferred(PersonId(1), PersonId(2), "姐姐", Chain::empty()))
        .unwrap();
    store.set_confirm_state(id, ConfirmState::Rejected).unwrap();

    let outcome = store
        .upsert_inferred(NewEdge::inferred(PersonId(1), PersonId(2), "姐姐", Chain::empty()))
        .unwrap();
    assert_eq!(outcome, UpsertOutcome::Skipped);
    assert!(store.confirmed_edge(PersonId(1), PersonId(2)).unwrap().is_none());
}

#[test]
fn test_query_edges_filters() {
    let mut store = store_with_people();
    store
        .insert_edge(NewEdge::manual(PersonId(1), PersonId(2), "母亲", chain(r#"["母"]"#)))
        .unwrap();
    store
        .insert_edge(NewEdge::manual(PersonId(2), PersonId(1), "儿子", chain(r#"["子"]"#)))
        .unwrap();
    store
        .upsert_inferred(NewEdge::inferred(PersonId(3), PersonId(2), "奶奶", chain(r#"["父","母"]"#)))
        .unwrap();

    let from_one = store
        .query_edges(&EdgeQuery {
            owner: Some(PersonId(1)),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(from_one.len(), 1);

    let touching_two = store
        .query_edges(&EdgeQuery {
            involving: Some(PersonId(2)),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(touching_two.len(), 3);

    let inferred = store
        .query_edges(&EdgeQuery {
            origin: Some(Origin::Inferred),
            limit: Some(10),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(inferred.len(), 1);
    assert_eq!(inferred[0].kinship_term, "奶奶");

    assert_eq!(store.edge_owners().unwrap(), vec![PersonId(1), PersonId(2), PersonId(3)]);
}

#[test]
fn test_delete_between_both_directions() {
    let mut store = store_with_people();
    store
        .insert_edge(NewEdge::manual(PersonId(1), PersonId(2), "母亲", chain(r#"["母"]"#)))
        .unwrap();
    store
        .insert_edge(NewEdge::manual(PersonId(2), PersonId(1), "儿子", chain(r#"["子"]"#)))
        .unwrap();
    store
        .insert_edge(NewEdge::inferred(PersonId(2), PersonId(1), "儿子", chain(r#"["子"]"#)))
        .unwrap();
    store
        .insert_edge(NewEdge::manual(PersonId(1), PersonId(3), "父亲", chain(r#"["父"]"#)))
        .unwrap();

    assert_eq!(store.delete_between(PersonId(2), PersonId(1)).unwrap(), 3);
    assert!(store.edges_between(PersonId(1), PersonId(2)).unwrap().is_empty());
    assert_eq!(store.edges_between(PersonId(1), PersonId(3)).unwrap().len(), 1);
}

#[test]
fn test_delete_inferred_among_keeps_manual_and_outsiders() {
    let mut store = store_with_people();
    store
        .insert_edge(NewEdge::manual(PersonId(1), PersonId(2), "母亲", chain(r#"["母"]"#)))
        .unwrap();
    store
        .upsert_inferred(NewEdge::inferred(PersonId(1), PersonId(3), "兄/弟", Chain::empty()))
        .unwrap();
    store
        .upsert_inferred(NewEdge::inferred(PersonId(1), PersonId(9), "表兄弟", Chain::empty()))
        .unwrap();

    let network: BTreeSet<PersonId> = [PersonId(1), PersonId(2), PersonId(3)].into_iter().collect();
    assert_eq!(store.delete_inferred_among(&network).unwrap(), 1);
    assert_eq!(store.edges_between(PersonId(1), PersonId(2)).unwrap().len(), 1);
    assert_eq!(store.edges_between(PersonId(1), PersonId(9)).unwrap().len(), 1);
}

#[test]
fn test_application_lifecycle() {
    let mut store = store_with_people();
    let id = store
        .insert_apply(NewApply {
            applicant_id: PersonId(1),
            target_id: PersonId(2),
            proposed_chain: chain(r#"["母"]"#),
            proposed_term: "母亲".to_string(),
            note: Some("it's me".to_string()),
        })
        .unwrap();

    let pending = store.pending_apply_between(PersonId(2), PersonId(1)).unwrap();
    assert_eq!(pending.map(|a| a.id), Some(id));
    assert_eq!(store.pending_applies_for(PersonId(2)).unwrap().len(), 1);

    let (fwd, rev) = store
        .accept_apply(
            id,
            NewEdge::manual(PersonId(1), PersonId(2), "母亲", chain(r#"["母"]"#)),
            NewEdge::manual(PersonId(2), PersonId(1), "儿子", chain(r#"["子"]"#)),
        )
        .unwrap();
    assert_ne!(fwd, rev);

    let apply = store.get_apply(id).unwrap().unwrap();
    assert_eq!(apply.status, ApplyStatus::Accepted);
    assert!(apply.handled_at.is_some());
    assert!(store.pending_apply_between(PersonId(1), PersonId(2)).unwrap().is_none());

    // A handled application cannot be accepted twice
    let again = store.accept_apply(
        id,
        NewEdge::manual(PersonId(1), PersonId(2), "母亲", chain(r#"["母"]"#)),
        NewEdge::manual(PersonId(2), PersonId(1), "儿子", chain(r#"["子"]"#)),
    );
    assert!(matches!(again, Err(StoreError::InvalidData(_))));
}

#[test]
fn test_accept_replaces_inferred_rows() {
    let mut store = store_with_people();
    store
        .upsert_inferred(NewEdge::inferred(PersonId(1), PersonId(3), "兄/弟", Chain::empty()))
        .unwrap();
    let id = store
        .insert_apply(NewApply {
            applicant_id: PersonId(1),
            target_id: PersonId(3),
            proposed_chain: chain(r#"["哥"]"#),
            proposed_term: "哥哥".to_string(),
            note: None,
        })
        .unwrap();
    store
        .accept_apply(
            id,
            NewEdge::manual(PersonId(1), PersonId(3), "哥哥", chain(r#"["哥"]"#)),
            NewEdge::manual(PersonId(3), PersonId(1), "弟弟", chain(r#"["弟"]"#)),
        )
        .unwrap();

    let rows = store.edges_between(PersonId(1), PersonId(3)).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].origin, Origin::Manual);
}

#[test]
fn test_reject_application() {
    let mut store = store_with_people();
    let id = store
        .insert_apply(NewApply {
            applicant_id: PersonId(3),
            target_id: PersonId(2),
            proposed_chain: chain(r#"["配偶"]"#),
            proposed_term: "配偶".to_string(),
            note: None,
        })
        .unwrap();
    store.reject_apply(id, Some("not me")).unwrap();

    let apply = store.get_apply(id).unwrap().unwrap();
    assert_eq!(apply.status, ApplyStatus::Rejected);
    assert_eq!(apply.reject_reason.as_deref(), Some("not me"));
    assert!(matches!(store.reject_apply(id, None), Err(StoreError::NotFound(_))));
}

#[test]
fn test_person_directory() {
    let mut store = store_with_people();
    assert!(store.person_exists(PersonId(1)).unwrap());
    assert!(!store.person_exists(PersonId(42)).unwrap());
    assert_eq!(store.gender_of(PersonId(2)).unwrap(), Gender::Female);
    assert_eq!(store.gender_of(PersonId(42)).unwrap(), Gender::Unknown);

    let genders = store.genders_of(&[PersonId(1), PersonId(2), PersonId(42)]).unwrap();
    assert_eq!(genders.len(), 2);
    assert_eq!(genders[&PersonId(1)], Gender::Male);

    store.deactivate_person(PersonId(3)).unwrap();
    assert!(!store.person_exists(PersonId(3)).unwrap());
}

#[test]
fn test_persistence_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("kinship.db");
    {
        let mut store = SqliteStore::new(&path).unwrap();
        store.upsert_person(PersonId(1), Gender::Male, None).unwrap();
        store
            .insert_edge(NewEdge::manual(PersonId(1), PersonId(2), "配偶", chain(r#"["配偶"]"#)))
            .unwrap();
    }

    let store = SqliteStore::new(&path).unwrap();
    assert!(store.person_exists(PersonId(1)).unwrap());
    assert_eq!(store.edges_between(PersonId(1), PersonId(2)).unwrap().len(), 1);
}
