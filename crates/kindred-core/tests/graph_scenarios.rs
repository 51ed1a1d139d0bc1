//! End-to-end behaviour of the family graph through its public API.

use kindred_core::graph::{FamilyGraph, GraphError, has_cycle};
use kindred_core::model::{Biography, PersonId, RelationshipKind, Role};
use kindred_core::seed::initial_family;
use kindred_core::snapshot::Snapshot;

fn family(names: &[&str]) -> (FamilyGraph, Vec<PersonId>) {
    let mut graph = FamilyGraph::new();
    let ids = names
        .iter()
        .map(|name| {
            graph
                .add_person(Biography::named(*name))
                .expect("named person is valid")
                .id
        })
        .collect();
    (graph, ids)
}

#[test]
fn direct_cycle_is_rejected() {
    let (mut g, ids) = family(&["a", "b"]);
    g.connect(&ids[0], &ids[1], RelationshipKind::ParentChild)
        .expect("a parent of b");
    let err = g
        .connect(&ids[1], &ids[0], RelationshipKind::ParentChild)
        .expect_err("b parent of a closes a loop");
    assert!(matches!(err, GraphError::Cycle { .. }));
}

#[test]
fn transitive_cycle_is_rejected_with_path() {
    let (mut g, ids) = family(&["a", "b", "c"]);
    g.connect(&ids[0], &ids[1], RelationshipKind::ParentChild)
        .expect("a-b");
    g.connect(&ids[1], &ids[2], RelationshipKind::ParentChild)
        .expect("b-c");
    let err = g
        .connect(&ids[2], &ids[0], RelationshipKind::ParentChild)
        .expect_err("c-a closes a loop");
    let GraphError::Cycle { path, .. } = err else {
        panic!("expected cycle, got {err:?}");
    };
    assert_eq!(path, ids);
    assert!(!has_cycle(&g.snapshot()));
}

#[test]
fn spouse_uniqueness_ignores_direction() {
    let (mut g, ids) = family(&["a", "b"]);
    g.connect(&ids[0], &ids[1], RelationshipKind::Spouse)
        .expect("married");
    for (from, to) in [(&ids[0], &ids[1]), (&ids[1], &ids[0])] {
        let err = g
            .connect(from, to, RelationshipKind::Spouse)
            .expect_err("already married");
        assert!(matches!(err, GraphError::DuplicateRelationship { .. }));
    }
}

#[test]
fn siblings_may_be_connected_as_spouses() {
    let (mut g, ids) = family(&["A", "B", "C"]);
    g.connect(&ids[0], &ids[1], RelationshipKind::ParentChild)
        .expect("A-B");
    g.connect(&ids[0], &ids[2], RelationshipKind::ParentChild)
        .expect("A-C");
    g.connect(&ids[1], &ids[2], RelationshipKind::Spouse)
        .expect("not blocked by the graph model");
}

#[test]
fn removing_a_person_leaves_no_references() {
    let (mut g, ids) = family(&["a", "b", "c", "d"]);
    g.connect(&ids[0], &ids[1], RelationshipKind::ParentChild)
        .expect("a-b");
    g.connect(&ids[1], &ids[2], RelationshipKind::ParentChild)
        .expect("b-c");
    g.connect(&ids[3], &ids[1], RelationshipKind::Spouse)
        .expect("d-b");

    g.remove_person(&ids[1]).expect("b existed");
    assert!(g.relationships_of(&ids[1]).is_empty());
    assert!(g.relationships().iter().all(|r| !r.touches(&ids[1])));
    assert!(g.relationships_of(&ids[0]).is_empty());
}

#[test]
fn blank_name_adds_nothing() {
    let mut g = FamilyGraph::new();
    let err = g
        .add_person(Biography::named(""))
        .expect_err("name required");
    assert!(matches!(err, GraphError::InvalidPerson { .. }));
    assert!(g.persons().is_empty());
}

#[test]
fn seed_family_restores_and_grows() {
    let mut g = FamilyGraph::from_snapshot(initial_family()).expect("seed is valid");
    let john = PersonId::new("1");
    let roles: Vec<Role> = g.relationships_of(&john).iter().map(|c| c.role).collect();
    assert_eq!(roles, vec![Role::Child, Role::Child]);

    let jane = g.add_person(Biography::named("Jane")).expect("jane").id;
    g.connect(&jane, &john, RelationshipKind::Spouse)
        .expect("jane marries john");
    g.connect(&jane, &PersonId::new("2"), RelationshipKind::ParentChild)
        .expect("jane is sarah's parent");

    let sarah_parents = g.parents_of(&PersonId::new("2"));
    assert_eq!(sarah_parents, vec![&john, &jane]);

    let candidates: Vec<_> = g
        .available_candidates(&jane, RelationshipKind::ParentChild)
        .expect("known")
        .into_iter()
        .map(|p| p.id.clone())
        .collect();
    assert_eq!(candidates, vec![PersonId::new("3")]);
}

#[test]
fn snapshot_json_round_trip_preserves_kinds() {
    let (mut g, ids) = family(&["a", "b", "c"]);
    g.connect(&ids[0], &ids[1], RelationshipKind::Spouse)
        .expect("spouse");
    g.connect(&ids[0], &ids[2], RelationshipKind::ParentChild)
        .expect("parent");

    let snap = g.snapshot();
    let json = serde_json::to_string(&snap).expect("serialize");
    assert!(json.contains("\"kind\":\"spouse\""));
    assert!(json.contains("\"kind\":\"parent-child\""));
    let back: Snapshot = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(back, snap);
}

#[test]
fn cyclic_snapshot_is_rejected_on_restore() {
    let (mut g, ids) = family(&["a", "b"]);
    g.connect(&ids[0], &ids[1], RelationshipKind::ParentChild)
        .expect("a-b");
    let mut snap = g.snapshot();
    let mut reverse = snap.relationships[0].clone();
    reverse.id = "loop".into();
    std::mem::swap(&mut reverse.source, &mut reverse.target);
    snap.relationships.push(reverse);

    assert!(has_cycle(&snap));
    let err = FamilyGraph::from_snapshot(snap).expect_err("cycle");
    assert!(matches!(err, GraphError::Cycle { .. }));
}
