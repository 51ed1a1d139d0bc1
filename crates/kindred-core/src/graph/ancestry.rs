//! Ancestry reachability and cycle detection over parent-child edges.
//!
//! # Overview
//!
//! Restricted to `ParentChild` edges, a family tree must stay a DAG: nobody
//! can be their own ancestor. Adding `parent → child` closes a loop exactly
//! when `child` already reaches `parent` by following child links, so the
//! check is a depth-first search from `child` looking for `parent`.
//!
//! The search is generic over [`Lineage`] so the same code serves the live
//! [`FamilyGraph`](super::FamilyGraph) (incident-edge index) and raw
//! [`Snapshot`] values handed in from outside.
//!
//! # Complexity
//!
//! O(V+E): each person and edge is visited at most once per query.

#![allow(clippy::module_name_repetitions)]

use std::collections::{HashMap, HashSet};

use crate::model::{PersonId, RelationshipKind};
use crate::snapshot::Snapshot;

/// Anything that can enumerate a person's children.
pub trait Lineage {
    /// Children of `person`, in a stable order. Unknown persons have none.
    fn children_of(&self, person: &PersonId) -> Vec<&PersonId>;
}

/// Child adjacency built from a snapshot's parent-child edges.
///
/// Dangling endpoints are kept as nodes so malformed input is still
/// searchable.
#[derive(Debug, Default)]
pub struct ChildIndex<'a> {
    nodes: Vec<&'a PersonId>,
    children: HashMap<&'a PersonId, Vec<&'a PersonId>>,
}

impl<'a> ChildIndex<'a> {
    #[must_use]
    pub fn from_snapshot(snapshot: &'a Snapshot) -> Self {
        let mut seen: HashSet<&PersonId> = HashSet::new();
        let mut nodes = Vec::with_capacity(snapshot.persons.len());
        for person in &snapshot.persons {
            if seen.insert(&person.id) {
                nodes.push(&person.id);
            }
        }

        let mut children: HashMap<&PersonId, Vec<&PersonId>> = HashMap::new();
        for rel in &snapshot.relationships {
            if rel.kind != RelationshipKind::ParentChild {
                continue;
            }
            for endpoint in [&rel.source, &rel.target] {
                if seen.insert(endpoint) {
                    nodes.push(endpoint);
                }
            }
            children.entry(&rel.source).or_default().push(&rel.target);
        }

        Self { nodes, children }
    }

    /// All node ids in first-seen order.
    #[must_use]
    pub fn nodes(&self) -> &[&'a PersonId] {
        &self.nodes
    }

    fn kids(&self, person: &PersonId) -> &[&'a PersonId] {
        self.children.get(person).map(Vec::as_slice).unwrap_or_default()
    }
}

impl Lineage for ChildIndex<'_> {
    fn children_of(&self, person: &PersonId) -> Vec<&PersonId> {
        self.kids(person).to_vec()
    }
}

// ---------------------------------------------------------------------------
// Reachability
// ---------------------------------------------------------------------------

/// Check whether adding `parent → child` would make someone their own ancestor.
///
/// Returns the existing descent `child → … → parent` if it exists, `None`
/// otherwise. Equal endpoints yield a one-element path.
pub fn would_create_cycle<L: Lineage>(
    lineage: &L,
    parent: &PersonId,
    child: &PersonId,
) -> Option<Vec<PersonId>> {
    if parent == child {
        return Some(vec![parent.clone()]);
    }

    let mut came_from: HashMap<PersonId, PersonId> = HashMap::new();

    if dfs_find_path(lineage, child, parent, &mut came_from) {
        Some(reconstruct_path(&came_from, child, parent))
    } else {
        None
    }
}

/// Return `true` if `ancestor` reaches `descendant` through child links.
pub fn is_ancestor<L: Lineage>(lineage: &L, ancestor: &PersonId, descendant: &PersonId) -> bool {
    ancestor != descendant && would_create_cycle(lineage, descendant, ancestor).is_some()
}

/// Find any parent-child cycle in a snapshot.
///
/// Returns the loop as a closed path (`a → b → … → a`), or `None` for a DAG.
#[must_use]
pub fn find_cycle(snapshot: &Snapshot) -> Option<Vec<PersonId>> {
    let index = ChildIndex::from_snapshot(snapshot);
    let mut color: HashMap<&PersonId, Color> =
        index.nodes().iter().map(|id| (*id, Color::White)).collect();
    let mut came_from: HashMap<&PersonId, &PersonId> = HashMap::new();

    for &node in index.nodes() {
        if color.get(node) != Some(&Color::White) {
            continue;
        }
        if let Some(cycle) = dfs_cycle(&index, node, &mut color, &mut came_from) {
            return Some(cycle);
        }
    }
    None
}

/// Return `true` if the snapshot's parent-child edges contain a cycle.
#[must_use]
pub fn has_cycle(snapshot: &Snapshot) -> bool {
    find_cycle(snapshot).is_some()
}

// ---------------------------------------------------------------------------
// DFS internals
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    /// Not yet visited.
    White,
    /// On the DFS stack.
    Gray,
    /// Fully processed.
    Black,
}

/// Depth-first search from `start` for `target`, recording the tree edge
/// that first reached each person. Iterative, so deep lineages cannot
/// exhaust the call stack.
fn dfs_find_path<'a, L: Lineage>(
    lineage: &'a L,
    start: &'a PersonId,
    target: &PersonId,
    came_from: &mut HashMap<PersonId, PersonId>,
) -> bool {
    if start == target {
        return true;
    }

    let mut visited: HashSet<&PersonId> = HashSet::from([start]);
    // Each frame holds a person and the children not yet tried.
    let mut stack = vec![(start, lineage.children_of(start).into_iter())];

    while let Some((current, pending)) = stack.last_mut() {
        let current = *current;
        let Some(next) = pending.next() else {
            stack.pop();
            continue;
        };
        if visited.contains(next) {
            continue;
        }
        came_from.insert(next.clone(), current.clone());
        if next == target {
            return true;
        }
        visited.insert(next);
        stack.push((next, lineage.children_of(next).into_iter()));
    }

    false
}

/// Walk `came_from` back from `end` to `start` and return `[start, …, end]`.
fn reconstruct_path(
    came_from: &HashMap<PersonId, PersonId>,
    start: &PersonId,
    end: &PersonId,
) -> Vec<PersonId> {
    let mut chain = vec![end.clone()];
    let mut current = end;
    while current != start {
        match came_from.get(current) {
            Some(prev) => {
                chain.push(prev.clone());
                current = prev;
            }
            None => break,
        }
    }
    chain.reverse();
    chain
}

fn dfs_cycle<'a>(
    index: &ChildIndex<'a>,
    root: &'a PersonId,
    color: &mut HashMap<&'a PersonId, Color>,
    came_from: &mut HashMap<&'a PersonId, &'a PersonId>,
) -> Option<Vec<PersonId>> {
    color.insert(root, Color::Gray);
    let mut stack = vec![(root, index.kids(root).iter())];

    while let Some((node, pending)) = stack.last_mut() {
        let node = *node;
        let Some(&next) = pending.next() else {
            color.insert(node, Color::Black);
            stack.pop();
            continue;
        };
        match color.get(next) {
            Some(Color::White) => {
                came_from.insert(next, node);
                color.insert(next, Color::Gray);
                stack.push((next, index.kids(next).iter()));
            }
            Some(Color::Gray) => return Some(close_cycle(came_from, node, next)),
            _ => {}
        }
    }

    None
}

/// Back edge `node → next` closes `next → … → node → next`.
fn close_cycle<'a>(
    came_from: &HashMap<&'a PersonId, &'a PersonId>,
    node: &'a PersonId,
    next: &'a PersonId,
) -> Vec<PersonId> {
    let mut cycle = vec![next.clone(), node.clone()];
    let mut cur = node;
    while cur != next {
        match came_from.get(cur) {
            Some(&prev) => {
                cycle.push(prev.clone());
                cur = prev;
            }
            None => break,
        }
    }
    cycle.reverse();
    cycle
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Person, Relationship, RelationshipId};

    fn snapshot(people: &[&str], parent_child: &[(&str, &str)]) -> Snapshot {
        Snapshot {
            persons: people
                .iter()
                .map(|id| Person {
                    id: PersonId::new(*id),
                    position: crate::model::Position::default(),
                    data: crate::model::Biography::named(*id),
                })
                .collect(),
            relationships: parent_child
                .iter()
                .enumerate()
                .map(|(i, (p, c))| Relationship {
                    id: RelationshipId::new(format!("r{i}")),
                    source: PersonId::new(*p),
                    target: PersonId::new(*c),
                    kind: RelationshipKind::ParentChild,
                })
                .collect(),
        }
    }

    fn id(s: &str) -> PersonId {
        PersonId::new(s)
    }

    #[test]
    fn no_cycle_for_unrelated_pair() {
        let snap = snapshot(&["a", "b"], &[]);
        let index = ChildIndex::from_snapshot(&snap);
        assert!(would_create_cycle(&index, &id("a"), &id("b")).is_none());
    }

    #[test]
    fn direct_reverse_edge_is_a_cycle() {
        let snap = snapshot(&["a", "b"], &[("a", "b")]);
        let index = ChildIndex::from_snapshot(&snap);
        let path = would_create_cycle(&index, &id("b"), &id("a")).expect("cycle");
        assert_eq!(path, vec![id("a"), id("b")]);
    }

    #[test]
    fn transitive_cycle_reports_full_path() {
        let snap = snapshot(&["a", "b", "c"], &[("a", "b"), ("b", "c")]);
        let index = ChildIndex::from_snapshot(&snap);
        let path = would_create_cycle(&index, &id("c"), &id("a")).expect("cycle");
        assert_eq!(path, vec![id("a"), id("b"), id("c")]);
    }

    #[test]
    fn diamond_is_not_a_cycle() {
        let snap = snapshot(
            &["a", "b", "c", "d"],
            &[("a", "b"), ("a", "c"), ("b", "d"), ("c", "d")],
        );
        let index = ChildIndex::from_snapshot(&snap);
        assert!(would_create_cycle(&index, &id("a"), &id("d")).is_none());
        assert!(!has_cycle(&snap));
    }

    #[test]
    fn self_edge_is_one_element_cycle() {
        let snap = snapshot(&["a"], &[]);
        let index = ChildIndex::from_snapshot(&snap);
        assert_eq!(would_create_cycle(&index, &id("a"), &id("a")), Some(vec![id("a")]));
    }

    #[test]
    fn is_ancestor_follows_generations() {
        let snap = snapshot(&["g", "p", "k"], &[("g", "p"), ("p", "k")]);
        let index = ChildIndex::from_snapshot(&snap);
        assert!(is_ancestor(&index, &id("g"), &id("k")));
        assert!(!is_ancestor(&index, &id("k"), &id("g")));
        assert!(!is_ancestor(&index, &id("g"), &id("g")));
    }

    #[test]
    fn find_cycle_returns_closed_loop() {
        let snap = snapshot(&["a", "b", "c"], &[("a", "b"), ("b", "c"), ("c", "a")]);
        let cycle = find_cycle(&snap).expect("cycle present");
        assert_eq!(cycle.first(), cycle.last());
        assert_eq!(cycle.len(), 4);
    }

    #[test]
    fn find_cycle_sees_dangling_endpoints() {
        let snap = snapshot(&["a"], &[("a", "ghost"), ("ghost", "a")]);
        assert!(has_cycle(&snap));
    }

    #[test]
    fn spouse_edges_are_ignored() {
        let mut snap = snapshot(&["a", "b"], &[("a", "b")]);
        snap.relationships.push(Relationship {
            id: RelationshipId::new("s"),
            source: id("b"),
            target: id("a"),
            kind: RelationshipKind::Spouse,
        });
        assert!(!has_cycle(&snap));
    }

    #[test]
    fn deep_lineage_is_searched_without_recursion() {
        const DEPTH: usize = 200_000;
        let names: Vec<String> = (0..DEPTH).map(|i| format!("g{i}")).collect();
        let people: Vec<&str> = names.iter().map(String::as_str).collect();
        let edges: Vec<(&str, &str)> = people.windows(2).map(|w| (w[0], w[1])).collect();
        let snap = snapshot(&people, &edges);
        let index = ChildIndex::from_snapshot(&snap);

        let first = id(people[0]);
        let last = id(people[DEPTH - 1]);
        let path = would_create_cycle(&index, &last, &first).expect("closing edge");
        assert_eq!(path.len(), DEPTH);
        assert_eq!(path.first(), Some(&first));
        assert_eq!(path.last(), Some(&last));
        assert!(find_cycle(&snap).is_none());
    }
}
