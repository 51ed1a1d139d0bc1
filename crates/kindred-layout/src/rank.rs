//! Generation assignment.
//!
//! Longest-path layering puts every parent strictly above each of its
//! children. Persons who married into the family have no parents of their
//! own and would otherwise float at rank 0, so they are then pulled down to
//! their spouse's generation without passing any of their own children.

use crate::build::LayoutGraph;

/// Rank per node index.
pub fn assign_ranks(graph: &LayoutGraph) -> Vec<usize> {
    let mut ranks = vec![0usize; graph.len()];
    for &node in &graph.topo {
        for &child in &graph.children[node] {
            ranks[child] = ranks[child].max(ranks[node] + 1);
        }
    }
    align_spouses(graph, &mut ranks);
    ranks
}

/// Move parentless persons down to their deepest spouse's rank.
///
/// Ranks only ever grow and never exceed the current maximum, so the loop
/// reaches a fixed point.
fn align_spouses(graph: &LayoutGraph, ranks: &mut [usize]) {
    loop {
        let mut changed = false;
        for &(a, b) in &graph.spouses {
            for (mover, anchor) in [(a, b), (b, a)] {
                if !graph.parents[mover].is_empty() || ranks[mover] >= ranks[anchor] {
                    continue;
                }
                let ceiling = graph.children[mover]
                    .iter()
                    .map(|&c| ranks[c].saturating_sub(1))
                    .min()
                    .unwrap_or(usize::MAX);
                let target = ranks[anchor].min(ceiling);
                if target > ranks[mover] {
                    ranks[mover] = target;
                    changed = true;
                }
            }
        }
        if !changed {
            break;
        }
    }
}

/// Group node indices by rank, each bucket in insertion order.
pub fn rank_buckets(ranks: &[usize]) -> Vec<Vec<usize>> {
    let Some(&max_rank) = ranks.iter().max() else {
        return Vec::new();
    };
    let mut buckets = vec![Vec::new(); max_rank + 1];
    for (node, &rank) in ranks.iter().enumerate() {
        buckets[rank].push(node);
    }
    buckets
}

#[cfg(test)]
mod tests {
    use super::*;
    use kindred_core::model::{
        Biography, Person, PersonId, Position, Relationship, RelationshipId, RelationshipKind,
    };
    use kindred_core::snapshot::Snapshot;

    fn graph(n: usize, edges: &[(usize, usize, RelationshipKind)]) -> LayoutGraph {
        let snap = Snapshot::new(
            (0..n)
                .map(|i| Person {
                    id: PersonId::new(format!("n{i}")),
                    position: Position::default(),
                    data: Biography::named(format!("n{i}")),
                })
                .collect(),
            edges
                .iter()
                .enumerate()
                .map(|(i, &(s, t, kind))| Relationship {
                    id: RelationshipId::new(format!("r{i}")),
                    source: PersonId::new(format!("n{s}")),
                    target: PersonId::new(format!("n{t}")),
                    kind,
                })
                .collect(),
        );
        LayoutGraph::from_snapshot(&snap).expect("valid graph")
    }

    const PC: RelationshipKind = RelationshipKind::ParentChild;
    const SP: RelationshipKind = RelationshipKind::Spouse;

    #[test]
    fn longest_path_layering() {
        // 0 → 1 → 2, and 0 → 2 directly.
        let g = graph(3, &[(0, 1, PC), (1, 2, PC), (0, 2, PC)]);
        assert_eq!(assign_ranks(&g), vec![0, 1, 2]);
    }

    #[test]
    fn spouse_joins_partner_generation() {
        // 0 → 1; 2 marries 1 and has child 3 with them.
        let g = graph(4, &[(0, 1, PC), (2, 1, SP), (1, 3, PC), (2, 3, PC)]);
        assert_eq!(assign_ranks(&g), vec![0, 1, 1, 2]);
    }

    #[test]
    fn spouse_alignment_respects_own_children() {
        let g = graph(4, &[(0, 1, PC), (1, 2, PC), (3, 2, SP), (3, 1, PC)]);
        // n3 would join n2 at rank 2 but must stay above its child n1 (rank 1).
        assert_eq!(assign_ranks(&g), vec![0, 1, 2, 0]);
    }

    #[test]
    fn persons_with_parents_never_move() {
        // n3 is married to n2 at rank 2 but is itself a child of n0.
        let g = graph(4, &[(0, 1, PC), (1, 2, PC), (3, 2, SP), (0, 3, PC)]);
        assert_eq!(assign_ranks(&g), vec![0, 1, 2, 1]);
    }

    #[test]
    fn alignment_propagates_through_spouse_chains() {
        // 0 → 1; 1 ~ 2; 2 ~ 3 where 2 and 3 are parentless.
        let g = graph(4, &[(0, 1, PC), (1, 2, SP), (2, 3, SP)]);
        assert_eq!(assign_ranks(&g), vec![0, 1, 1, 1]);
    }

    #[test]
    fn buckets_keep_insertion_order() {
        assert_eq!(rank_buckets(&[1, 0, 1, 0]), vec![vec![1, 3], vec![0, 2]]);
        assert!(rank_buckets(&[]).is_empty());
    }
}
