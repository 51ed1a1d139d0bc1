//! Ordering within ranks: iterated barycenter crossing reduction.
//!
//! Each sweep reorders every rank by the mean position of its neighbours in
//! the adjacent rank (parents on the way down, children on the way up), then
//! pulls each group of same-rank spouses together. The best ordering by
//! total crossing count is kept and sweeping stops at the first sweep that
//! does not improve on it.

use std::cmp::Ordering as CmpOrdering;

use crate::build::LayoutGraph;
use crate::rank::rank_buckets;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankOrder {
    /// Node indices per rank, left to right.
    pub layers: Vec<Vec<usize>>,
    pub crossings: usize,
    pub sweeps: usize,
}

pub fn order_ranks(graph: &LayoutGraph, ranks: &[usize], max_sweeps: usize) -> RankOrder {
    let spouses = graph.spouse_lists();
    let mut layers = rank_buckets(ranks);
    group_spouses(&mut layers, &spouses, ranks);

    let mut pos = positions(&layers, ranks.len());
    let mut best_crossings = total_crossings(&layers, &pos, graph, ranks);
    let mut best = layers.clone();
    let mut sweeps = 0;

    while sweeps < max_sweeps && best_crossings > 0 && layers.len() > 1 {
        sweeps += 1;

        for r in 1..layers.len() {
            reorder(&mut layers[r], &graph.parents, ranks, r - 1, &mut pos);
        }
        for r in (0..layers.len() - 1).rev() {
            reorder(&mut layers[r], &graph.children, ranks, r + 1, &mut pos);
        }
        group_spouses(&mut layers, &spouses, ranks);
        pos = positions(&layers, ranks.len());

        let crossings = total_crossings(&layers, &pos, graph, ranks);
        if crossings < best_crossings {
            best_crossings = crossings;
            best.clone_from(&layers);
        } else {
            break;
        }
    }

    RankOrder {
        layers: best,
        crossings: best_crossings,
        sweeps,
    }
}

/// Index of every node within its own layer.
fn positions(layers: &[Vec<usize>], n: usize) -> Vec<usize> {
    let mut pos = vec![0; n];
    for layer in layers {
        for (i, &node) in layer.iter().enumerate() {
            pos[node] = i;
        }
    }
    pos
}

/// Mean position of `neighbours` that sit in `reference_rank`, if any.
#[allow(clippy::cast_precision_loss)]
fn barycenter(neighbours: &[usize], ranks: &[usize], reference_rank: usize, pos: &[usize]) -> Option<f64> {
    let (sum, count) = neighbours
        .iter()
        .filter(|&&nb| ranks[nb] == reference_rank)
        .fold((0usize, 0usize), |(sum, count), &nb| (sum + pos[nb], count + 1));
    (count > 0).then(|| sum as f64 / count as f64)
}

/// Sort one layer by barycenter. Nodes without neighbours in the reference
/// rank keep their current slot as their score; ties go to the earlier
/// inserted person.
#[allow(clippy::cast_precision_loss)]
fn reorder(
    layer: &mut Vec<usize>,
    neighbours: &[Vec<usize>],
    ranks: &[usize],
    reference_rank: usize,
    pos: &mut [usize],
) {
    let mut scored: Vec<(usize, f64)> = layer
        .iter()
        .enumerate()
        .map(|(slot, &node)| {
            let score = barycenter(&neighbours[node], ranks, reference_rank, pos)
                .unwrap_or(slot as f64);
            (node, score)
        })
        .collect();

    scored.sort_by(|a, b| {
        a.1.partial_cmp(&b.1)
            .unwrap_or(CmpOrdering::Equal)
            .then_with(|| a.0.cmp(&b.0))
    });

    *layer = scored.into_iter().map(|(node, _)| node).collect();
    for (i, &node) in layer.iter().enumerate() {
        pos[node] = i;
    }
}

/// Make every group of same-rank spouses contiguous.
///
/// A group is emitted where its leftmost member stands, members keeping
/// their relative order.
fn group_spouses(layers: &mut [Vec<usize>], spouses: &[Vec<usize>], ranks: &[usize]) {
    let mut placed = vec![false; ranks.len()];
    for layer in layers.iter_mut() {
        let slot: Vec<(usize, usize)> = layer.iter().enumerate().map(|(i, &n)| (n, i)).collect();
        let slot_of = |node: usize| slot.iter().find(|&&(n, _)| n == node).map_or(usize::MAX, |&(_, i)| i);

        let mut grouped = Vec::with_capacity(layer.len());
        for &start in layer.iter() {
            if placed[start] {
                continue;
            }
            let mut group = vec![start];
            placed[start] = true;
            let mut cursor = 0;
            while cursor < group.len() {
                let node = group[cursor];
                cursor += 1;
                for &partner in &spouses[node] {
                    if !placed[partner] && ranks[partner] == ranks[start] {
                        placed[partner] = true;
                        group.push(partner);
                    }
                }
            }
            group.sort_by_key(|&n| slot_of(n));
            grouped.extend(group);
        }
        *layer = grouped;
    }
}

/// Crossings between parent-child edges joining rank `r` and rank `r + 1`.
fn layer_crossings(
    upper: &[usize],
    upper_rank: usize,
    pos: &[usize],
    graph: &LayoutGraph,
    ranks: &[usize],
) -> usize {
    let edges: Vec<(usize, usize)> = upper
        .iter()
        .flat_map(|&parent| {
            graph.children[parent]
                .iter()
                .filter(move |&&child| ranks[child] == upper_rank + 1)
                .map(move |&child| (pos[parent], pos[child]))
        })
        .collect();

    let mut crossings = 0;
    for (i, &(a1, b1)) in edges.iter().enumerate() {
        for &(a2, b2) in &edges[i + 1..] {
            if (a1 < a2 && b1 > b2) || (a1 > a2 && b1 < b2) {
                crossings += 1;
            }
        }
    }
    crossings
}

pub fn total_crossings(
    layers: &[Vec<usize>],
    pos: &[usize],
    graph: &LayoutGraph,
    ranks: &[usize],
) -> usize {
    layers
        .iter()
        .enumerate()
        .take(layers.len().saturating_sub(1))
        .map(|(r, layer)| layer_crossings(layer, r, pos, graph, ranks))
        .sum()
}
