//! Snapshot → indexed layout graph.
//!
//! Node indices are positions in the snapshot's person list, so every later
//! phase can use plain vectors and iterate in insertion order.

use std::collections::{HashMap, HashSet};

use kindred_core::model::{PersonId, RelationshipKind};
use kindred_core::snapshot::Snapshot;
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};

use crate::error::LayoutError;

#[derive(Debug)]
pub struct LayoutGraph {
    /// Person id per node index (first occurrence only).
    pub ids: Vec<PersonId>,
    /// Parents of each node, ascending node index.
    pub parents: Vec<Vec<usize>>,
    /// Children of each node, ascending node index.
    pub children: Vec<Vec<usize>>,
    /// Spouse pairs `(low, high)` in relationship order.
    pub spouses: Vec<(usize, usize)>,
    /// Node indices in a topological order of the parent-child DAG.
    pub topo: Vec<usize>,
}

impl LayoutGraph {
    pub fn from_snapshot(snapshot: &Snapshot) -> Result<Self, LayoutError> {
        let mut index: HashMap<&PersonId, usize> = HashMap::new();
        let mut ids = Vec::with_capacity(snapshot.persons.len());
        let mut dag: DiGraph<(), ()> = DiGraph::with_capacity(snapshot.persons.len(), snapshot.relationships.len());
        for person in &snapshot.persons {
            if !index.contains_key(&person.id) {
                index.insert(&person.id, ids.len());
                ids.push(person.id.clone());
                dag.add_node(());
            }
        }

        let n = ids.len();
        let mut parents = vec![Vec::new(); n];
        let mut children = vec![Vec::new(); n];
        let mut spouses = Vec::new();
        let mut seen: HashSet<(RelationshipKind, usize, usize)> = HashSet::new();

        for rel in &snapshot.relationships {
            let resolve = |person: &PersonId| {
                index
                    .get(person)
                    .copied()
                    .ok_or_else(|| LayoutError::UnknownEndpoint {
                        relationship: rel.id.clone(),
                        person: person.clone(),
                    })
            };
            let source = resolve(&rel.source)?;
            let target = resolve(&rel.target)?;

            match rel.kind {
                RelationshipKind::ParentChild => {
                    if seen.insert((rel.kind, source, target)) {
                        dag.add_edge(NodeIndex::new(source), NodeIndex::new(target), ());
                        children[source].push(target);
                        parents[target].push(source);
                    }
                }
                RelationshipKind::Spouse => {
                    let pair = (source.min(target), source.max(target));
                    if source != target && seen.insert((rel.kind, pair.0, pair.1)) {
                        spouses.push(pair);
                    }
                }
            }
        }

        for list in parents.iter_mut().chain(children.iter_mut()) {
            list.sort_unstable();
        }

        let topo = toposort(&dag, None)
            .map_err(|cycle| LayoutError::CyclicGraph {
                person: ids[cycle.node_id().index()].clone(),
            })?
            .into_iter()
            .map(NodeIndex::index)
            .collect();

        Ok(Self {
            ids,
            parents,
            children,
            spouses,
            topo,
        })
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Spouse neighbours of every node, ascending node index.
    pub fn spouse_lists(&self) -> Vec<Vec<usize>> {
        let mut lists = vec![Vec::new(); self.len()];
        for &(a, b) in &self.spouses {
            lists[a].push(b);
            lists[b].push(a);
        }
        for list in &mut lists {
            list.sort_unstable();
        }
        lists
    }
}
