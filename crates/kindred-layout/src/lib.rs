//! kindred-layout: layered auto-layout for family trees.
//!
//! Given a [`Snapshot`], computes a position for every person so that
//! generations form horizontal bands (or vertical ones, left to right),
//! parents sit above their children, and partners stand side by side.
//!
//! # Pipeline
//!
//! 1. **Build**: parent-child edges become a `petgraph` DAG over persons in
//!    input order. Spouse pairs are kept aside. Duplicate edges collapse.
//! 2. **Cycle defence**: a topological sort rejects cyclic input.
//! 3. **Rank**: longest-path layering, then parentless partners join their
//!    spouse's generation.
//! 4. **Order**: barycenter sweeps reduce edge crossings; spouse groups are
//!    kept contiguous.
//! 5. **Coordinates**: fixed node footprint and separations, each rank
//!    centred against the widest; positions are top-left anchors.
//!
//! Every phase iterates vectors in insertion order, so identical snapshots
//! always produce identical positions.

mod build;
mod coords;
mod error;
mod order;
mod rank;

use kindred_core::config::LayoutSettings;
use kindred_core::model::{PersonId, Position};
use kindred_core::snapshot::Snapshot;
use serde::Serialize;
use tracing::{info, instrument};

pub use error::LayoutError;

use build::LayoutGraph;

/// Where one person ended up.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlacedPerson {
    pub id: PersonId,
    /// Generation, 0 at the top (or left).
    pub rank: usize,
    /// Slot within the generation, 0 at the left (or top).
    pub order: usize,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct LayoutStats {
    pub ranks: usize,
    pub max_rank_width: usize,
    pub crossings: usize,
    pub sweeps: usize,
}

/// Result of [`LayoutEngine::compute`]: one entry per distinct person, in
/// snapshot order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Placement {
    pub persons: Vec<PlacedPerson>,
    pub stats: LayoutStats,
}

impl Placement {
    /// `(id, position)` pairs, ready for `FamilyGraph::apply_positions`.
    pub fn positions(&self) -> impl Iterator<Item = (&PersonId, Position)> {
        self.persons.iter().map(|p| (&p.id, p.position))
    }

    #[must_use]
    pub fn get(&self, id: &PersonId) -> Option<&PlacedPerson> {
        self.persons.iter().find(|p| &p.id == id)
    }

    /// Copy of `snapshot` with every placed person moved. Relationships and
    /// biographical data are untouched.
    #[must_use]
    pub fn apply_to(&self, snapshot: &Snapshot) -> Snapshot {
        let mut out = snapshot.clone();
        for person in &mut out.persons {
            if let Some(placed) = self.get(&person.id) {
                person.position = placed.position;
            }
        }
        out
    }
}

/// Stateless layout runner configured once per session.
#[derive(Debug, Clone, Default)]
pub struct LayoutEngine {
    settings: LayoutSettings,
}

impl LayoutEngine {
    #[must_use]
    pub const fn new(settings: LayoutSettings) -> Self {
        Self { settings }
    }

    #[must_use]
    pub const fn settings(&self) -> &LayoutSettings {
        &self.settings
    }

    /// Compute ranks, order and positions for every person in `snapshot`.
    ///
    /// # Errors
    ///
    /// [`LayoutError::UnknownEndpoint`] for an edge to a missing person and
    /// [`LayoutError::CyclicGraph`] if parent-child edges contain a cycle.
    #[instrument(skip_all, fields(persons = snapshot.persons.len(), relationships = snapshot.relationships.len()))]
    pub fn compute(&self, snapshot: &Snapshot) -> Result<Placement, LayoutError> {
        let graph = LayoutGraph::from_snapshot(snapshot)?;
        let ranks = rank::assign_ranks(&graph);
        let ordered = order::order_ranks(&graph, &ranks, self.settings.max_sweeps);
        let positions = coords::assign_positions(&ordered.layers, graph.len(), &self.settings);

        let mut slots = vec![0; graph.len()];
        for layer in &ordered.layers {
            for (slot, &node) in layer.iter().enumerate() {
                slots[node] = slot;
            }
        }

        let persons = graph
            .ids
            .iter()
            .enumerate()
            .map(|(node, id)| PlacedPerson {
                id: id.clone(),
                rank: ranks[node],
                order: slots[node],
                position: positions[node],
            })
            .collect();

        let stats = LayoutStats {
            ranks: ordered.layers.len(),
            max_rank_width: ordered.layers.iter().map(Vec::len).max().unwrap_or(0),
            crossings: ordered.crossings,
            sweeps: ordered.sweeps,
        };
        info!(
            ranks = stats.ranks,
            crossings = stats.crossings,
            sweeps = stats.sweeps,
            direction = %self.settings.direction,
            "computed layout"
        );

        Ok(Placement { persons, stats })
    }

    /// [`compute`](Self::compute) and return the repositioned snapshot.
    ///
    /// # Errors
    ///
    /// Same as [`compute`](Self::compute).
    pub fn layout(&self, snapshot: &Snapshot) -> Result<Snapshot, LayoutError> {
        Ok(self.compute(snapshot)?.apply_to(snapshot))
    }
}

/// Lay out `snapshot` with default settings.
///
/// # Errors
///
/// Same as [`LayoutEngine::compute`].
pub fn layout(snapshot: &Snapshot) -> Result<Snapshot, LayoutError> {
    LayoutEngine::default().layout(snapshot)
}
