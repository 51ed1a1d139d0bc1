//! Rank/order → drawing coordinates.

use kindred_core::config::{LayoutDirection, LayoutSettings};
use kindred_core::model::Position;

/// Top-left anchor of every node, by node index.
///
/// Slots are laid out along the rank axis with `node_sep` gaps and each rank
/// is centred against the widest one. Generations advance by one footprint
/// plus the rank separation.
#[allow(clippy::cast_precision_loss)]
pub fn assign_positions(layers: &[Vec<usize>], n: usize, settings: &LayoutSettings) -> Vec<Position> {
    let (along, across) = match settings.direction {
        LayoutDirection::TopBottom => (settings.node_width, settings.node_height),
        LayoutDirection::LeftRight => (settings.node_height, settings.node_width),
    };
    let slot_step = along + settings.node_sep;
    let rank_step = across + settings.effective_rank_sep();

    let span = |count: usize| {
        if count == 0 {
            0.0
        } else {
            (count as f64).mul_add(slot_step, -settings.node_sep)
        }
    };
    let widest = layers.iter().map(|l| span(l.len())).fold(0.0_f64, f64::max);

    let mut positions = vec![Position::default(); n];
    for (rank, layer) in layers.iter().enumerate() {
        let shift = (widest - span(layer.len())) / 2.0;
        for (slot, &node) in layer.iter().enumerate() {
            let centre_along = (slot as f64).mul_add(slot_step, shift) + along / 2.0;
            let centre_across = (rank as f64).mul_add(rank_step, across / 2.0);
            let along_coord = centre_along - along / 2.0;
            let across_coord = centre_across - across / 2.0;
            positions[node] = match settings.direction {
                LayoutDirection::TopBottom => Position::new(along_coord, across_coord),
                LayoutDirection::LeftRight => Position::new(across_coord, along_coord),
            };
        }
    }
    positions
}
