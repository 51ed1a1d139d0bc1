use std::path::Path;

use anyhow::Result;
use clap::Args;
use kindred_core::config::LayoutDirection;
use kindred_layout::{LayoutEngine, LayoutStats, PlacedPerson};
use serde::Serialize;

use super::{Session, save_label};
use crate::output::{CliError, OutputMode, fail, pretty_kv, pretty_section, render_mode};

#[derive(Args, Debug, Default)]
pub struct LayoutArgs {
    /// Override the configured direction (`top-bottom` or `left-right`).
    #[arg(long, short = 'd')]
    pub direction: Option<LayoutDirection>,

    /// Compute and print positions without saving them.
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Debug, Serialize)]
struct LayoutOutput {
    ok: bool,
    direction: LayoutDirection,
    saved: bool,
    stats: LayoutStats,
    persons: Vec<PlacedPerson>,
}

/// Execute `kin layout`: arrange everyone into generations.
///
/// # Errors
///
/// Returns an error if the parent-child links contain a cycle, a link
/// points at a missing person, or the tree cannot be saved.
pub fn run_layout(args: &LayoutArgs, output: OutputMode, project_root: &Path) -> Result<()> {
    let mut session = Session::open(project_root, output)?;

    let mut settings = session.config.layout.clone();
    if let Some(direction) = args.direction {
        settings = settings.with_direction(direction);
    }
    let direction = settings.direction;
    let engine = LayoutEngine::new(settings);

    let placement = engine
        .compute(&session.graph.snapshot())
        .map_err(|e| fail(output, &CliError::from(&e)))?;

    let mut saved = false;
    let mut outcome = "dry run";
    if !args.dry_run {
        session
            .graph
            .apply_positions(placement.positions())
            .map_err(|e| fail(output, &CliError::from(&e)))?;
        let result = session.save(output)?;
        outcome = save_label(&result);
        saved = true;
    }

    let result = LayoutOutput {
        ok: true,
        direction,
        saved,
        stats: placement.stats,
        persons: placement.persons,
    };
    render_mode(
        output,
        &result,
        |r, w| {
            for p in &r.persons {
                writeln!(
                    w,
                    "{}\t{}\t{}\t{}\t{}",
                    p.id, p.rank, p.order, p.position.x, p.position.y
                )?;
            }
            Ok(())
        },
        |r, w| {
            pretty_section(w, &format!("Layout ({})", r.direction))?;
            pretty_kv(w, "generations", r.stats.ranks.to_string())?;
            pretty_kv(w, "widest", r.stats.max_rank_width.to_string())?;
            pretty_kv(w, "crossings", r.stats.crossings.to_string())?;
            pretty_kv(w, "sweeps", r.stats.sweeps.to_string())?;
            pretty_kv(w, "tree", outcome)?;
            writeln!(w)?;
            for p in &r.persons {
                writeln!(
                    w,
                    "  {:<6} gen {:<3} slot {:<3} ({}, {})",
                    p.id, p.rank, p.order, p.position.x, p.position.y
                )?;
            }
            Ok(())
        },
    )
}
