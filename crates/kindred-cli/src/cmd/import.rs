use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Args;
use kindred_core::FamilyGraph;
use kindred_core::store::decode_document;
use kindred_layout::LayoutEngine;
use serde::Serialize;

use super::{Session, read_input, save_label};
use crate::output::{CliError, OutputMode, fail, pretty_kv, render};

#[derive(Args, Debug)]
pub struct ImportArgs {
    /// Tree document to import, or `-` for stdin.
    ///
    /// Accepts `tree.json` files, bare `{ persons, relationships }`
    /// snapshots, and older `{ nodes, edges }` browser exports.
    pub file: PathBuf,

    /// Recompute positions after importing.
    #[arg(long)]
    pub layout: bool,
}

#[derive(Debug, Serialize)]
struct ImportOutput {
    ok: bool,
    persons: usize,
    relationships: usize,
    laid_out: bool,
}

/// Execute `kin import`: replace the current tree with a document.
///
/// The document is validated as a whole first. Nothing is written if any
/// person or relationship is rejected. The current tree is not read, so
/// importing an export also recovers a corrupt `tree.json`.
///
/// # Errors
///
/// Returns an error if the document cannot be read, parsed or validated.
pub fn run_import(args: &ImportArgs, output: OutputMode, project_root: &Path) -> Result<()> {
    // Fail fast on a missing project before reading stdin.
    super::find_store(project_root, output)?;

    let text = read_input(&args.file)?;
    let snapshot =
        decode_document(&text, &args.file).map_err(|e| fail(output, &CliError::from(&e)))?;
    let graph =
        FamilyGraph::from_snapshot(snapshot).map_err(|e| fail(output, &CliError::from(&e)))?;
    let mut session = Session::replacing(project_root, output, graph)?;

    let laid_out = args.layout || session.config.graph.auto_layout;
    if laid_out {
        let placement = LayoutEngine::new(session.config.layout.clone())
            .compute(&session.graph.snapshot())
            .map_err(|e| fail(output, &CliError::from(&e)))?;
        session
            .graph
            .apply_positions(placement.positions())
            .map_err(|e| fail(output, &CliError::from(&e)))?;
    }
    let outcome = session.save(output)?;

    let result = ImportOutput {
        ok: true,
        persons: session.graph.len(),
        relationships: session.graph.relationships().len(),
        laid_out,
    };
    render(output, &result, |r, w| {
        writeln!(w, "Imported {}", args.file.display())?;
        pretty_kv(w, "persons", r.persons.to_string())?;
        pretty_kv(w, "links", r.relationships.to_string())?;
        pretty_kv(w, "tree", save_label(&outcome))
    })
}
