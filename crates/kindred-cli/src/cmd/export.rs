use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use chrono::Utc;
use clap::Args;
use kindred_core::store::StoredTree;
use serde::Serialize;

use super::Session;
use crate::output::{CliError, OutputMode, fail, render};

#[derive(Args, Debug, Default)]
pub struct ExportArgs {
    /// Write to this file instead of stdout.
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct ExportOutput {
    ok: bool,
    path: String,
    persons: usize,
    relationships: usize,
    content_hash: String,
}

/// Execute `kin export`: write the tree in `tree.json` format.
///
/// Without `--output` the document itself goes to stdout regardless of
/// output mode.
///
/// # Errors
///
/// Returns an error if the tree cannot be loaded or the file cannot be
/// written.
pub fn run_export(args: &ExportArgs, output: OutputMode, project_root: &Path) -> Result<()> {
    let session = Session::open(project_root, output)?;
    let tree = StoredTree::new(session.graph.snapshot(), Utc::now())
        .map_err(|e| fail(output, &CliError::from(&e)))?;
    let mut text = serde_json::to_string_pretty(&tree).context("failed to encode tree")?;
    text.push('\n');

    let Some(path) = &args.output else {
        print!("{text}");
        return Ok(());
    };
    std::fs::write(path, text).with_context(|| format!("failed to write {}", path.display()))?;

    let result = ExportOutput {
        ok: true,
        path: path.display().to_string(),
        persons: tree.snapshot.persons.len(),
        relationships: tree.snapshot.relationships.len(),
        content_hash: tree.content_hash,
    };
    render(output, &result, |r, w| {
        writeln!(
            w,
            "Exported {} people and {} relationships to {}",
            r.persons, r.relationships, r.path
        )
    })
}
