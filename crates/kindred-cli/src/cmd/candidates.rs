use std::path::Path;

use anyhow::Result;
use clap::Args;
use kindred_core::model::{PersonId, RelationshipKind};

use super::Session;
use super::list::PersonRow;
use crate::output::{CliError, OutputMode, fail, render_list};

#[derive(Args, Debug)]
pub struct CandidatesArgs {
    /// Person who would gain the relationship.
    pub id: String,

    /// Relationship kind: `parent-child` or `spouse`.
    #[arg(long, short = 'k', default_value = "parent-child")]
    pub kind: RelationshipKind,
}

/// Execute `kin candidates`: who could still be connected to `id`.
///
/// For spouse links only existing spouses are excluded. For parent-child
/// links anyone already connected in any way is excluded.
///
/// # Errors
///
/// Returns an error if the person does not exist.
pub fn run_candidates(args: &CandidatesArgs, output: OutputMode, project_root: &Path) -> Result<()> {
    let session = Session::open(project_root, output)?;
    let graph = &session.graph;
    let id = PersonId::new(args.id.as_str());

    let rows: Vec<PersonRow> = graph
        .available_candidates(&id, args.kind)
        .map_err(|e| fail(output, &CliError::from(&e)))?
        .into_iter()
        .map(|p| PersonRow::new(graph, p))
        .collect();

    if rows.is_empty() && !output.is_json() {
        println!("Nobody left to connect to {id} as {}.", args.kind);
        return Ok(());
    }
    render_list(&rows, output)?;
    Ok(())
}
