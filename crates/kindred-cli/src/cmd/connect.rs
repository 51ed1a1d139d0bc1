use std::path::Path;

use anyhow::Result;
use clap::Args;
use kindred_core::model::{PersonId, RelationshipKind};

use super::Session;
use crate::output::{CliError, OutputMode, fail, render};

#[derive(Args, Debug)]
pub struct ConnectArgs {
    /// Source person (the parent, for parent-child links).
    pub source: String,

    /// Target person (the child, for parent-child links).
    pub target: String,

    /// Relationship kind: `parent-child` or `spouse`.
    #[arg(long, short = 'k', default_value = "parent-child")]
    pub kind: RelationshipKind,
}

/// Execute `kin connect`.
///
/// # Errors
///
/// Returns an error for unknown persons, self links, duplicates, or a
/// parent-child link that would make someone their own ancestor.
pub fn run_connect(args: &ConnectArgs, output: OutputMode, project_root: &Path) -> Result<()> {
    let mut session = Session::open(project_root, output)?;
    let source = PersonId::new(args.source.as_str());
    let target = PersonId::new(args.target.as_str());

    let relationship = session
        .graph
        .connect(&source, &target, args.kind)
        .map_err(|e| fail(output, &CliError::from(&e)))?;
    session.maybe_auto_layout(output)?;
    session.save(output)?;

    render(output, &relationship, |r, w| {
        writeln!(w, "Connected {} → {} as {} [{}]", r.source, r.target, r.kind, r.id)
    })
}
