use std::path::Path;

use anyhow::Result;
use clap::Args;
use kindred_core::model::{Relationship, RelationshipId};
use serde::Serialize;

use super::Session;
use crate::output::{OutputMode, render};

#[derive(Args, Debug)]
pub struct DisconnectArgs {
    /// Relationship id, as shown by `kin show`.
    pub id: String,
}

#[derive(Debug, Serialize)]
struct DisconnectOutput {
    ok: bool,
    removed: Option<Relationship>,
}

/// Execute `kin disconnect`. An unknown id is reported but not an error.
///
/// # Errors
///
/// Returns an error if the tree cannot be loaded or saved.
pub fn run_disconnect(args: &DisconnectArgs, output: OutputMode, project_root: &Path) -> Result<()> {
    let mut session = Session::open(project_root, output)?;
    let removed = session
        .graph
        .disconnect(&RelationshipId::new(args.id.as_str()));
    if removed.is_some() {
        session.save(output)?;
    }

    let result = DisconnectOutput { ok: true, removed };
    render(output, &result, |r, w| match &r.removed {
        Some(rel) => writeln!(
            w,
            "Removed {} ({} {} → {})",
            rel.id, rel.kind, rel.source, rel.target
        ),
        None => writeln!(w, "No relationship '{}'; nothing to do", args.id),
    })
}
