use std::path::Path;

use anyhow::Result;
use clap::Args;
use kindred_core::model::{Person, PersonId};
use serde::Serialize;

use super::Session;
use crate::output::{OutputMode, render};

#[derive(Args, Debug)]
pub struct RemoveArgs {
    /// Person to remove, together with every relationship touching them.
    pub id: String,
}

#[derive(Debug, Serialize)]
struct RemoveOutput {
    ok: bool,
    removed: Option<Person>,
    relationships_removed: usize,
}

/// Execute `kin remove`. An unknown id is reported but not an error.
///
/// # Errors
///
/// Returns an error if the tree cannot be loaded or saved.
pub fn run_remove(args: &RemoveArgs, output: OutputMode, project_root: &Path) -> Result<()> {
    let mut session = Session::open(project_root, output)?;
    let id = PersonId::new(args.id.as_str());

    let before = session.graph.relationships().len();
    let removed = session.graph.remove_person(&id);
    let relationships_removed = before - session.graph.relationships().len();
    if removed.is_some() {
        session.save(output)?;
    }

    let result = RemoveOutput {
        ok: true,
        removed,
        relationships_removed,
    };
    render(output, &result, |r, w| match &r.removed {
        Some(person) => writeln!(
            w,
            "Removed {} ({}) and {} relationship(s)",
            person.id,
            person.display_name(),
            r.relationships_removed
        ),
        None => writeln!(w, "No person '{}'; nothing to do", args.id),
    })
}
