use std::path::Path;

use anyhow::Result;
use clap::Args;
use kindred_core::GraphError;
use kindred_core::model::PersonId;

use super::{BiographyArgs, Session};
use crate::output::{CliError, OutputMode, fail, pretty_kv, render};

#[derive(Args, Debug)]
pub struct EditArgs {
    /// Person to edit.
    pub id: String,

    /// New preferred display name.
    #[arg(long)]
    pub goes_by: Option<String>,

    #[command(flatten)]
    pub bio: BiographyArgs,

    /// Remove the recorded death date.
    #[arg(long, conflicts_with = "died")]
    pub clear_died: bool,
}

/// Execute `kin edit`: overlay the given fields onto a person's record.
///
/// # Errors
///
/// Returns an error if the person does not exist or the edited record has
/// no preferred name.
pub fn run_edit(args: &EditArgs, output: OutputMode, project_root: &Path) -> Result<()> {
    let mut session = Session::open(project_root, output)?;
    let id = PersonId::new(args.id.as_str());

    let Some(existing) = session.graph.person(&id) else {
        return Err(fail(output, &CliError::from(&GraphError::UnknownPerson(id))));
    };
    let mut data = existing.data.clone();
    if let Some(goes_by) = &args.goes_by {
        data.goes_by.clone_from(goes_by);
    }
    args.bio.apply(&mut data);
    if args.clear_died {
        data.death_date = None;
    }

    let person = session
        .graph
        .update_person(&id, data)
        .map_err(|e| fail(output, &CliError::from(&e)))?;
    session.save(output)?;

    render(output, &person, |p, w| {
        writeln!(w, "Updated {} ({})", p.id, p.display_name())?;
        let full = p.data.full_name();
        if !full.is_empty() {
            pretty_kv(w, "name", full)?;
        }
        Ok(())
    })
}
