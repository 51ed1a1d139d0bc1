use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use clap::Args;
use kindred_core::model::{Biography, ConnectionRole, PersonId};
use kindred_core::{AddPersonError, AddPersonRequest, AddedPerson};
use tracing::{info, warn};

use super::{BiographyArgs, Session, read_input};
use crate::output::{CliError, OutputMode, fail, pretty_kv, render};

#[derive(Args, Debug, Default)]
pub struct AddArgs {
    /// Preferred display name.
    #[arg(long, required_unless_present = "request")]
    pub goes_by: Option<String>,

    #[command(flatten)]
    pub bio: BiographyArgs,

    /// Existing person who becomes a parent of the new person (repeatable).
    #[arg(long = "parent", value_name = "ID")]
    pub parents: Vec<String>,

    /// Existing person who becomes a spouse of the new person (repeatable).
    #[arg(long = "spouse", value_name = "ID")]
    pub spouses: Vec<String>,

    /// Existing person who becomes a child of the new person (repeatable).
    #[arg(long = "child", value_name = "ID")]
    pub children: Vec<String>,

    /// Read an add-person request (`{ data, connections }`) from a JSON
    /// file, or `-` for stdin. Other flags are ignored.
    #[arg(long, value_name = "FILE", conflicts_with = "goes_by")]
    pub request: Option<PathBuf>,

    /// Undo the whole add if any connection fails.
    #[arg(long)]
    pub atomic: bool,
}

impl AddArgs {
    /// Build the request from flags. Connections run parents, then spouses,
    /// then children.
    fn to_request(&self) -> AddPersonRequest {
        let mut data = Biography::named(self.goes_by.clone().unwrap_or_default());
        self.bio.apply(&mut data);

        let groups = [
            (&self.parents, ConnectionRole::Parent),
            (&self.spouses, ConnectionRole::Spouse),
            (&self.children, ConnectionRole::Child),
        ];
        groups
            .into_iter()
            .flat_map(|(ids, role)| ids.iter().map(move |id| (id, role)))
            .fold(AddPersonRequest::new(data), |req, (id, role)| {
                req.with_connection(PersonId::new(id.as_str()), role)
            })
    }
}

/// Execute `kin add`.
///
/// Without `--atomic`, a failed connection keeps the person and any links
/// made before it; the tree is saved and the command still exits non-zero.
///
/// # Errors
///
/// Returns an error if the person is invalid, any connection fails, or the
/// tree cannot be loaded or saved.
pub fn run_add(args: &AddArgs, output: OutputMode, project_root: &Path) -> Result<()> {
    // 1. Build the request.
    let request = match &args.request {
        Some(path) => {
            let text = read_input(path)?;
            serde_json::from_str::<AddPersonRequest>(&text)
                .with_context(|| format!("invalid add-person request in {}", path.display()))?
        }
        None => args.to_request(),
    };

    // 2. Apply it.
    let mut session = Session::open(project_root, output)?;
    let added = match session.graph.apply_add_request(request) {
        Ok(added) => added,
        Err(AddPersonError::Rejected(err)) => {
            return Err(fail(output, &CliError::from(&err)));
        }
        Err(err @ AddPersonError::PartiallyConnected { .. }) => {
            return Err(handle_partial(&mut session, &err, args.atomic, output));
        }
    };

    // 3. Persist.
    session.maybe_auto_layout(output)?;
    session.save(output)?;
    info!(person = %added.person.id, links = added.relationships.len(), "added person");

    let added = AddedPerson {
        person: session
            .graph
            .person(&added.person.id)
            .cloned()
            .unwrap_or(added.person),
        relationships: added.relationships,
    };
    render(output, &added, |a, w| {
        writeln!(w, "Added {} ({})", a.person.id, a.person.display_name())?;
        for rel in &a.relationships {
            pretty_kv(
                w,
                &rel.kind.to_string(),
                format!("{} → {} [{}]", rel.source, rel.target, rel.id),
            )?;
        }
        Ok(())
    })
}

fn handle_partial(
    session: &mut Session,
    err: &AddPersonError,
    atomic: bool,
    output: OutputMode,
) -> anyhow::Error {
    let AddPersonError::PartiallyConnected { person, .. } = err else {
        return fail(output, &CliError::from(err));
    };

    let mut cli_err = CliError::from(err);
    if atomic {
        session.graph.remove_person(&person.id);
        cli_err.message = format!("{} (rolled back, nothing saved)", err.graph_error());
    } else {
        warn!(person = %person.id, "keeping partially connected person");
        if let Err(save_err) = session.save(output) {
            return save_err;
        }
    }
    fail(output, &cli_err)
}
