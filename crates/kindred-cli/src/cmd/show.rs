use std::path::Path;

use anyhow::Result;
use clap::Args;
use kindred_core::GraphError;
use kindred_core::model::{Connection, Person, PersonId};
use serde::Serialize;

use super::Session;
use crate::output::{
    CliError, OutputMode, fail, pretty_kv, pretty_section, render_mode,
};

#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Person to show.
    pub id: String,
}

#[derive(Debug, Serialize)]
struct ShowOutput {
    person: Person,
    connections: Vec<ConnectionView>,
    ancestors: Vec<PersonId>,
}

#[derive(Debug, Serialize)]
struct ConnectionView {
    #[serde(flatten)]
    connection: Connection,
    name: String,
}

/// Execute `kin show`: one person with every relationship from their side.
///
/// # Errors
///
/// Returns an error if the person does not exist.
pub fn run_show(args: &ShowArgs, output: OutputMode, project_root: &Path) -> Result<()> {
    let session = Session::open(project_root, output)?;
    let graph = &session.graph;
    let id = PersonId::new(args.id.as_str());

    let Some(person) = graph.person(&id) else {
        return Err(fail(output, &CliError::from(&GraphError::UnknownPerson(id))));
    };

    let connections = graph
        .relationships_of(&id)
        .into_iter()
        .map(|connection| ConnectionView {
            name: graph
                .person(&connection.other)
                .map_or("?", Person::display_name)
                .to_string(),
            connection,
        })
        .collect();
    let result = ShowOutput {
        person: person.clone(),
        connections,
        ancestors: graph.ancestors_of(&id).into_iter().cloned().collect(),
    };

    render_mode(
        output,
        &result,
        |r, w| {
            writeln!(w, "{}\t{}", r.person.id, r.person.display_name())?;
            for c in &r.connections {
                writeln!(
                    w,
                    "{}\t{}\t{}\t{}",
                    c.connection.role, c.connection.other, c.name, c.connection.relationship.id
                )?;
            }
            Ok(())
        },
        |r, w| {
            let bio = &r.person.data;
            pretty_section(w, &format!("{} [{}]", r.person.display_name(), r.person.id))?;
            let full = bio.full_name();
            if !full.is_empty() {
                pretty_kv(w, "name", full)?;
            }
            if let Some(gender) = &bio.gender {
                pretty_kv(w, "gender", gender)?;
            }
            if let Some(born) = bio.birth_date {
                pretty_kv(w, "born", born.format("%Y-%m-%d").to_string())?;
            }
            if let Some(died) = bio.death_date {
                pretty_kv(w, "died", died.format("%Y-%m-%d").to_string())?;
            }
            if !bio.notes.is_empty() {
                pretty_kv(w, "notes", &bio.notes)?;
            }
            pretty_kv(
                w,
                "position",
                format!("({}, {})", r.person.position.x, r.person.position.y),
            )?;

            if !r.connections.is_empty() {
                writeln!(w)?;
                pretty_section(w, "Relationships")?;
                for c in &r.connections {
                    pretty_kv(
                        w,
                        &c.connection.role.to_string(),
                        format!("{} {} [{}]", c.connection.other, c.name, c.connection.relationship.id),
                    )?;
                }
            }
            if !r.ancestors.is_empty() {
                writeln!(w)?;
                let ids: Vec<&str> = r.ancestors.iter().map(PersonId::as_str).collect();
                pretty_kv(w, "ancestors", ids.join(", "))?;
            }
            Ok(())
        },
    )
}
