use std::io::{self, Write};
use std::path::Path;

use anyhow::Result;
use clap::Args;
use kindred_core::FamilyGraph;
use kindred_core::model::{Person, Position};
use serde::Serialize;

use super::Session;
use crate::output::{OutputMode, Renderable, render_list};

#[derive(Args, Debug, Default)]
pub struct ListArgs {
    /// Only show people whose display or full name contains this text
    /// (case-insensitive).
    #[arg(long, short = 'm')]
    pub matching: Option<String>,
}

/// One line of `kin list` output.
#[derive(Debug, Clone, Serialize)]
pub struct PersonRow {
    pub id: String,
    pub name: String,
    pub full_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub born: Option<String>,
    pub position: Position,
    pub parents: usize,
    pub spouses: usize,
    pub children: usize,
}

impl PersonRow {
    pub fn new(graph: &FamilyGraph, person: &Person) -> Self {
        Self {
            id: person.id.to_string(),
            name: person.display_name().to_string(),
            full_name: person.data.full_name(),
            born: person
                .data
                .birth_date
                .map(|d| d.format("%Y-%m-%d").to_string()),
            position: person.position,
            parents: graph.parents_of(&person.id).len(),
            spouses: graph.spouses_of(&person.id).len(),
            children: graph.children_of(&person.id).len(),
        }
    }

    fn matches(&self, needle: &str) -> bool {
        self.name.to_lowercase().contains(needle) || self.full_name.to_lowercase().contains(needle)
    }
}

impl Renderable for PersonRow {
    fn write_pretty(&self, w: &mut dyn Write) -> io::Result<()> {
        write!(w, "{:<6} {}", self.id, self.name)?;
        if !self.full_name.is_empty() && self.full_name != self.name {
            write!(w, " ({})", self.full_name)?;
        }
        if let Some(born) = &self.born {
            write!(w, "  b. {born}")?;
        }
        writeln!(w)
    }

    fn write_row(&self, w: &mut dyn Write) -> io::Result<()> {
        writeln!(
            w,
            "{}  {}  {}  {}  {}",
            self.id, self.name, self.parents, self.spouses, self.children
        )
    }

    fn columns() -> &'static [&'static str] {
        &["ID", "NAME", "PARENTS", "SPOUSES", "CHILDREN"]
    }
}

/// Execute `kin list`.
///
/// # Errors
///
/// Returns an error if the tree cannot be loaded.
pub fn run_list(args: &ListArgs, output: OutputMode, project_root: &Path) -> Result<()> {
    let session = Session::open(project_root, output)?;
    let needle = args.matching.as_deref().map(str::to_lowercase);

    let rows: Vec<PersonRow> = session
        .graph
        .persons()
        .iter()
        .map(|p| PersonRow::new(&session.graph, p))
        .filter(|row| needle.as_deref().is_none_or(|n| row.matches(n)))
        .collect();

    if rows.is_empty() && !output.is_json() {
        println!("No people in the tree. Add one with `kin add --goes-by <name>`.");
        return Ok(());
    }
    render_list(&rows, output)?;
    Ok(())
}
