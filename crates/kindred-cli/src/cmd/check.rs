use std::path::Path;

use anyhow::Result;
use clap::Args;
use kindred_core::FamilyGraph;
use kindred_core::graph::find_cycle;
use kindred_core::model::PersonId;
use kindred_core::store::StoreError;
use kindred_layout::LayoutEngine;
use serde::Serialize;
use tracing::warn;

use super::{find_store, load_config};
use crate::output::{CliError, OutputMode, fail, pretty_kv, pretty_section, render};

#[derive(Args, Debug, Default)]
pub struct CheckArgs {}

#[derive(Debug, Serialize)]
struct Problem {
    error_code: &'static str,
    message: String,
}

#[derive(Debug, Serialize)]
struct CheckOutput {
    ok: bool,
    persons: usize,
    relationships: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    content_hash: Option<String>,
    problems: Vec<Problem>,
}

impl Problem {
    fn from_store(err: &StoreError) -> Self {
        Self {
            error_code: err.code().code(),
            message: err.to_string(),
        }
    }
}

/// Execute `kin check`: verify the stored tree without changing it.
///
/// Checks the file hash and version, cycle-freedom of parent-child links,
/// graph validity (names, ids, duplicates) and that the tree can be laid
/// out.
///
/// # Errors
///
/// Returns an error when any problem is found.
pub fn run_check(_args: &CheckArgs, output: OutputMode, project_root: &Path) -> Result<()> {
    let store = find_store(project_root, output)?;
    let config = load_config(&store, output)?;
    let mut problems = Vec::new();

    let tree = match store.load() {
        Ok(tree) => tree,
        Err(err) => {
            problems.push(Problem::from_store(&err));
            None
        }
    };
    let content_hash = tree.as_ref().map(|t| t.content_hash.clone());
    let snapshot = tree.map(|t| t.snapshot).unwrap_or_default();
    let (persons, relationships) = (snapshot.persons.len(), snapshot.relationships.len());

    if let Some(cycle) = find_cycle(&snapshot) {
        let path: Vec<&str> = cycle.iter().map(PersonId::as_str).collect();
        problems.push(Problem {
            error_code: kindred_core::ErrorCode::CycleDetected.code(),
            message: format!("parent-child cycle: {}", path.join(" → ")),
        });
    } else {
        if let Err(err) = LayoutEngine::new(config.layout).compute(&snapshot) {
            problems.push(Problem {
                error_code: err.code().code(),
                message: err.to_string(),
            });
        }
        if let Err(err) = FamilyGraph::from_snapshot(snapshot) {
            problems.push(Problem {
                error_code: err.code().code(),
                message: err.to_string(),
            });
        }
    }

    for problem in &problems {
        warn!(code = problem.error_code, "{}", problem.message);
    }

    let ok = problems.is_empty();
    let result = CheckOutput {
        ok,
        persons,
        relationships,
        content_hash,
        problems,
    };
    render(output, &result, |r, w| {
        pretty_section(w, "Tree check")?;
        pretty_kv(w, "persons", r.persons.to_string())?;
        pretty_kv(w, "links", r.relationships.to_string())?;
        if let Some(hash) = &r.content_hash {
            pretty_kv(w, "hash", hash)?;
        }
        if r.ok {
            writeln!(w, "OK")
        } else {
            for p in &r.problems {
                writeln!(w, "  [{}] {}", p.error_code, p.message)?;
            }
            Ok(())
        }
    })?;

    if ok {
        Ok(())
    } else {
        Err(fail(
            output,
            &CliError::new(format!("{} problem(s) found", result.problems.len())),
        ))
    }
}
