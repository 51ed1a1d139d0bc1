use std::path::Path;

use anyhow::Result;
use clap::Args;
use kindred_core::snapshot::Snapshot;
use serde::Serialize;

use super::find_store;
use crate::output::{CliError, OutputMode, fail, render};

#[derive(Args, Debug, Default)]
pub struct ResetArgs {
    /// Leave an empty tree instead of the sample family.
    #[arg(long)]
    pub empty: bool,
}

#[derive(Debug, Serialize)]
struct ResetOutput {
    ok: bool,
    cleared: bool,
    empty: bool,
}

/// Execute `kin reset`: discard the stored tree.
///
/// The next command sees the sample family again unless `--empty` is given.
///
/// # Errors
///
/// Returns an error if the tree file cannot be removed or written.
pub fn run_reset(args: &ResetArgs, output: OutputMode, project_root: &Path) -> Result<()> {
    let store = find_store(project_root, output)?;
    let cleared = store.clear().map_err(|e| fail(output, &CliError::from(&e)))?;
    if args.empty {
        store
            .save(&Snapshot::default())
            .map_err(|e| fail(output, &CliError::from(&e)))?;
    }

    let result = ResetOutput {
        ok: true,
        cleared,
        empty: args.empty,
    };
    render(output, &result, |r, w| {
        if r.empty {
            writeln!(w, "Tree reset to empty")
        } else {
            writeln!(w, "Tree reset to the sample family")
        }
    })
}
