use std::path::Path;

use anyhow::Result;
use clap::Args;
use kindred_core::model::{PersonId, Position};
use serde::Serialize;

use super::Session;
use crate::output::{CliError, OutputMode, fail, render};

#[derive(Args, Debug)]
pub struct MoveArgs {
    /// Person to move.
    pub id: String,

    /// New left edge.
    #[arg(allow_negative_numbers = true)]
    pub x: f64,

    /// New top edge.
    #[arg(allow_negative_numbers = true)]
    pub y: f64,
}

#[derive(Debug, Serialize)]
struct MoveOutput {
    ok: bool,
    id: PersonId,
    position: Position,
}

/// Execute `kin move`: pin a person's drawing position by hand.
///
/// # Errors
///
/// Returns an error if the person does not exist.
pub fn run_move(args: &MoveArgs, output: OutputMode, project_root: &Path) -> Result<()> {
    let mut session = Session::open(project_root, output)?;
    let id = PersonId::new(args.id.as_str());
    let position = Position::new(args.x, args.y);

    session
        .graph
        .set_position(&id, position)
        .map_err(|e| fail(output, &CliError::from(&e)))?;
    session.save(output)?;

    let result = MoveOutput {
        ok: true,
        id,
        position,
    };
    render(output, &result, |r, w| {
        writeln!(w, "Moved {} to ({}, {})", r.id, r.position.x, r.position.y)
    })
}
