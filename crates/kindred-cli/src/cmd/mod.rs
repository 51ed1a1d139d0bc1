//! Subcommand handlers.
//!
//! Each handler takes its parsed args, the resolved [`OutputMode`] and the
//! directory `kin` was started from. Handlers that touch the tree go through
//! [`Session`], which finds the project, loads config and graph, and writes
//! the tree back.

pub mod add;
pub mod candidates;
pub mod check;
pub mod completions;
pub mod connect;
pub mod disconnect;
pub mod edit;
pub mod export;
pub mod import;
pub mod init;
pub mod layout;
pub mod list;
pub mod move_cmd;
pub mod remove;
pub mod reset;
pub mod show;

use std::path::Path;

use anyhow::Context as _;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use clap::Args;
use kindred_core::ErrorCode;
use kindred_core::FamilyGraph;
use kindred_core::config::{self, ProjectConfig};
use kindred_core::model::Biography;
use kindred_core::store::{SaveOutcome, TreeStore};
use kindred_layout::LayoutEngine;
use tracing::{debug, error};

use crate::output::{CliError, OutputMode, fail};

/// An opened project: store handle, config, and the validated graph.
pub struct Session {
    pub store: TreeStore,
    pub config: ProjectConfig,
    pub graph: FamilyGraph,
}

impl Session {
    /// Find the nearest `.kindred/` above `start` and load its tree.
    ///
    /// A project without a `tree.json` yields the seed family.
    pub fn open(start: &Path, output: OutputMode) -> anyhow::Result<Self> {
        let store = find_store(start, output)?;
        let config = load_config(&store, output)?;
        let snapshot = store
            .load_or_seed()
            .map_err(|e| fail(output, &CliError::from(&e)))?;
        let graph =
            FamilyGraph::from_snapshot(snapshot).map_err(|e| fail(output, &CliError::from(&e)))?;
        debug!(persons = graph.len(), dir = %store.dir().display(), "opened session");
        Ok(Self {
            store,
            config,
            graph,
        })
    }

    /// Open the project around a graph that replaces the stored tree.
    ///
    /// The existing `tree.json` is never read, so a corrupt tree can still
    /// be overwritten.
    pub fn replacing(start: &Path, output: OutputMode, graph: FamilyGraph) -> anyhow::Result<Self> {
        let store = find_store(start, output)?;
        let config = load_config(&store, output)?;
        debug!(persons = graph.len(), dir = %store.dir().display(), "replacing tree");
        Ok(Self {
            store,
            config,
            graph,
        })
    }

    /// Re-run the layout if `[graph] auto_layout` is enabled.
    ///
    /// Returns `true` when positions were recomputed.
    pub fn maybe_auto_layout(&mut self, output: OutputMode) -> anyhow::Result<bool> {
        if !self.config.graph.auto_layout {
            return Ok(false);
        }
        let engine = LayoutEngine::new(self.config.layout.clone());
        let placement = engine.compute(&self.graph.snapshot()).map_err(|e| {
            error!(%e, "layout rejected a tree the graph accepted");
            fail(output, &CliError::from(&e))
        })?;
        self.graph
            .apply_positions(placement.positions())
            .map_err(|e| fail(output, &CliError::from(&e)))?;
        Ok(true)
    }

    /// Write the current graph back to `tree.json`.
    pub fn save(&self, output: OutputMode) -> anyhow::Result<SaveOutcome> {
        self.store
            .save(&self.graph.snapshot())
            .map_err(|e| fail(output, &CliError::from(&e)))
    }
}

/// Nearest initialized store above `start`.
pub fn find_store(start: &Path, output: OutputMode) -> anyhow::Result<TreeStore> {
    TreeStore::discover(start).ok_or_else(|| {
        fail(
            output,
            &CliError::coded(
                format!("no family tree found at or above {}", start.display()),
                ErrorCode::NotInitialized,
            ),
        )
    })
}

/// Project config for `store`, whose directory is `<root>/.kindred`.
pub fn load_config(store: &TreeStore, output: OutputMode) -> anyhow::Result<ProjectConfig> {
    let root = store.dir().parent().unwrap_or_else(|| Path::new("."));
    config::load_project_config(root).map_err(|e| {
        fail(
            output,
            &CliError::coded(format!("{e:#}"), ErrorCode::ConfigParseError),
        )
    })
}

/// Parse `YYYY-MM-DD` (midnight UTC) or a full RFC 3339 timestamp.
pub fn parse_date(input: &str) -> Result<DateTime<Utc>, String> {
    let input = input.trim();
    if let Ok(date) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        return Ok(date.and_time(NaiveTime::MIN).and_utc());
    }
    DateTime::parse_from_rfc3339(input)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| format!("invalid date '{input}' (expected YYYY-MM-DD or RFC 3339)"))
}

/// Biographical flags shared by `add` and `edit`.
///
/// Unset flags leave the corresponding field alone.
#[derive(Args, Debug, Default, Clone)]
pub struct BiographyArgs {
    /// Given name.
    #[arg(long)]
    pub first_name: Option<String>,

    #[arg(long)]
    pub middle_name: Option<String>,

    /// Family name.
    #[arg(long)]
    pub last_name: Option<String>,

    #[arg(long)]
    pub gender: Option<String>,

    /// Birth date (YYYY-MM-DD or RFC 3339).
    #[arg(long, value_parser = parse_date)]
    pub born: Option<DateTime<Utc>>,

    /// Death date (YYYY-MM-DD or RFC 3339).
    #[arg(long, value_parser = parse_date)]
    pub died: Option<DateTime<Utc>>,

    #[arg(long)]
    pub notes: Option<String>,

    /// Image URL or data URI.
    #[arg(long)]
    pub photo: Option<String>,
}

impl BiographyArgs {
    /// Overlay every flag that was given onto `bio`.
    pub fn apply(&self, bio: &mut Biography) {
        if let Some(v) = &self.first_name {
            bio.first_name.clone_from(v);
        }
        if let Some(v) = &self.middle_name {
            bio.middle_name.clone_from(v);
        }
        if let Some(v) = &self.last_name {
            bio.last_name.clone_from(v);
        }
        if let Some(v) = &self.gender {
            bio.gender = (!v.trim().is_empty()).then(|| v.clone());
        }
        if self.born.is_some() {
            bio.birth_date = self.born;
        }
        if self.died.is_some() {
            bio.death_date = self.died;
        }
        if let Some(v) = &self.notes {
            bio.notes.clone_from(v);
        }
        if let Some(v) = &self.photo {
            bio.photo.clone_from(v);
        }
    }
}

/// Read a file argument, treating `-` as stdin.
pub fn read_input(path: &Path) -> anyhow::Result<String> {
    if path == Path::new("-") {
        let mut text = String::new();
        std::io::Read::read_to_string(&mut std::io::stdin(), &mut text)
            .context("failed to read stdin")?;
        return Ok(text);
    }
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

/// Short label for a save outcome in human output.
pub const fn save_label(outcome: &SaveOutcome) -> &'static str {
    match outcome {
        SaveOutcome::Written { .. } => "saved",
        SaveOutcome::Unchanged => "unchanged",
    }
}
