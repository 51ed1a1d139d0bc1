use std::path::Path;

use anyhow::{Context as _, Result};
use clap::Args;
use kindred_core::seed::initial_family;
use kindred_core::snapshot::Snapshot;
use kindred_core::store::TreeStore;
use serde::Serialize;

use crate::output::{CliError, OutputMode, fail, pretty_kv, render};

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Start with no people instead of the sample family.
    #[arg(long)]
    pub empty: bool,

    /// Overwrite an existing tree.
    #[arg(long)]
    pub force: bool,
}

const CONFIG_TOML: &str = "[layout]\n\
    direction = \"top-bottom\"\n\
    node_width = 220.0\n\
    node_height = 100.0\n\
    node_sep = 80.0\n\
    max_sweeps = 24\n\
    \n\
    [graph]\n\
    auto_layout = false\n";

#[derive(Debug, Serialize)]
struct InitOutput {
    ok: bool,
    path: String,
    persons: usize,
    relationships: usize,
}

/// Execute `kin init`. Creates the project skeleton:
///
/// ```text
/// .kindred/
///   config.toml   (default project config template)
///   tree.json     (sample family, or empty with --empty)
/// ```
///
/// # Errors
///
/// Returns an error if a tree already exists and `--force` is not set, or if
/// any filesystem operation fails.
pub fn run_init(args: &InitArgs, output: OutputMode, project_root: &Path) -> Result<()> {
    let store = TreeStore::open(project_root);

    if store.tree_path().exists() && !args.force {
        return Err(fail(
            output,
            &CliError {
                message: format!("{} already exists", store.tree_path().display()),
                suggestion: Some("Use `kin init --force` to start over.".to_string()),
                error_code: None,
            },
        ));
    }

    store.init().map_err(|e| fail(output, &CliError::from(&e)))?;

    let config_path = store.dir().join("config.toml");
    if !config_path.exists() {
        std::fs::write(&config_path, CONFIG_TOML)
            .with_context(|| format!("Failed to write {}", config_path.display()))?;
    }

    let snapshot = if args.empty {
        Snapshot::default()
    } else {
        initial_family()
    };
    store
        .save(&snapshot)
        .map_err(|e| fail(output, &CliError::from(&e)))?;

    let result = InitOutput {
        ok: true,
        path: store.dir().display().to_string(),
        persons: snapshot.persons.len(),
        relationships: snapshot.relationships.len(),
    };
    render(output, &result, |r, w| {
        writeln!(w, "Initialized family tree in {}", r.path)?;
        pretty_kv(w, "persons", r.persons.to_string())?;
        pretty_kv(w, "links", r.relationships.to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use kindred_core::config::ProjectConfig;

    #[test]
    fn config_template_parses_to_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let kindred = dir.path().join(".kindred");
        std::fs::create_dir_all(&kindred).expect("mkdir");
        std::fs::write(kindred.join("config.toml"), CONFIG_TOML).expect("write");
        let parsed = kindred_core::config::load_project_config(dir.path()).expect("parse template");
        assert_eq!(parsed, ProjectConfig::default());
    }

    #[test]
    fn init_writes_seed_tree_and_config() {
        let dir = tempfile::tempdir().expect("tempdir");
        let args = InitArgs {
            empty: false,
            force: false,
        };
        run_init(&args, OutputMode::Json, dir.path()).expect("init");

        let store = TreeStore::open(dir.path());
        let tree = store.load().expect("load").expect("tree exists");
        assert_eq!(tree.snapshot, initial_family());
        assert!(store.dir().join("config.toml").exists());
    }

    #[test]
    fn init_refuses_to_clobber_without_force() {
        let dir = tempfile::tempdir().expect("tempdir");
        let args = InitArgs {
            empty: true,
            force: false,
        };
        run_init(&args, OutputMode::Json, dir.path()).expect("first init");
        assert!(run_init(&args, OutputMode::Json, dir.path()).is_err());

        let forced = InitArgs {
            empty: false,
            force: true,
        };
        run_init(&forced, OutputMode::Json, dir.path()).expect("forced init");
        let tree = TreeStore::open(dir.path()).load().expect("load").expect("tree");
        assert_eq!(tree.snapshot.persons.len(), 3);
    }
}
