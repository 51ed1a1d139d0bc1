#![forbid(unsafe_code)]

mod cmd;
mod output;

use clap::{CommandFactory, Parser, Subcommand};
use output::{CliError, OutputMode, Reported, render_error, resolve_output_mode};
use std::env;
use std::process::ExitCode;
use tracing::{debug, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    name = "kin",
    author,
    version,
    about = "kin: family tree editor with automatic generational layout",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON output (shorthand for `--format json`).
    #[arg(long, global = true)]
    json: bool,

    /// Output format: pretty, text or json.
    #[arg(long, global = true, value_enum)]
    format: Option<OutputMode>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        next_help_heading = "Lifecycle",
        about = "Create a family tree",
        long_about = "Create .kindred/ in the current directory, seeded with a sample family.",
        after_help = "EXAMPLES:\n    # Start from the sample family\n    kin init\n\n    # Start from nothing\n    kin init --empty"
    )]
    Init(cmd::init::InitArgs),

    #[command(
        next_help_heading = "Edit",
        about = "Add a person",
        long_about = "Add a person and connect them to people already in the tree.\n\nConnections are made in order: parents, then spouses, then children.",
        after_help = "EXAMPLES:\n    # Add a grandchild of John via Sarah\n    kin add --goes-by Emma --last-name Smith --parent 2\n\n    # Add a spouse, undoing everything if the link fails\n    kin add --goes-by Linda --spouse 1 --atomic\n\n    # Apply a JSON request\n    kin add --request person.json --json"
    )]
    Add(cmd::add::AddArgs),

    #[command(
        next_help_heading = "Edit",
        about = "Edit a person's details",
        after_help = "EXAMPLES:\n    # Fix a surname\n    kin edit 3 --last-name Smyth\n\n    # Record a death date\n    kin edit 1 --died 2020-03-01"
    )]
    Edit(cmd::edit::EditArgs),

    #[command(
        next_help_heading = "Edit",
        about = "Link two people",
        long_about = "Create a parent-child or spouse relationship.\n\nFor parent-child links the first person is the parent.",
        after_help = "EXAMPLES:\n    # John is Mike's parent\n    kin connect 1 3\n\n    # Sarah and p4 are married\n    kin connect 2 p4 --kind spouse"
    )]
    Connect(cmd::connect::ConnectArgs),

    #[command(
        next_help_heading = "Edit",
        about = "Remove a relationship",
        after_help = "EXAMPLES:\n    kin disconnect e1-2"
    )]
    Disconnect(cmd::disconnect::DisconnectArgs),

    #[command(
        next_help_heading = "Edit",
        about = "Remove a person and their relationships",
        after_help = "EXAMPLES:\n    kin remove p4"
    )]
    Remove(cmd::remove::RemoveArgs),

    #[command(
        next_help_heading = "Edit",
        about = "Set a person's drawing position",
        after_help = "EXAMPLES:\n    kin move 3 400 280"
    )]
    Move(cmd::move_cmd::MoveArgs),

    #[command(
        next_help_heading = "Read",
        about = "List people",
        after_help = "EXAMPLES:\n    # Everyone\n    kin list\n\n    # Name search\n    kin list --matching smith --json"
    )]
    List(cmd::list::ListArgs),

    #[command(
        next_help_heading = "Read",
        about = "Show one person",
        long_about = "Show a person's details and every relationship from their side.",
        after_help = "EXAMPLES:\n    kin show 1\n    kin show 1 --format text"
    )]
    Show(cmd::show::ShowArgs),

    #[command(
        next_help_heading = "Read",
        about = "List people who could be connected",
        after_help = "EXAMPLES:\n    # Who could become John's spouse\n    kin candidates 1 --kind spouse"
    )]
    Candidates(cmd::candidates::CandidatesArgs),

    #[command(
        next_help_heading = "Layout",
        about = "Arrange the tree into generations",
        after_help = "EXAMPLES:\n    # Recompute and save positions\n    kin layout\n\n    # Preview a left-to-right layout\n    kin layout --direction left-right --dry-run --json"
    )]
    Layout(cmd::layout::LayoutArgs),

    #[command(
        next_help_heading = "Maintenance",
        about = "Verify the stored tree",
        after_help = "EXAMPLES:\n    kin check\n    kin check --json"
    )]
    Check(cmd::check::CheckArgs),

    #[command(
        next_help_heading = "Maintenance",
        about = "Export the tree as JSON",
        after_help = "EXAMPLES:\n    kin export > family.json\n    kin export --output family.json"
    )]
    Export(cmd::export::ExportArgs),

    #[command(
        next_help_heading = "Maintenance",
        about = "Replace the tree with a JSON document",
        after_help = "EXAMPLES:\n    kin import family.json\n    kin import old-browser-export.json --layout"
    )]
    Import(cmd::import::ImportArgs),

    #[command(
        next_help_heading = "Maintenance",
        about = "Discard the stored tree",
        after_help = "EXAMPLES:\n    # Back to the sample family\n    kin reset\n\n    # Back to nothing\n    kin reset --empty"
    )]
    Reset(cmd::reset::ResetArgs),

    #[command(
        next_help_heading = "Maintenance",
        about = "Generate shell completions",
        after_help = "EXAMPLES:\n    kin completions bash > /etc/bash_completion.d/kin"
    )]
    Completions(cmd::completions::CompletionsArgs),
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("KINDRED_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if verbose || env::var("DEBUG").is_ok() {
            "kindred=debug,info"
        } else {
            "kindred=info,warn"
        })
    });

    let format = env::var("KINDRED_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let output = resolve_output_mode(cli.format, cli.json).unwrap_or_else(|err| {
        warn!("{err:#}; falling back to default output");
        if cli.json { OutputMode::Json } else { OutputMode::Pretty }
    });

    match run(cli, output) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            if !err.is::<Reported>() && render_error(output, &CliError::new(format!("{err:#}"))).is_err()
            {
                eprintln!("error: {err:#}");
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli, output: OutputMode) -> anyhow::Result<()> {
    let project_root = env::current_dir()?;
    debug!(?output, root = %project_root.display(), "starting");

    match cli.command {
        Commands::Init(args) => cmd::init::run_init(&args, output, &project_root),
        Commands::Add(args) => cmd::add::run_add(&args, output, &project_root),
        Commands::Edit(args) => cmd::edit::run_edit(&args, output, &project_root),
        Commands::Connect(args) => cmd::connect::run_connect(&args, output, &project_root),
        Commands::Disconnect(args) => {
            cmd::disconnect::run_disconnect(&args, output, &project_root)
        }
        Commands::Remove(args) => cmd::remove::run_remove(&args, output, &project_root),
        Commands::Move(args) => cmd::move_cmd::run_move(&args, output, &project_root),
        Commands::List(args) => cmd::list::run_list(&args, output, &project_root),
        Commands::Show(args) => cmd::show::run_show(&args, output, &project_root),
        Commands::Candidates(args) => {
            cmd::candidates::run_candidates(&args, output, &project_root)
        }
        Commands::Layout(args) => cmd::layout::run_layout(&args, output, &project_root),
        Commands::Check(args) => cmd::check::run_check(&args, output, &project_root),
        Commands::Export(args) => cmd::export::run_export(&args, output, &project_root),
        Commands::Import(args) => cmd::import::run_import(&args, output, &project_root),
        Commands::Reset(args) => cmd::reset::run_reset(&args, output, &project_root),
        Commands::Completions(args) => {
            let mut command = Cli::command();
            cmd::completions::run_completions(args.shell, &mut command)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kindred_core::config::LayoutDirection;
    use kindred_core::model::RelationshipKind;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn json_flag_parses_after_subcommand() {
        let cli = Cli::parse_from(["kin", "list", "--json"]);
        assert!(cli.json);
        assert!(matches!(cli.command, Commands::List(_)));
    }

    #[test]
    fn format_flag_takes_value_enum() {
        let cli = Cli::parse_from(["kin", "--format", "text", "show", "1"]);
        assert_eq!(cli.format, Some(OutputMode::Text));
        assert!(Cli::try_parse_from(["kin", "--format", "yaml", "list"]).is_err());
    }

    #[test]
    fn add_requires_a_name_or_request() {
        assert!(Cli::try_parse_from(["kin", "add"]).is_err());
        assert!(Cli::try_parse_from(["kin", "add", "--request", "p.json"]).is_ok());
        assert!(
            Cli::try_parse_from(["kin", "add", "--goes-by", "A", "--request", "p.json"]).is_err()
        );
    }

    #[test]
    fn add_collects_repeated_connections() {
        let cli = Cli::parse_from([
            "kin", "add", "--goes-by", "Emma", "--parent", "2", "--parent", "p4", "--atomic",
        ]);
        let Commands::Add(args) = cli.command else {
            panic!("expected add");
        };
        assert_eq!(args.parents, vec!["2", "p4"]);
        assert!(args.atomic);
    }

    #[test]
    fn connect_kind_defaults_to_parent_child() {
        let cli = Cli::parse_from(["kin", "connect", "1", "3"]);
        let Commands::Connect(args) = cli.command else {
            panic!("expected connect");
        };
        assert_eq!(args.kind, RelationshipKind::ParentChild);

        let cli = Cli::parse_from(["kin", "connect", "1", "p4", "-k", "spouse"]);
        let Commands::Connect(args) = cli.command else {
            panic!("expected connect");
        };
        assert_eq!(args.kind, RelationshipKind::Spouse);
    }

    #[test]
    fn layout_direction_accepts_aliases() {
        let cli = Cli::parse_from(["kin", "layout", "--direction", "lr", "--dry-run"]);
        let Commands::Layout(args) = cli.command else {
            panic!("expected layout");
        };
        assert_eq!(args.direction, Some(LayoutDirection::LeftRight));
        assert!(args.dry_run);
    }

    #[test]
    fn move_accepts_negative_coordinates() {
        let cli = Cli::parse_from(["kin", "move", "3", "-40", "12.5"]);
        let Commands::Move(args) = cli.command else {
            panic!("expected move");
        };
        assert!((args.x + 40.0).abs() < f64::EPSILON);
        assert!((args.y - 12.5).abs() < f64::EPSILON);
    }

    #[test]
    fn born_flag_is_parsed_as_date() {
        assert!(Cli::try_parse_from(["kin", "add", "--goes-by", "A", "--born", "1990-02-30"]).is_err());
        let cli = Cli::parse_from(["kin", "edit", "1", "--born", "1950-01-15"]);
        let Commands::Edit(args) = cli.command else {
            panic!("expected edit");
        };
        assert!(args.bio.born.is_some());
    }
}
