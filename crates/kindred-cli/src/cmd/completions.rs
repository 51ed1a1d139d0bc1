use std::io::Write;

use anyhow::Result;
use clap::Args;
use clap_complete::{Shell, generate};

const BIN_NAME: &str = "kin";

#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for.
    #[arg(value_enum)]
    pub shell: Shell,
}

/// Print a completion script for `shell` to stdout.
///
/// # Errors
///
/// Returns an error if writing to stdout fails.
pub fn run_completions(shell: Shell, command: &mut clap::Command) -> Result<()> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    write_completions(shell, command, &mut out);
    out.flush()?;
    Ok(())
}

fn write_completions(shell: Shell, command: &mut clap::Command, out: &mut dyn Write) {
    generate(shell, command, BIN_NAME, out);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Cli;
    use clap::CommandFactory;

    #[test]
    fn bash_script_names_subcommands() {
        let mut buf = Vec::new();
        write_completions(Shell::Bash, &mut Cli::command(), &mut buf);
        let script = String::from_utf8(buf).expect("utf8");
        assert!(script.contains("kin"));
        assert!(script.contains("candidates"));
    }
}
