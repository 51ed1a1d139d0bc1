//! Terminal output for `kin`: one [`OutputMode`] per invocation, applied to
//! results on stdout and errors on stderr alike.
//!
//! # Choosing the mode
//!
//! First match wins:
//! 1. `--json`
//! 2. `--format pretty|text|json`
//! 3. `FORMAT` env var
//! 4. `output` in the user config (`~/.config/kindred/config.toml`)
//! 5. Default: [`OutputMode::Pretty`] on a TTY, [`OutputMode::Text`] when piped.

use clap::ValueEnum;
use kindred_core::ErrorCode;
use kindred_core::graph::GraphError;
use kindred_core::request::AddPersonError;
use kindred_core::store::StoreError;
use kindred_layout::LayoutError;
use serde::Serialize;
use std::io::{self, Write};

/// Width of the rule under pretty section headings.
pub const RULE_WIDTH: usize = 72;

/// Heading line followed by a full-width rule.
pub fn pretty_section(w: &mut dyn Write, heading: &str) -> io::Result<()> {
    writeln!(w, "{heading}\n{}", "-".repeat(RULE_WIDTH))
}

/// `key:` padded to a fixed column, then the value.
pub fn pretty_kv(w: &mut dyn Write, key: &str, value: impl AsRef<str>) -> io::Result<()> {
    let label = format!("{key}:");
    writeln!(w, "{label:<12} {}", value.as_ref())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputMode {
    /// Sections and aligned fields for people at a terminal.
    Pretty,
    /// Tab or space separated lines for scripts.
    Text,
    /// Pretty-printed JSON documents.
    Json,
}

impl OutputMode {
    pub const fn is_json(self) -> bool {
        matches!(self, Self::Json)
    }

    const fn name(self) -> &'static str {
        match self {
            Self::Pretty => "pretty",
            Self::Text => "text",
            Self::Json => "json",
        }
    }
}

/// Resolve the output mode from flags, environment, user config and TTY.
///
/// # Errors
///
/// Returns an error if the user config exists but cannot be parsed.
pub fn resolve_output_mode(format_flag: Option<OutputMode>, json_flag: bool) -> anyhow::Result<OutputMode> {
    let name = kindred_core::config::resolve_output_mode(json_flag, format_flag.map(OutputMode::name))?;
    Ok(match name.as_str() {
        "json" => OutputMode::Json,
        "text" => OutputMode::Text,
        _ => OutputMode::Pretty,
    })
}

/// A list entry that knows its pretty and text forms. JSON comes from
/// `Serialize`.
pub trait Renderable: Serialize {
    fn write_pretty(&self, w: &mut dyn Write) -> io::Result<()>;

    /// One line, fields in [`columns`](Renderable::columns) order.
    fn write_row(&self, w: &mut dyn Write) -> io::Result<()>;

    fn columns() -> &'static [&'static str] {
        &[]
    }
}

/// Print `items` to stdout: a JSON array, pretty entries, or a header row
/// followed by one text row per item.
pub fn render_list<R: Renderable>(items: &[R], mode: OutputMode) -> anyhow::Result<()> {
    to_stdout(|out| write_list(out, items, mode))
}

fn write_list<R: Renderable>(out: &mut dyn Write, items: &[R], mode: OutputMode) -> anyhow::Result<()> {
    match mode {
        OutputMode::Json => write_json(out, items)?,
        OutputMode::Pretty => {
            for item in items {
                item.write_pretty(out)?;
            }
        }
        OutputMode::Text => {
            if !items.is_empty() && !R::columns().is_empty() {
                writeln!(out, "{}", R::columns().join("  "))?;
            }
            for item in items {
                item.write_row(out)?;
            }
        }
    }
    Ok(())
}

fn write_json<T: Serialize + ?Sized>(out: &mut dyn Write, value: &T) -> anyhow::Result<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}

fn to_stdout(f: impl FnOnce(&mut dyn Write) -> anyhow::Result<()>) -> anyhow::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    f(&mut out)?;
    out.flush()?;
    Ok(())
}

/// Print `value` as JSON, or through `text_fn` / `pretty_fn`.
pub fn render_mode<T: Serialize>(
    mode: OutputMode,
    value: &T,
    text_fn: impl FnOnce(&T, &mut dyn Write) -> io::Result<()>,
    pretty_fn: impl FnOnce(&T, &mut dyn Write) -> io::Result<()>,
) -> anyhow::Result<()> {
    to_stdout(|out| {
        match mode {
            OutputMode::Json => write_json(out, value)?,
            OutputMode::Text => text_fn(value, out)?,
            OutputMode::Pretty => pretty_fn(value, out)?,
        }
        Ok(())
    })
}

/// [`render_mode`] with one human renderer for both pretty and text.
pub fn render<T: Serialize>(
    mode: OutputMode,
    value: &T,
    human_fn: impl FnOnce(&T, &mut dyn Write) -> io::Result<()>,
) -> anyhow::Result<()> {
    to_stdout(|out| {
        if mode.is_json() {
            write_json(out, value)
        } else {
            human_fn(value, out)?;
            Ok(())
        }
    })
}

/// A structured error with optional suggestion and error code.
#[derive(Debug, Serialize)]
pub struct CliError {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    /// Stable `E####` code.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
}

impl CliError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            suggestion: None,
            error_code: None,
        }
    }

    /// Message plus the hint and identifier registered for `code`.
    pub fn coded(message: impl Into<String>, code: ErrorCode) -> Self {
        Self {
            message: message.into(),
            suggestion: code.hint().map(str::to_string),
            error_code: Some(code.code().to_string()),
        }
    }
}

impl From<&GraphError> for CliError {
    fn from(err: &GraphError) -> Self {
        Self::coded(err.to_string(), err.code())
    }
}

impl From<&AddPersonError> for CliError {
    fn from(err: &AddPersonError) -> Self {
        Self::coded(err.to_string(), err.code())
    }
}

impl From<&StoreError> for CliError {
    fn from(err: &StoreError) -> Self {
        Self::coded(err.to_string(), err.code())
    }
}

impl From<&LayoutError> for CliError {
    fn from(err: &LayoutError) -> Self {
        Self::coded(err.to_string(), err.code())
    }
}

/// Print `error` to stderr: `{"error": {...}}` in JSON mode, otherwise
/// `error:` plus an optional `suggestion:` line.
pub fn render_error(mode: OutputMode, error: &CliError) -> anyhow::Result<()> {
    let stderr = io::stderr();
    let mut out = stderr.lock();
    write_error(&mut out, mode, error)
}

fn write_error(out: &mut dyn Write, mode: OutputMode, error: &CliError) -> anyhow::Result<()> {
    if mode.is_json() {
        return write_json(out, &serde_json::json!({ "error": error }));
    }
    writeln!(out, "error: {}", error.message)?;
    if let Some(suggestion) = &error.suggestion {
        writeln!(out, "  suggestion: {suggestion}")?;
    }
    Ok(())
}

/// Marker for an error that has already been rendered to stderr.
#[derive(Debug)]
pub struct Reported(String);

impl std::fmt::Display for Reported {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for Reported {}

/// Render `error` and hand back an `anyhow` error that `main` will not print
/// a second time.
pub fn fail(mode: OutputMode, error: &CliError) -> anyhow::Error {
    if let Err(render_err) = render_error(mode, error) {
        tracing::warn!(%render_err, "failed to render error");
    }
    anyhow::Error::new(Reported(error.message.clone()))
}
