use anyhow::{Context, Result, ensure};
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::io::IsTerminal;
use std::path::Path;
use std::str::FromStr;

/// Directory (relative to the project root) that holds kindred state.
pub const KINDRED_DIR: &str = ".kindred";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(default)]
    pub layout: LayoutSettings,
    #[serde(default)]
    pub graph: GraphConfig,
}

/// Flow direction of generations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LayoutDirection {
    /// Ancestors above descendants.
    #[default]
    TopBottom,
    /// Ancestors left of descendants.
    LeftRight,
}

impl LayoutDirection {
    const fn as_str(self) -> &'static str {
        match self {
            Self::TopBottom => "top-bottom",
            Self::LeftRight => "left-right",
        }
    }
}

impl fmt::Display for LayoutDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LayoutDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "top-bottom" | "tb" | "td" | "vertical" => Ok(Self::TopBottom),
            "left-right" | "lr" | "horizontal" => Ok(Self::LeftRight),
            other => Err(format!(
                "invalid layout direction '{other}' (expected top-bottom or left-right)"
            )),
        }
    }
}

/// Geometry and effort knobs for the layout engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutSettings {
    #[serde(default)]
    pub direction: LayoutDirection,
    #[serde(default = "default_node_width")]
    pub node_width: f64,
    #[serde(default = "default_node_height")]
    pub node_height: f64,
    /// Gap between neighbours within a generation.
    #[serde(default = "default_node_sep")]
    pub node_sep: f64,
    /// Gap between generations. Unset means the direction's default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rank_sep: Option<f64>,
    #[serde(default = "default_max_sweeps")]
    pub max_sweeps: usize,
}

impl Default for LayoutSettings {
    fn default() -> Self {
        Self {
            direction: LayoutDirection::default(),
            node_width: default_node_width(),
            node_height: default_node_height(),
            node_sep: default_node_sep(),
            rank_sep: None,
            max_sweeps: default_max_sweeps(),
        }
    }
}

impl LayoutSettings {
    #[must_use]
    pub fn with_direction(mut self, direction: LayoutDirection) -> Self {
        self.direction = direction;
        self
    }

    /// Reject geometry the layout cannot place: node sizes must be finite
    /// and positive, gaps finite and non-negative.
    ///
    /// # Errors
    ///
    /// Names the first offending setting.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [("node_width", self.node_width), ("node_height", self.node_height)] {
            ensure!(
                value.is_finite() && value > 0.0,
                "layout.{name} must be a positive number, got {value}"
            );
        }
        let gaps = [("node_sep", Some(self.node_sep)), ("rank_sep", self.rank_sep)];
        for (name, value) in gaps.into_iter().filter_map(|(n, v)| v.map(|v| (n, v))) {
            ensure!(
                value.is_finite() && value >= 0.0,
                "layout.{name} must be a non-negative number, got {value}"
            );
        }
        Ok(())
    }

    /// Rank separation in effect: the configured value, else 120 top-bottom
    /// and 150 left-right.
    #[must_use]
    pub fn effective_rank_sep(&self) -> f64 {
        self.rank_sep.unwrap_or(match self.direction {
            LayoutDirection::TopBottom => 120.0,
            LayoutDirection::LeftRight => 150.0,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphConfig {
    /// Re-run the layout after every add or connect.
    #[serde(default)]
    pub auto_layout: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UserConfig {
    #[serde(default)]
    pub output: Option<String>,
}

pub fn load_project_config(project_root: &Path) -> Result<ProjectConfig> {
    let path = project_root.join(KINDRED_DIR).join("config.toml");
    if !path.exists() {
        return Ok(ProjectConfig::default());
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let config = toml::from_str::<ProjectConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    config
        .layout
        .validate()
        .with_context(|| format!("Invalid layout settings in {}", path.display()))?;
    Ok(config)
}

pub fn load_user_config() -> Result<UserConfig> {
    let Some(config_dir) = dirs::config_dir() else {
        return Ok(UserConfig::default());
    };

    let path = config_dir.join("kindred/config.toml");
    if !path.exists() {
        return Ok(UserConfig::default());
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<UserConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

/// Output mode after applying every precedence rule, as a lowercase name.
///
/// `--json` wins, then an explicit `--format`, then `FORMAT`, then the user
/// config, then TTY detection.
pub fn resolve_output_mode(cli_json: bool, cli_format: Option<&str>) -> Result<String> {
    let user = load_user_config()?;
    let env_format = env::var("FORMAT").ok();
    Ok(resolve_output(cli_json, cli_format, user.output, env_format))
}

fn normalize_output_mode(raw: &str) -> Option<&'static str> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "pretty" | "human" => Some("pretty"),
        "text" | "table" => Some("text"),
        "json" => Some("json"),
        _ => None,
    }
}

fn resolve_output(
    cli_json: bool,
    cli_format: Option<&str>,
    user_output: Option<String>,
    env_format: Option<String>,
) -> String {
    if cli_json {
        return "json".to_string();
    }

    [cli_format, env_format.as_deref(), user_output.as_deref()]
        .into_iter()
        .flatten()
        .find_map(normalize_output_mode)
        .map_or_else(
            || {
                if std::io::stdout().is_terminal() {
                    "pretty".to_string()
                } else {
                    "text".to_string()
                }
            },
            str::to_string,
        )
}

const fn default_node_width() -> f64 {
    220.0
}

const fn default_node_height() -> f64 {
    100.0
}

const fn default_node_sep() -> f64 {
    80.0
}

const fn default_max_sweeps() -> usize {
    24
}
