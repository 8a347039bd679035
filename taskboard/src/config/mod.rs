//! Configuration for the `taskboard` client.
//!
//! Layered, highest priority first:
//! 1. CLI arguments
//! 2. Environment variables (via clap `env` attribute)
//! 3. TOML config file (`~/.config/taskboard/config.toml`)
//! 4. Compiled defaults
//!
//! A missing default config file is not an error. An explicit `--config`
//! path that cannot be read is.

use std::path::{Path, PathBuf};
use std::time::Duration;

use taskboard_proto::column::{Column, ColumnError, ColumnSet};
use taskboard_proto::task::{ProjectId, Scope, TaskId};
use url::Url;

/// Default API root of a locally running `taskboard-server`.
pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:8000/api";

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file {path}: {source}")]
    ReadFile {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Failed to parse the TOML configuration.
    #[error("failed to parse config file: {0}")]
    ParseToml(#[from] toml::de::Error),

    /// The server URL is not a valid absolute URL.
    #[error("invalid server url '{url}': {source}")]
    InvalidUrl {
        /// Offending value.
        url: String,
        /// Parse failure.
        source: url::ParseError,
    },

    /// The configured columns are unusable.
    #[error("invalid board columns: {0}")]
    InvalidColumns(#[from] ColumnError),
}

// ---------------------------------------------------------------------------
// TOML file structs (all fields Option for partial overrides)
// ---------------------------------------------------------------------------

/// Top-level TOML config file structure.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct ConfigFile {
    server: ServerFileConfig,
    board: BoardFileConfig,
}

/// `[server]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct ServerFileConfig {
    url: Option<String>,
    request_timeout_secs: Option<u64>,
    project_id: Option<u64>,
}

/// `[board]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct BoardFileConfig {
    columns: Option<Vec<Column>>,
}

// ---------------------------------------------------------------------------
// Resolved configuration
// ---------------------------------------------------------------------------

/// Fully resolved client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API root the client talks to.
    pub server_url: Url,
    /// Per-request timeout.
    pub request_timeout: Duration,
    /// Tasks shown and reordered.
    pub scope: Scope,
    /// Board columns in display order.
    pub columns: ColumnSet,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: default_server_url(),
            request_timeout: Duration::from_secs(10),
            scope: Scope::Board,
            columns: ColumnSet::default(),
        }
    }
}

impl ClientConfig {
    /// Load configuration by merging CLI args, env vars, and a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the explicit config file cannot be read,
    /// the file cannot be parsed, or the resolved values are invalid.
    pub fn load(cli: &CliArgs) -> Result<Self, ConfigError> {
        let file = load_config_file(cli.config.as_deref())?;
        Self::resolve(cli, file)
    }

    /// Resolve from CLI args and a parsed file. Priority: CLI > file > default.
    fn resolve(cli: &CliArgs, file: ConfigFile) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let server_url = match cli.server_url.clone().or(file.server.url) {
            Some(raw) => Url::parse(&raw).map_err(|source| ConfigError::InvalidUrl { url: raw, source })?,
            None => defaults.server_url,
        };
        let project = cli.project.or(file.server.project_id).map(ProjectId::new);
        let columns = match file.board.columns {
            Some(columns) => ColumnSet::new(columns)?,
            None => defaults.columns,
        };

        Ok(Self {
            server_url,
            request_timeout: file
                .server
                .request_timeout_secs
                .map_or(defaults.request_timeout, Duration::from_secs),
            scope: Scope::from_project(project),
            columns,
        })
    }
}

fn default_server_url() -> Url {
    Url::parse(DEFAULT_SERVER_URL).unwrap_or_else(|_| unreachable!("default server url is valid"))
}

/// CLI arguments parsed by clap.
#[derive(clap::Parser, Debug, Default)]
#[command(version, about = "Kanban board client")]
pub struct CliArgs {
    /// API root of the task server.
    #[arg(long, global = true, env = "TASKBOARD_SERVER_URL")]
    pub server_url: Option<String>,

    /// Only show and reorder tasks of this project.
    #[arg(long, global = true, env = "TASKBOARD_PROJECT")]
    pub project: Option<u64>,

    /// Path to config file (default: `~/.config/taskboard/config.toml`).
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level filter (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "warn", env = "TASKBOARD_LOG")]
    pub log_level: String,

    /// Write logs to this file instead of stderr.
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    /// What to do (default: `show`).
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Client subcommands.
#[derive(clap::Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Print the board column by column.
    Show,
    /// Move a task to another column or position.
    Move {
        /// Task to move.
        #[arg(value_parser = parse_task_id)]
        task_id: TaskId,
        /// Destination column id.
        column: String,
        /// Destination index in the column (default: end of column).
        #[arg(long)]
        index: Option<usize>,
    },
}

fn parse_task_id(raw: &str) -> Result<TaskId, String> {
    raw.parse::<u64>()
        .map(TaskId::new)
        .map_err(|e| format!("invalid task id '{raw}': {e}"))
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

/// Where the config file lives, and whether it has to exist.
///
/// An explicit path is required. The per-user default is optional, and
/// there is none when the platform has no config directory.
fn config_source(explicit_path: Option<&Path>) -> Option<(PathBuf, bool)> {
    match explicit_path {
        Some(path) => Some((path.to_path_buf(), true)),
        None => dirs::config_dir().map(|dir| (dir.join("taskboard").join("config.toml"), false)),
    }
}

/// Load and parse the TOML config file named by [`config_source`].
fn load_config_file(explicit_path: Option<&Path>) -> Result<ConfigFile, ConfigError> {
    let Some((path, required)) = config_source(explicit_path) else {
        return Ok(ConfigFile::default());
    };
    match std::fs::read_to_string(&path) {
        Ok(contents) => Ok(toml::from_str(&contents)?),
        Err(e) if !required && e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            Ok(ConfigFile::default())
        }
        Err(source) => Err(ConfigError::ReadFile { path, source }),
    }
}
