//! Configuration for the `taskboard-server`.
//!
//! Layered, highest priority first:
//! 1. CLI arguments
//! 2. Environment variables (via clap `env` attribute)
//! 3. TOML config file (`~/.config/taskboard-server/config.toml`)
//! 4. Compiled defaults

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use taskboard_proto::column::{Column, ColumnError, ColumnSet};
use taskboard_proto::task::{Task, TaskId};

/// Errors that can occur when loading server configuration.
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

    /// The configured columns are unusable.
    #[error("invalid board columns: {0}")]
    InvalidColumns(#[from] ColumnError),

    /// Failed to read the seed file.
    #[error("failed to read seed file {path}: {source}")]
    ReadSeed {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The seed file is not a JSON task list.
    #[error("failed to parse seed file {path}: {source}")]
    ParseSeed {
        /// Path that was attempted.
        path: PathBuf,
        /// Parse failure.
        source: serde_json::Error,
    },

    /// The seed file lists a task id more than once.
    #[error("seed file {path} lists task {id} more than once")]
    DuplicateSeedTask {
        /// Seed file.
        path: PathBuf,
        /// Repeated id.
        id: TaskId,
    },
}

// ---------------------------------------------------------------------------
// TOML file structs (all fields Option for partial overrides)
// ---------------------------------------------------------------------------

/// Top-level TOML config file structure for the server.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct ServerConfigFile {
    server: ServerFileConfig,
    board: BoardFileConfig,
}

/// `[server]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct ServerFileConfig {
    bind_addr: Option<String>,
    seed_file: Option<PathBuf>,
}

/// `[board]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct BoardFileConfig {
    columns: Option<Vec<Column>>,
}

// ---------------------------------------------------------------------------
// CLI arguments
// ---------------------------------------------------------------------------

/// CLI arguments for the server.
#[derive(clap::Parser, Debug, Default)]
#[command(version, about = "Taskboard REST server")]
pub struct ServerCliArgs {
    /// Address to bind the server to.
    #[arg(short, long, env = "TASKBOARD_BIND")]
    pub bind: Option<String>,

    /// Path to config file (default: `~/.config/taskboard-server/config.toml`).
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// JSON file holding the initial task list.
    #[arg(long, env = "TASKBOARD_SEED")]
    pub seed: Option<PathBuf>,

    /// Log level filter (trace, debug, info, warn, error).
    #[arg(long, default_value = "info", env = "TASKBOARD_SERVER_LOG")]
    pub log_level: String,
}

// ---------------------------------------------------------------------------
// Resolved configuration
// ---------------------------------------------------------------------------

/// Fully resolved server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind the server to (e.g., `127.0.0.1:8000`).
    pub bind_addr: String,
    /// Initial task list, if any.
    pub seed_file: Option<PathBuf>,
    /// Columns a task may be moved into.
    pub columns: ColumnSet,
    /// Log level filter string.
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8000".to_string(),
            seed_file: None,
            columns: ColumnSet::default(),
            log_level: "info".to_string(),
        }
    }
}

impl ServerConfig {
    /// Load configuration by merging CLI args, env vars, and a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the explicit config file cannot be read
    /// or parsed, or if the configured columns are invalid.
    pub fn load(cli: &ServerCliArgs) -> Result<Self, ConfigError> {
        let file = load_config_file(cli.config.as_deref())?;
        Self::resolve(cli, file)
    }

    /// Priority: CLI > file > default.
    fn resolve(cli: &ServerCliArgs, file: ServerConfigFile) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let columns = match file.board.columns {
            Some(columns) => ColumnSet::new(columns)?,
            None => defaults.columns,
        };

        Ok(Self {
            bind_addr: cli
                .bind
                .clone()
                .or(file.server.bind_addr)
                .unwrap_or(defaults.bind_addr),
            seed_file: cli.seed.clone().or(file.server.seed_file),
            columns,
            log_level: cli.log_level.clone(),
        })
    }

    /// Reads the seed task list, or returns an empty list when no seed
    /// file is configured.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ReadSeed`] or [`ConfigError::ParseSeed`] if
    /// the configured file cannot be read or is not a JSON task list, and
    /// [`ConfigError::DuplicateSeedTask`] if an id appears twice.
    pub fn load_seed(&self) -> Result<Vec<Task>, ConfigError> {
        let Some(path) = &self.seed_file else {
            return Ok(Vec::new());
        };
        let contents = std::fs::read(path).map_err(|source| ConfigError::ReadSeed {
            path: path.clone(),
            source,
        })?;
        parse_seed(path, &contents)
    }
}

/// Parse a seed task list; every id must be unique.
fn parse_seed(path: &Path, contents: &[u8]) -> Result<Vec<Task>, ConfigError> {
    let tasks: Vec<Task> =
        serde_json::from_slice(contents).map_err(|source| ConfigError::ParseSeed {
            path: path.to_path_buf(),
            source,
        })?;
    let mut seen = HashSet::with_capacity(tasks.len());
    if let Some(task) = tasks.iter().find(|t| !seen.insert(t.id)) {
        return Err(ConfigError::DuplicateSeedTask {
            path: path.to_path_buf(),
            id: task.id,
        });
    }
    Ok(tasks)
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
        None => dirs::config_dir().map(|dir| (dir.join("taskboard-server").join("config.toml"), false)),
    }
}

/// Load and parse the TOML config file named by [`config_source`].
fn load_config_file(explicit_path: Option<&Path>) -> Result<ServerConfigFile, ConfigError> {
    let Some((path, required)) = config_source(explicit_path) else {
        return Ok(ServerConfigFile::default());
    };
    match std::fs::read_to_string(&path) {
        Ok(contents) => Ok(toml::from_str(&contents)?),
        Err(e) if !required && e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            Ok(ServerConfigFile::default())
        }
        Err(source) => Err(ConfigError::ReadFile { path, source }),
    }
}
