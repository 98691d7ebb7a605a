//! Configuration system for the Taskboard client.
//!
//! Supports layered configuration with the following priority (highest first):
//! 1. CLI arguments
//! 2. Environment variables (via clap `env` attribute)
//! 3. TOML config file (`~/.config/taskboard/config.toml`)
//! 4. Compiled defaults
//!
//! Missing config file is not an error (defaults are used). An explicit
//! `--config` path that doesn't exist is an error, as is a zero poll interval
//! or a timestamp format chrono cannot render.

use std::path::PathBuf;
use std::time::Duration;

use chrono::format::{Item, StrftimeItems};

use crate::tasks::DEFAULT_TASK_POLL_INTERVAL;
use crate::users::DEFAULT_USER_POLL_INTERVAL;

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

    /// A poll interval was zero.
    #[error("{0} must be greater than zero")]
    ZeroInterval(&'static str),

    /// The timestamp format contains a specifier chrono does not know.
    #[error("invalid timestamp format: {0:?}")]
    TimestampFormat(String),
}

// ---------------------------------------------------------------------------
// TOML file structs (all fields Option for partial overrides)
// ---------------------------------------------------------------------------

/// Top-level TOML config file structure.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct ConfigFile {
    api: ApiFileConfig,
    poll: PollFileConfig,
    board: BoardFileConfig,
}

/// `[api]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct ApiFileConfig {
    base_url: Option<String>,
    request_timeout_secs: Option<u64>,
}

/// `[poll]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct PollFileConfig {
    tasks_ms: Option<u64>,
    users_ms: Option<u64>,
}

/// `[board]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct BoardFileConfig {
    default_user_id: Option<u64>,
    timestamp_format: Option<String>,
}

// ---------------------------------------------------------------------------
// CLI arguments
// ---------------------------------------------------------------------------

/// CLI arguments for the Taskboard client.
#[derive(clap::Parser, Debug, Default)]
#[command(version, about = "Taskboard console client")]
pub struct CliArgs {
    /// Base URL of the task/user API.
    #[arg(long, env = "TASKBOARD_URL")]
    pub base_url: Option<String>,

    /// Path to config file (default: `~/.config/taskboard/config.toml`).
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Task poll interval in milliseconds.
    #[arg(long)]
    pub task_poll_ms: Option<u64>,

    /// User poll interval in milliseconds.
    #[arg(long)]
    pub user_poll_ms: Option<u64>,

    /// Log level filter (trace, debug, info, warn, error).
    #[arg(long, default_value = "info", env = "TASKBOARD_LOG")]
    pub log_level: String,

    /// Log file path (default: `$TMPDIR/taskboard.log`).
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

// ---------------------------------------------------------------------------
// Resolved configuration
// ---------------------------------------------------------------------------

/// Fully resolved client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the task/user API.
    pub base_url: String,
    /// Per-request timeout.
    pub request_timeout: Duration,
    /// How often the task list is polled.
    pub task_poll_interval: Duration,
    /// How often the user list is polled.
    pub user_poll_interval: Duration,
    /// Owner of tasks created from the console.
    pub default_user_id: u64,
    /// Format for `updateDate` in the console (chrono).
    pub timestamp_format: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:4200".to_string(),
            request_timeout: Duration::from_secs(10),
            task_poll_interval: DEFAULT_TASK_POLL_INTERVAL,
            user_poll_interval: DEFAULT_USER_POLL_INTERVAL,
            default_user_id: 1,
            timestamp_format: "%H:%M:%S".to_string(),
        }
    }
}

impl ClientConfig {
    /// Load configuration by merging CLI args, env vars, and a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the explicit config file cannot be read
    /// or parsed, or if a resolved value is unusable.
    pub fn load(cli: &CliArgs) -> Result<Self, ConfigError> {
        let file = load_config_file(cli.config.as_deref())?;
        Self::resolve(cli, &file)
    }

    /// Priority: CLI > file > default. Separated from `load()` for testing.
    fn resolve(cli: &CliArgs, file: &ConfigFile) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let config = Self {
            base_url: cli
                .base_url
                .clone()
                .or_else(|| file.api.base_url.clone())
                .unwrap_or(defaults.base_url),
            request_timeout: file
                .api
                .request_timeout_secs
                .map_or(defaults.request_timeout, Duration::from_secs),
            task_poll_interval: cli
                .task_poll_ms
                .or(file.poll.tasks_ms)
                .map_or(defaults.task_poll_interval, Duration::from_millis),
            user_poll_interval: cli
                .user_poll_ms
                .or(file.poll.users_ms)
                .map_or(defaults.user_poll_interval, Duration::from_millis),
            default_user_id: file
                .board
                .default_user_id
                .unwrap_or(defaults.default_user_id),
            timestamp_format: file
                .board
                .timestamp_format
                .clone()
                .unwrap_or(defaults.timestamp_format),
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.task_poll_interval.is_zero() {
            return Err(ConfigError::ZeroInterval("task poll interval"));
        }
        if self.user_poll_interval.is_zero() {
            return Err(ConfigError::ZeroInterval("user poll interval"));
        }
        if !is_valid_timestamp_format(&self.timestamp_format) {
            return Err(ConfigError::TimestampFormat(self.timestamp_format.clone()));
        }
        Ok(())
    }
}

/// Whether chrono can render `format` (no unknown `%` specifiers).
#[must_use]
pub fn is_valid_timestamp_format(format: &str) -> bool {
    !StrftimeItems::new(format).any(|item| matches!(item, Item::Error))
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn load_config_file(explicit_path: Option<&std::path::Path>) -> Result<ConfigFile, ConfigError> {
    let path = if let Some(p) = explicit_path {
        let contents = std::fs::read_to_string(p).map_err(|e| ConfigError::ReadFile {
            path: p.to_path_buf(),
            source: e,
        })?;
        return Ok(toml::from_str(&contents)?);
    } else {
        let Some(config_dir) = dirs::config_dir() else {
            return Ok(ConfigFile::default());
        };
        config_dir.join("taskboard").join("config.toml")
    };

    match std::fs::read_to_string(&path) {
        Ok(contents) => Ok(toml::from_str(&contents)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(ConfigFile::default()),
        Err(e) => Err(ConfigError::ReadFile { path, source: e }),
    }
}
