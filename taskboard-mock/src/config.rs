//! Settings for the mock backend.
//!
//! The mock only needs to know where to listen and what data to serve. Both
//! can come from flags (or their env vars), from
//! `~/.config/taskboard-mock/config.toml`, or fall back to built-in values,
//! in that order. An example file:
//!
//! ```toml
//! [server]
//! bind_addr = "127.0.0.1:4200"
//!
//! [data]
//! seed = true                # start with the demo users and tasks
//! touch_first_on_get = true  # restamp task 1 on every list, like another writer
//! ```

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use crate::store::MockDb;

/// Why the mock's settings could not be loaded.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The config file exists (or was named) but could not be read.
    #[error("failed to read config file {path}: {source}")]
    ReadFile {
        /// File that was tried.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The config file is not valid TOML for these settings.
    #[error("failed to parse config file: {0}")]
    ParseToml(#[from] toml::de::Error),

    /// The listen address is not `host:port`.
    #[error("invalid bind address {0:?}")]
    BindAddr(String),
}

#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct MockConfigFile {
    server: ServerSection,
    data: DataSection,
}

#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct ServerSection {
    bind_addr: Option<String>,
}

#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct DataSection {
    seed: Option<bool>,
    touch_first_on_get: Option<bool>,
}

/// Flags for `taskboard-mock`.
#[derive(clap::Parser, Debug, Default)]
#[command(version, about = "Taskboard mock task/user API")]
pub struct MockCliArgs {
    /// Listen address (`host:port`).
    #[arg(short, long, env = "TASKBOARD_MOCK_ADDR")]
    pub bind: Option<String>,

    /// Config file to read instead of `~/.config/taskboard-mock/config.toml`.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Start with no users or tasks instead of the demo rows.
    #[arg(long)]
    pub empty: bool,

    /// Restamp the first task on every list request (`true`/`false`).
    #[arg(long)]
    pub touch_first_on_get: Option<bool>,

    /// Log filter (trace, debug, info, warn, error).
    #[arg(long, default_value = "info", env = "TASKBOARD_MOCK_LOG")]
    pub log_level: String,
}

/// Resolved mock settings.
#[derive(Debug, Clone)]
pub struct MockConfig {
    /// Where the API listens.
    pub bind_addr: SocketAddr,
    /// Serve the demo users and tasks at startup.
    pub seed: bool,
    /// Simulate a concurrent writer by restamping task 1 on each list.
    pub touch_first_on_get: bool,
    /// Log filter string.
    pub log_level: String,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            // Same port as the client's default base URL.
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 4200)),
            seed: true,
            touch_first_on_get: true,
            log_level: "info".to_string(),
        }
    }
}

impl MockConfig {
    /// Reads the config file (if any) and applies `cli` on top of it.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a named config file is missing, any config
    /// file is unreadable or malformed, or the bind address does not parse.
    pub fn load(cli: &MockCliArgs) -> Result<Self, ConfigError> {
        let file = load_config_file(cli.config.as_deref())?;
        Self::resolve(cli, &file)
    }

    fn resolve(cli: &MockCliArgs, file: &MockConfigFile) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let bind_addr = match cli.bind.as_ref().or(file.server.bind_addr.as_ref()) {
            Some(addr) => addr
                .parse()
                .map_err(|_| ConfigError::BindAddr(addr.clone()))?,
            None => defaults.bind_addr,
        };

        Ok(Self {
            bind_addr,
            seed: !cli.empty && file.data.seed.unwrap_or(defaults.seed),
            touch_first_on_get: cli
                .touch_first_on_get
                .or(file.data.touch_first_on_get)
                .unwrap_or(defaults.touch_first_on_get),
            log_level: cli.log_level.clone(),
        })
    }

    /// Builds the database these settings describe.
    #[must_use]
    pub fn database(&self) -> MockDb {
        if self.seed {
            MockDb::seeded(self.touch_first_on_get)
        } else {
            MockDb::new(Vec::new(), Vec::new(), self.touch_first_on_get)
        }
    }
}

fn load_config_file(explicit_path: Option<&Path>) -> Result<MockConfigFile, ConfigError> {
    let (path, required) = match explicit_path {
        Some(p) => (p.to_path_buf(), true),
        None => match dirs::config_dir() {
            Some(dir) => (dir.join("taskboard-mock").join("config.toml"), false),
            None => return Ok(MockConfigFile::default()),
        },
    };

    match std::fs::read_to_string(&path) {
        Ok(contents) => Ok(toml::from_str(&contents)?),
        Err(e) if !required && e.kind() == std::io::ErrorKind::NotFound => {
            Ok(MockConfigFile::default())
        }
        Err(e) => Err(ConfigError::ReadFile { path, source: e }),
    }
}
