//! Configuration system for the tasksync client.
//!
//! Supports layered configuration with the following priority (highest first):
//! 1. CLI arguments
//! 2. Environment variables (via clap `env` attribute)
//! 3. TOML config file (`~/.config/tasksync/config.toml`)
//! 4. Compiled defaults
//!
//! Missing config file is not an error (defaults are used). An explicit
//! `--config` path that doesn't exist is an error.

use std::path::PathBuf;

use tasksync_proto::task::DEFAULT_PAGE_SIZE;

use crate::store::EngineConfig;

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

    /// The merged settings are unusable.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

// ---------------------------------------------------------------------------
// TOML file structs (all fields Option for partial overrides)
// ---------------------------------------------------------------------------

/// Top-level TOML config file structure.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct ConfigFile {
    client: ClientFileConfig,
}

/// `[client]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct ClientFileConfig {
    server_url: Option<String>,
    page_size: Option<u32>,
    action_buffer: Option<usize>,
}

// ---------------------------------------------------------------------------
// Resolved configuration
// ---------------------------------------------------------------------------

/// Fully resolved client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the tasksync server.
    pub server_url: String,
    /// Page size for list requests.
    pub page_size: u32,
    /// Capacity of the store's action broadcast channel.
    pub action_buffer: usize,
    /// Log level filter string.
    pub log_level: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: "http://127.0.0.1:8080".to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            action_buffer: 256,
            log_level: "warn".to_string(),
        }
    }
}

impl ClientConfig {
    /// Load configuration by merging CLI args, env vars, and a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the explicit config file cannot be read
    /// or parsed, or if the page size is zero.
    pub fn load(cli: &CliArgs) -> Result<Self, ConfigError> {
        let file = load_config_file(cli.config.as_deref())?;
        Self::resolve(cli, &file).validated()
    }

    /// Resolve a `ClientConfig` from CLI args and a parsed config file.
    ///
    /// Priority: CLI > file > default.
    fn resolve(cli: &CliArgs, file: &ConfigFile) -> Self {
        let defaults = Self::default();

        Self {
            server_url: cli
                .server_url
                .clone()
                .or_else(|| file.client.server_url.clone())
                .unwrap_or(defaults.server_url),
            page_size: cli
                .page_size
                .or(file.client.page_size)
                .unwrap_or(defaults.page_size),
            action_buffer: file
                .client
                .action_buffer
                .unwrap_or(defaults.action_buffer),
            log_level: cli.log_level.clone(),
        }
    }

    fn validated(self) -> Result<Self, ConfigError> {
        if self.page_size == 0 {
            return Err(ConfigError::Invalid(
                "page_size must be at least 1".to_string(),
            ));
        }
        Ok(self)
    }

    /// Engine settings derived from this configuration.
    #[must_use]
    pub const fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            page_size: self.page_size,
            action_buffer: self.action_buffer,
        }
    }
}

/// Client subcommands.
#[derive(clap::Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Load and print tasks.
    List {
        /// Follow next-page tokens until the collection is exhausted.
        #[arg(long)]
        all: bool,
    },
    /// Create a task.
    Add {
        /// Task text.
        text: String,
    },
}

/// CLI arguments parsed by clap.
#[derive(clap::Parser, Debug, Default)]
#[command(version, about = "Task list client with optimistic updates")]
pub struct CliArgs {
    /// Base URL of the tasksync server.
    #[arg(long, env = "TASKSYNC_URL")]
    pub server_url: Option<String>,

    /// Path to config file (default: `~/.config/tasksync/config.toml`).
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Page size for list requests.
    #[arg(long)]
    pub page_size: Option<u32>,

    /// Log level filter (trace, debug, info, warn, error).
    #[arg(long, default_value = "warn", env = "TASKSYNC_LOG")]
    pub log_level: String,

    /// Path to log file (logs go to stderr when absent).
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// What to do; defaults to `list`.
    #[command(subcommand)]
    pub command: Option<Command>,
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

/// Load and parse a TOML config file.
///
/// If `explicit_path` is `Some`, the file must exist (error if not).
/// If `explicit_path` is `None`, the default path is tried and missing file
/// is treated as empty config.
fn load_config_file(explicit_path: Option<&std::path::Path>) -> Result<ConfigFile, ConfigError> {
    if let Some(p) = explicit_path {
        let contents = std::fs::read_to_string(p).map_err(|e| ConfigError::ReadFile {
            path: p.to_path_buf(),
            source: e,
        })?;
        return Ok(toml::from_str(&contents)?);
    }

    let Some(config_dir) = dirs::config_dir() else {
        return Ok(ConfigFile::default());
    };
    let path = config_dir.join("tasksync").join("config.toml");

    match std::fs::read_to_string(&path) {
        Ok(contents) => Ok(toml::from_str(&contents)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(ConfigFile::default()),
        Err(e) => Err(ConfigError::ReadFile { path, source: e }),
    }
}
