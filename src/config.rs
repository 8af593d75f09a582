//! Configuration loading for the task lifecycle services.
//!
//! Configuration is read from a TOML file. Every field has a default so an
//! empty file (or no file at all) yields a usable local setup. A small set of
//! environment variables override file values for deployment.

use crate::task::domain::BranchName;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Overrides [`DatabaseConfig::url`].
pub const DATABASE_URL_ENV: &str = "TASKTRACE_DATABASE_URL";

/// Overrides [`RepositoryConfig::path`].
pub const REPOSITORY_PATH_ENV: &str = "TASKTRACE_REPOSITORY_PATH";

/// Overrides [`RepositoryConfig::default_branch`].
pub const DEFAULT_BRANCH_ENV: &str = "TASKTRACE_DEFAULT_BRANCH";

/// Errors raised while loading or validating configuration.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read {path}: {source}")]
    Read {
        /// File that was being read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: Arc<std::io::Error>,
    },

    /// The configuration file is not valid TOML for this schema.
    #[error("failed to parse configuration: {0}")]
    Parse(Arc<toml::de::Error>),

    /// A value is present but unusable.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskTraceConfig {
    /// Persistent store settings.
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Version-control working copy settings.
    #[serde(default)]
    pub repository: RepositoryConfig,

    /// Tracing subscriber settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// `PostgreSQL` connection settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Connection URL.
    #[serde(default = "default_database_url")]
    pub url: String,

    /// Maximum pooled connections.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_database_url() -> String {
    String::from("postgres://localhost/tasktrace")
}

const fn default_max_connections() -> u32 {
    8
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            max_connections: default_max_connections(),
        }
    }
}

/// Git working copy settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryConfig {
    /// Root of the working copy.
    #[serde(default = "default_repository_path")]
    pub path: PathBuf,

    /// Branch tasks are created from and merged back into.
    #[serde(default = "default_branch")]
    pub default_branch: String,

    /// Git executable, resolved through `PATH` when not absolute.
    #[serde(default = "default_git_binary")]
    pub git_binary: String,

    /// Upper bound on a single git invocation, in seconds.
    #[serde(default = "default_command_timeout_secs")]
    pub command_timeout_secs: u64,
}

fn default_repository_path() -> PathBuf {
    PathBuf::from(".")
}

fn default_branch() -> String {
    String::from("main")
}

fn default_git_binary() -> String {
    String::from("git")
}

const fn default_command_timeout_secs() -> u64 {
    30
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            path: default_repository_path(),
            default_branch: default_branch(),
            git_binary: default_git_binary(),
            command_timeout_secs: default_command_timeout_secs(),
        }
    }
}

impl RepositoryConfig {
    /// Returns a configuration for the working copy at `path` with every
    /// other field defaulted.
    #[must_use]
    pub fn for_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    /// Returns the validated default branch name.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when the name is not a valid branch.
    pub fn default_branch_name(&self) -> Result<BranchName, ConfigError> {
        BranchName::new(self.default_branch.as_str()).map_err(|err| {
            ConfigError::Invalid(format!("repository.default_branch: {err}"))
        })
    }

    /// Returns the per-command timeout.
    #[must_use]
    pub const fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_secs)
    }
}

/// Tracing output settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    #[serde(default = "default_log_filter")]
    pub filter: String,

    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

fn default_log_filter() -> String {
    String::from("info")
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
            json: false,
        }
    }
}

impl TaskTraceConfig {
    /// Loads configuration from a TOML file, applies environment overrides,
    /// and validates the result.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the file cannot be read or parsed, or a
    /// value fails validation.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|err| ConfigError::Read {
            path: path.to_path_buf(),
            source: Arc::new(err),
        })?;
        let parsed = Self::from_toml_str(&content)?;
        let config = parsed.with_overrides(|name| std::env::var(name).ok());
        config.validate()?;
        Ok(config)
    }

    /// Parses configuration from TOML text without applying overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed input.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|err| ConfigError::Parse(Arc::new(err)))
    }

    /// Applies environment overrides read through `lookup`.
    #[must_use]
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(url) = lookup(DATABASE_URL_ENV) {
            self.database.url = url;
        }
        if let Some(path) = lookup(REPOSITORY_PATH_ENV) {
            self.repository.path = PathBuf::from(path);
        }
        if let Some(branch) = lookup(DEFAULT_BRANCH_ENV) {
            self.repository.default_branch = branch;
        }
        self
    }

    /// Rejects empty values and zero limits.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database.url.trim().is_empty() {
            return Err(ConfigError::Invalid(String::from(
                "database.url cannot be empty",
            )));
        }
        if self.database.max_connections == 0 {
            return Err(ConfigError::Invalid(String::from(
                "database.max_connections must be at least 1",
            )));
        }
        if self.repository.path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid(String::from(
                "repository.path cannot be empty",
            )));
        }
        if self.repository.git_binary.trim().is_empty() {
            return Err(ConfigError::Invalid(String::from(
                "repository.git_binary cannot be empty",
            )));
        }
        if self.repository.command_timeout_secs == 0 {
            return Err(ConfigError::Invalid(String::from(
                "repository.command_timeout_secs must be at least 1",
            )));
        }
        self.repository.default_branch_name()?;
        Ok(())
    }
}
