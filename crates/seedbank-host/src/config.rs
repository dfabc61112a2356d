//! Configuration loading and typed config structures for the registry host.
//!
//! The host reads `seedbank.yaml` (or the file named by `--config` /
//! `SEEDBANK_CONFIG`). Every section and field has a default, so an empty
//! or missing file yields a working in-memory host.

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Default configuration file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "seedbank.yaml";

/// Environment variable naming the configuration file.
pub const CONFIG_ENV: &str = "SEEDBANK_CONFIG";

/// Environment variable overriding `persistence.directory`.
pub const DATA_DIR_ENV: &str = "SEEDBANK_DATA_DIR";

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// The configuration parsed but holds an unusable value.
    #[error("invalid configuration: {reason}")]
    Invalid {
        /// What is wrong.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level host configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct HostConfig {
    /// Registry identity.
    #[serde(default)]
    pub registry: RegistrySection,

    /// Durable snapshot storage.
    #[serde(default)]
    pub persistence: PersistenceConfig,

    /// Request deduplication.
    #[serde(default)]
    pub dedup: DedupConfig,

    /// Logging output.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl HostConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// `SEEDBANK_DATA_DIR`, when set, overrides `persistence.directory` and
    /// turns persistence on.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value is out of range.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string, applying environment
    /// overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value is out of range.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        // An empty document deserializes to unit, not a mapping.
        let mut config: Self = if yaml.trim().is_empty() {
            Self::default()
        } else {
            serde_yml::from_str(yaml)?
        };
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Apply environment variable overrides.
    pub fn apply_env_overrides(&mut self) {
        self.apply_data_dir(std::env::var(DATA_DIR_ENV).ok());
    }

    /// Point persistence at `dir`, enabling it. `None` and empty strings
    /// leave the configuration unchanged.
    pub fn apply_data_dir(&mut self, dir: Option<String>) {
        if let Some(dir) = dir.filter(|d| !d.trim().is_empty()) {
            self.persistence.directory = dir;
            self.persistence.enabled = true;
        }
    }

    /// Check cross-field constraints.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] describing the first violation.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.dedup.enabled && self.dedup.capacity == 0 {
            return Err(ConfigError::Invalid {
                reason: "dedup.capacity must be at least 1 when dedup is enabled".to_owned(),
            });
        }
        if self.persistence.enabled && self.persistence.directory.trim().is_empty() {
            return Err(ConfigError::Invalid {
                reason: "persistence.directory must be set when persistence is enabled".to_owned(),
            });
        }
        Ok(())
    }
}

/// Registry identity settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RegistrySection {
    /// Label attached to log lines.
    #[serde(default = "default_registry_name")]
    pub name: String,
}

impl Default for RegistrySection {
    fn default() -> Self {
        Self {
            name: default_registry_name(),
        }
    }
}

/// Snapshot persistence settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PersistenceConfig {
    /// Whether the registry is saved after every successful mutation.
    #[serde(default)]
    pub enabled: bool,

    /// Directory holding the snapshot files.
    #[serde(default = "default_data_directory")]
    pub directory: String,
}

impl PersistenceConfig {
    /// The configured directory as a path.
    pub fn directory_path(&self) -> PathBuf {
        PathBuf::from(&self.directory)
    }
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            directory: default_data_directory(),
        }
    }
}

/// Request deduplication settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DedupConfig {
    /// Whether repeated `request_id`s return the cached response.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Maximum number of remembered responses.
    #[serde(default = "default_dedup_capacity")]
    pub capacity: usize,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            capacity: default_dedup_capacity(),
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` wins when set.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON log lines instead of human-readable text.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

/// Pick the configuration file to load.
///
/// Precedence: a `--config <path>` (or `--config=<path>`) argument, then
/// the `SEEDBANK_CONFIG` value, then [`DEFAULT_CONFIG_FILE`]. Returns the
/// path and whether it was requested explicitly; an explicit path must
/// exist, the default may be absent.
pub fn resolve_config_path<I>(args: I, env_value: Option<String>) -> (PathBuf, bool)
where
    I: IntoIterator<Item = String>,
{
    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        if arg == "--config" {
            if let Some(path) = args.next() {
                return (PathBuf::from(path), true);
            }
        } else if let Some(path) = arg.strip_prefix("--config=") {
            return (PathBuf::from(path), true);
        }
    }
    if let Some(path) = env_value.filter(|p| !p.trim().is_empty()) {
        return (PathBuf::from(path), true);
    }
    (PathBuf::from(DEFAULT_CONFIG_FILE), false)
}

// ---------------------------------------------------------------------------
// Default value functions for serde
// ---------------------------------------------------------------------------

fn default_registry_name() -> String {
    "seedbank".to_owned()
}

fn default_data_directory() -> String {
    "./seedbank-data".to_owned()
}

const fn default_true() -> bool {
    true
}

const fn default_dedup_capacity() -> usize {
    1024
}

fn default_log_level() -> String {
    "info".to_owned()
}
