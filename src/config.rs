//! Configuration System
//!
//! Handles loading configuration from the `~/.influxrc` file and environment
//! variables. Command-line flags are layered on top by the binary.
//!
//! Precedence (lowest first): built-in defaults, rc file, environment,
//! command-line flags.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::client::ConnectionSettings;
use crate::committer::CommitterConfig;

const RC_FILE: &str = ".influxrc";
const HISTORY_FILE: &str = ".influx_history";

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_user")]
    pub user: String,

    #[serde(default = "default_pass")]
    pub pass: String,

    #[serde(default)]
    pub db: String,

    /// Series buffered by the committer before it flushes
    #[serde(
        default = "default_async_capacity",
        alias = "asynccapacity",
        alias = "AsyncCapacity"
    )]
    pub async_capacity: usize,

    /// Longest wait (ms) before buffered async inserts are flushed
    #[serde(
        default = "default_async_max_wait",
        alias = "asyncmaxwait",
        alias = "AsyncMaxWait"
    )]
    pub async_max_wait: u64,

    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    8086
}

fn default_user() -> String {
    "root".to_string()
}

fn default_pass() -> String {
    "root".to_string()
}

fn default_async_capacity() -> usize {
    1000
}

fn default_async_max_wait() -> u64 {
    500
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// `pretty` or `json`
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            user: default_user(),
            pass: default_pass(),
            db: String::new(),
            async_capacity: default_async_capacity(),
            async_max_wait: default_async_max_wait(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    /// Default rc file location (`~/.influxrc`)
    pub fn rc_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(RC_FILE))
    }

    /// Default REPL history location (`~/.influx_history`)
    pub fn history_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(HISTORY_FILE))
    }

    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        let mut config: Config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        config.normalize();
        Ok(config)
    }

    /// Load configuration from a file if it exists, defaults otherwise
    ///
    /// A missing file is fine; an unreadable or malformed one is an error.
    pub fn load_optional(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            tracing::debug!("Loading config from {:?}", path);
            Self::load(path)
        } else {
            tracing::debug!("No rc file at {:?}, using defaults", path);
            Ok(Self::default())
        }
    }

    /// Load the rc file (if any) with environment variable overrides
    pub fn load_with_env(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(p) => Self::load_optional(p)?,
            None => Self::default(),
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Write the current settings back to an rc file
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content =
            toml::to_string(self).map_err(|e| ConfigError::Serialize(e.to_string()))?;

        std::fs::write(path, content).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })
    }

    /// Zero-valued async settings mean "use the default"
    fn normalize(&mut self) {
        if self.async_capacity == 0 {
            self.async_capacity = default_async_capacity();
        }
        if self.async_max_wait == 0 {
            self.async_max_wait = default_async_max_wait();
        }
    }

    /// Apply environment variable overrides to an existing config
    fn apply_env_overrides(&mut self) {
        if let Ok(host) = std::env::var("INFLUX_HOST") {
            self.host = host;
        }
        if let Ok(port) = std::env::var("INFLUX_PORT") {
            if let Ok(p) = port.parse() {
                self.port = p;
            }
        }
        if let Ok(user) = std::env::var("INFLUX_USER") {
            self.user = user;
        }
        if let Ok(pass) = std::env::var("INFLUX_PASS") {
            self.pass = pass;
        }
        if let Ok(db) = std::env::var("INFLUX_DB") {
            self.db = db;
        }

        // Logging overrides
        if let Ok(level) = std::env::var("INFLUX_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("INFLUX_LOG_FORMAT") {
            self.logging.format = format;
        }
    }

    /// Settings for the store client
    pub fn connection_settings(&self) -> ConnectionSettings {
        ConnectionSettings {
            host: self.host.clone(),
            port: self.port,
            user: self.user.clone(),
            pass: self.pass.clone(),
            db: self.db.clone(),
            ..ConnectionSettings::default()
        }
    }

    /// Settings for the batch committer
    pub fn committer_config(&self) -> CommitterConfig {
        CommitterConfig::new(
            self.async_capacity,
            Duration::from_millis(self.async_max_wait),
        )
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to access config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },

    #[error("Failed to serialize config: {0}")]
    Serialize(String),

    #[error("No home directory to place the rc file in")]
    NoHomeDir,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn rc_file(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.host, "localhost");
        assert_eq!(config.port, 8086);
        assert_eq!(config.user, "root");
        assert_eq!(config.async_capacity, 1000);
        assert_eq!(config.async_max_wait, 500);
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn test_load_partial_rc_file() {
        let file = rc_file("host = \"db.example.com\"\ndb = \"metrics\"\n");
        let config = Config::load(file.path()).unwrap();

        assert_eq!(config.host, "db.example.com");
        assert_eq!(config.db, "metrics");
        assert_eq!(config.port, 8086);
        assert_eq!(config.pass, "root");
    }

    #[test]
    fn test_load_legacy_async_keys() {
        let file = rc_file("AsyncCapacity = 50\nasyncmaxwait = 250\n");
        let config = Config::load(file.path()).unwrap();

        assert_eq!(config.async_capacity, 50);
        assert_eq!(config.committer_config().max_wait, Duration::from_millis(250));
    }

    #[test]
    fn test_zero_async_settings_fall_back_to_defaults() {
        let file = rc_file("async_capacity = 0\nasync_max_wait = 0\n");
        let config = Config::load(file.path()).unwrap();

        assert_eq!(config.async_capacity, 1000);
        assert_eq!(config.async_max_wait, 500);
    }

    #[test]
    fn test_malformed_rc_file_is_an_error() {
        let file = rc_file("port = \"not a number\"\n");
        let err = Config::load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_missing_rc_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_optional(&dir.path().join("absent")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".influxrc");

        let config = Config {
            host: "10.0.0.5".to_string(),
            db: "ops".to_string(),
            async_capacity: 20,
            ..Config::default()
        };
        config.save(&path).unwrap();

        let restored = Config::load(&path).unwrap();
        assert_eq!(restored, config);
    }

    #[test]
    fn test_connection_settings() {
        let config = Config {
            host: "example".to_string(),
            port: 9000,
            db: "d".to_string(),
            ..Config::default()
        };
        let settings = config.connection_settings();
        assert_eq!(settings.address(), "example:9000");
        assert_eq!(settings.db, "d");
    }
}
