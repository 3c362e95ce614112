//! Configuration module for Gator.

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::{GatorError, Result};

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub path: String,
}

fn default_db_path() -> String {
    "data/gator.db".to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Path to the log file. Console only when unset.
    #[serde(default)]
    pub file: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

/// Session configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Path to the JSON file holding the current user.
    #[serde(default = "default_session_path")]
    pub path: String,
}

fn default_session_path() -> String {
    "data/session.json".to_string()
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            path: default_session_path(),
        }
    }
}

/// Aggregator (polling scheduler and feed source) configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AggregatorConfig {
    /// Bound for a single feed retrieval, in seconds.
    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout_secs: u64,
    /// Bound for a single store call, in seconds.
    #[serde(default = "default_store_timeout")]
    pub store_timeout_secs: u64,
    /// Bound for fetching and ingesting one feed, in seconds.
    #[serde(default = "default_cycle_timeout")]
    pub cycle_timeout_secs: u64,
    /// Maximum accepted feed document size in bytes.
    #[serde(default = "default_max_feed_size")]
    pub max_feed_size_bytes: u64,
    /// Maximum number of redirects to follow.
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,
    /// User-Agent header sent with every request.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_fetch_timeout() -> u64 {
    6
}

fn default_store_timeout() -> u64 {
    6
}

fn default_cycle_timeout() -> u64 {
    60
}

fn default_max_feed_size() -> u64 {
    5 * 1024 * 1024 // 5MB
}

fn default_max_redirects() -> usize {
    5
}

fn default_user_agent() -> String {
    "gator".to_string()
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            fetch_timeout_secs: default_fetch_timeout(),
            store_timeout_secs: default_store_timeout(),
            cycle_timeout_secs: default_cycle_timeout(),
            max_feed_size_bytes: default_max_feed_size(),
            max_redirects: default_max_redirects(),
            user_agent: default_user_agent(),
        }
    }
}

impl AggregatorConfig {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_secs(self.store_timeout_secs)
    }

    pub fn cycle_timeout(&self) -> Duration {
        Duration::from_secs(self.cycle_timeout_secs)
    }
}

/// Settings for the `browse` command.
#[derive(Debug, Clone, Deserialize)]
pub struct BrowseConfig {
    /// Number of posts shown when no limit is given.
    #[serde(default = "default_browse_limit")]
    pub default_limit: i64,
}

fn default_browse_limit() -> i64 {
    2
}

impl Default for BrowseConfig {
    fn default() -> Self {
        Self {
            default_limit: default_browse_limit(),
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub aggregator: AggregatorConfig,
    #[serde(default)]
    pub browse: BrowseConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(GatorError::Io)?;
        Self::parse(&content)
    }

    /// Load configuration from a TOML file, or `None` if the file does not exist.
    ///
    /// Any other read failure is an error.
    pub fn load_if_present<P: AsRef<Path>>(path: P) -> Result<Option<Self>> {
        match Self::load(path) {
            Ok(config) => Ok(Some(config)),
            Err(GatorError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| GatorError::Config(format!("config parse error: {e}")))
    }

    /// Apply environment variable overrides to the configuration.
    ///
    /// Supported environment variables:
    /// - `GATOR_DATABASE_PATH`: Override the database file path
    /// - `GATOR_SESSION_PATH`: Override the session file path
    pub fn apply_env_overrides(&mut self) {
        if let Ok(path) = std::env::var("GATOR_DATABASE_PATH") {
            if !path.is_empty() {
                self.database.path = path;
            }
        }
        if let Ok(path) = std::env::var("GATOR_SESSION_PATH") {
            if !path.is_empty() {
                self.session.path = path;
            }
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        let agg = &self.aggregator;
        if agg.fetch_timeout_secs == 0 || agg.store_timeout_secs == 0 || agg.cycle_timeout_secs == 0
        {
            return Err(GatorError::Config(
                "aggregator timeouts must be greater than zero".to_string(),
            ));
        }
        if agg.max_feed_size_bytes == 0 {
            return Err(GatorError::Config(
                "aggregator.max_feed_size_bytes must be greater than zero".to_string(),
            ));
        }
        if agg.user_agent.trim().is_empty() {
            return Err(GatorError::Config(
                "aggregator.user_agent must not be empty".to_string(),
            ));
        }
        if self.browse.default_limit <= 0 {
            return Err(GatorError::Config(
                "browse.default_limit must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.database.path, "data/gator.db");
        assert_eq!(config.logging.level, "info");
        assert!(config.logging.file.is_none());
        assert_eq!(config.session.path, "data/session.json");
        assert_eq!(config.aggregator.fetch_timeout_secs, 6);
        assert_eq!(config.aggregator.store_timeout_secs, 6);
        assert_eq!(config.aggregator.cycle_timeout_secs, 60);
        assert_eq!(config.aggregator.max_feed_size_bytes, 5 * 1024 * 1024);
        assert_eq!(config.aggregator.user_agent, "gator");
        assert_eq!(config.browse.default_limit, 2);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
[database]
path = "/var/lib/gator/gator.db"

[logging]
level = "debug"
file = "/var/log/gator.log"

[session]
path = "/home/alice/.gator-session.json"

[aggregator]
fetch_timeout_secs = 10
store_timeout_secs = 3
cycle_timeout_secs = 120
max_feed_size_bytes = 1024
max_redirects = 2
user_agent = "gator-test"

[browse]
default_limit = 10
"#;

        let config = Config::parse(toml).unwrap();
        assert_eq!(config.database.path, "/var/lib/gator/gator.db");
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.file.as_deref(), Some("/var/log/gator.log"));
        assert_eq!(config.session.path, "/home/alice/.gator-session.json");
        assert_eq!(config.aggregator.fetch_timeout(), Duration::from_secs(10));
        assert_eq!(config.aggregator.store_timeout(), Duration::from_secs(3));
        assert_eq!(config.aggregator.cycle_timeout(), Duration::from_secs(120));
        assert_eq!(config.aggregator.max_feed_size_bytes, 1024);
        assert_eq!(config.aggregator.max_redirects, 2);
        assert_eq!(config.aggregator.user_agent, "gator-test");
        assert_eq!(config.browse.default_limit, 10);
    }

    #[test]
    fn test_parse_partial_config() {
        let toml = r#"
[aggregator]
fetch_timeout_secs = 15
"#;

        let config = Config::parse(toml).unwrap();
        assert_eq!(config.aggregator.fetch_timeout_secs, 15);
        assert_eq!(config.aggregator.store_timeout_secs, 6);
        assert_eq!(config.database.path, "data/gator.db");
    }

    #[test]
    fn test_parse_empty_config() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.database.path, "data/gator.db");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_parse_invalid_config() {
        let result = Config::parse("[aggregator\nfetch_timeout_secs = ");
        assert!(matches!(result, Err(GatorError::Config(_))));
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = Config::load("/nonexistent/path/config.toml");
        assert!(matches!(result, Err(GatorError::Io(_))));
    }

    #[test]
    fn test_load_if_present_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_if_present(dir.path().join("config.toml")).unwrap();
        assert!(config.is_none());
    }

    #[test]
    fn test_load_if_present_unreadable_path_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = Config::load_if_present(dir.path());
        assert!(matches!(result, Err(GatorError::Io(_))));
    }

    #[test]
    fn test_load_if_present_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[browse]\ndefault_limit = 5\n").unwrap();

        let config = Config::load_if_present(&path).unwrap().unwrap();
        assert_eq!(config.browse.default_limit, 5);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[database]\npath = \"custom.db\"\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.database.path, "custom.db");
    }

    #[test]
    fn test_validate_zero_timeout() {
        let mut config = Config::default();
        config.aggregator.store_timeout_secs = 0;
        assert!(matches!(config.validate(), Err(GatorError::Config(_))));
    }

    #[test]
    fn test_validate_empty_user_agent() {
        let mut config = Config::default();
        config.aggregator.user_agent = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_browse_limit() {
        let mut config = Config::default();
        config.browse.default_limit = 0;
        assert!(config.validate().is_err());
    }
}
