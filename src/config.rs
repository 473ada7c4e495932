//! Configuration management for the pg_probackup exporter.
//!
//! Settings are assembled from:
//! - An optional TOML configuration file (an explicit path must exist)
//! - Command-line arguments, which always take precedence

use crate::error::{ExporterError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// pg_probackup invocation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbackupConfig {
    /// Executable to run (e.g., "/usr/bin/pg_probackup-14")
    pub binary_path: String,

    /// Backup catalog passed as `--backup-path`
    pub backup_path: String,

    /// Upper bound for one `show` invocation in seconds (0 = wait forever)
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl ProbackupConfig {
    /// Timeout as a `Duration`, `None` when disabled.
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_seconds > 0).then(|| Duration::from_secs(self.timeout_seconds))
    }
}

/// Exporter specific settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ExporterConfig {
    /// Address to listen on for metrics endpoint
    #[serde(default = "default_listen_address")]
    pub listen_address: String,
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Log output format ("text" or "json")
    #[serde(default = "default_log_format")]
    pub log_format: String,
}

impl Default for ExporterConfig {
    fn default() -> Self {
        Self {
            listen_address: default_listen_address(),
            log_level: default_log_level(),
            log_format: default_log_format(),
        }
    }
}

/// Main configuration structure for the exporter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// pg_probackup configuration
    pub probackup: ProbackupConfig,

    /// Exporter server configuration
    #[serde(default)]
    pub exporter: ExporterConfig,
}

fn default_timeout() -> u64 {
    300
}

fn default_listen_address() -> String {
    "0.0.0.0:9231".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

impl Settings {
    /// Load configuration from an optional file plus the required CLI values.
    ///
    /// # Arguments
    ///
    /// * `config_path` - Optional path to configuration file
    /// * `binary_path` - Value of `--pg_probackup_path`
    /// * `backup_path` - Value of `--data-dir`
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use pg_probackup_exporter::config::Settings;
    ///
    /// let settings = Settings::load(None, "/usr/bin/pg_probackup-14", "/backups").unwrap();
    /// ```
    pub fn load(config_path: Option<&str>, binary_path: &str, backup_path: &str) -> Result<Self> {
        let mut builder = config::Config::builder();

        if let Some(path) = config_path {
            if !Path::new(path).exists() {
                return Err(ExporterError::Config(config::ConfigError::Message(format!(
                    "config file {} does not exist",
                    path
                ))));
            }
            builder = builder.add_source(config::File::with_name(path));
        }

        builder = builder
            .set_override("probackup.binary_path", binary_path)?
            .set_override("probackup.backup_path", backup_path)?;

        let config = builder.build()?;
        let settings: Settings = config.try_deserialize()?;

        settings.validate()?;
        Ok(settings)
    }

    /// Validate configuration settings.
    fn validate(&self) -> Result<()> {
        if self.probackup.binary_path.is_empty() {
            return Err(ExporterError::Config(config::ConfigError::Message(
                "pg_probackup path cannot be empty".to_string(),
            )));
        }

        if self.probackup.backup_path.is_empty() {
            return Err(ExporterError::Config(config::ConfigError::Message(
                "data directory cannot be empty".to_string(),
            )));
        }

        if !matches!(self.exporter.log_format.as_str(), "text" | "json") {
            return Err(ExporterError::Config(config::ConfigError::Message(format!(
                "unknown log format '{}', expected 'text' or 'json'",
                self.exporter.log_format
            ))));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_applies_defaults() {
        let settings = Settings::load(None, "pg_probackup-14", "/var/backups").unwrap();
        assert_eq!(settings.probackup.binary_path, "pg_probackup-14");
        assert_eq!(settings.probackup.backup_path, "/var/backups");
        assert_eq!(settings.probackup.timeout_seconds, 300);
        assert_eq!(settings.exporter.listen_address, "0.0.0.0:9231");
        assert_eq!(settings.exporter.log_level, "info");
        assert_eq!(settings.exporter.log_format, "text");
    }

    #[test]
    fn test_validation_fails_on_empty_paths() {
        assert!(matches!(
            Settings::load(None, "", "/var/backups"),
            Err(ExporterError::Config(_))
        ));
        assert!(matches!(
            Settings::load(None, "pg_probackup", ""),
            Err(ExporterError::Config(_))
        ));
    }

    #[test]
    fn test_missing_config_file_is_rejected() {
        let err = Settings::load(Some("/nonexistent/exporter.toml"), "pg_probackup", "/b")
            .unwrap_err();
        assert!(matches!(err, ExporterError::Config(_)));
        assert!(err.to_string().contains("/nonexistent/exporter.toml"));
    }

    #[test]
    fn test_config_file_and_cli_precedence() {
        let path = std::env::temp_dir().join(format!(
            "pg-probackup-exporter-config-{}.toml",
            std::process::id()
        ));
        std::fs::write(
            &path,
            r#"
[probackup]
binary_path = "from-file"
backup_path = "from-file"
timeout_seconds = 0

[exporter]
listen_address = "127.0.0.1:9999"
log_level = "debug"
log_format = "json"
"#,
        )
        .unwrap();

        let settings =
            Settings::load(path.to_str(), "/usr/bin/pg_probackup-15", "/srv/backups").unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(settings.probackup.binary_path, "/usr/bin/pg_probackup-15");
        assert_eq!(settings.probackup.backup_path, "/srv/backups");
        assert_eq!(settings.probackup.timeout(), None);
        assert_eq!(settings.exporter.listen_address, "127.0.0.1:9999");
        assert_eq!(settings.exporter.log_level, "debug");
        assert_eq!(settings.exporter.log_format, "json");
    }

    #[test]
    fn test_timeout_conversion() {
        let config = ProbackupConfig {
            binary_path: "pg_probackup".to_string(),
            backup_path: "/b".to_string(),
            timeout_seconds: 30,
        };
        assert_eq!(config.timeout(), Some(Duration::from_secs(30)));
    }
}
