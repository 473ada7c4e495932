//! pg_probackup invocation.
//!
//! This module runs `pg_probackup show --format=json` as a subprocess and
//! hands back its buffered standard output.

use crate::config::ProbackupConfig;
use crate::error::{ExporterError, Result};
use std::future::Future;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, warn};

/// Something that can produce a raw backup report.
pub trait ReportSource: Send + Sync {
    /// Fetch one complete report.
    fn fetch(&self) -> impl Future<Output = Result<Vec<u8>>> + Send;
}

/// Runs the pg_probackup binary against a backup catalog.
#[derive(Debug, Clone)]
pub struct ProbackupCommand {
    binary_path: PathBuf,
    backup_path: PathBuf,
    timeout: Option<Duration>,
}

impl ProbackupCommand {
    /// Create a new command runner.
    ///
    /// # Arguments
    ///
    /// * `binary_path` - pg_probackup executable (path or name on `$PATH`)
    /// * `backup_path` - backup catalog root
    /// * `timeout` - how long one invocation may run, `None` for no limit
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use pg_probackup_exporter::source::{ProbackupCommand, ReportSource};
    /// use std::time::Duration;
    ///
    /// # async fn run() -> pg_probackup_exporter::Result<()> {
    /// let command = ProbackupCommand::new(
    ///     "/usr/bin/pg_probackup-14",
    ///     "/var/lib/pg_probackup",
    ///     Some(Duration::from_secs(300)),
    /// );
    /// let raw = command.fetch().await?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn new(
        binary_path: impl Into<PathBuf>,
        backup_path: impl Into<PathBuf>,
        timeout: Option<Duration>,
    ) -> Self {
        Self {
            binary_path: binary_path.into(),
            backup_path: backup_path.into(),
            timeout,
        }
    }

    /// Build from loaded settings.
    pub fn from_config(config: &ProbackupConfig) -> Self {
        Self::new(&config.binary_path, &config.backup_path, config.timeout())
    }

    async fn run(&self) -> Result<Vec<u8>> {
        let output = Command::new(&self.binary_path)
            .arg("show")
            .arg("--backup-path")
            .arg(&self.backup_path)
            .arg("--format=json")
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                ExporterError::Source(format!(
                    "failed to run {}: {}",
                    self.binary_path.display(),
                    e
                ))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!(
                "{} exited with {}: {}",
                self.binary_path.display(),
                output.status,
                stderr.trim()
            );
            return Err(ExporterError::Source(format!(
                "{} exited with {}: {}",
                self.binary_path.display(),
                output.status,
                stderr.trim()
            )));
        }

        debug!("pg_probackup returned {} bytes", output.stdout.len());
        Ok(output.stdout)
    }
}

impl ReportSource for ProbackupCommand {
    async fn fetch(&self) -> Result<Vec<u8>> {
        debug!(
            "Running {} show --backup-path {} --format=json",
            self.binary_path.display(),
            self.backup_path.display()
        );

        match self.timeout {
            Some(limit) => timeout(limit, self.run()).await.map_err(|_| {
                ExporterError::Source(format!("timed out after {}s", limit.as_secs_f64()))
            })?,
            None => self.run().await,
        }
    }
}
