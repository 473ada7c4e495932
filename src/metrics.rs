//! Prometheus metrics definitions and update logic.
//!
//! This module owns the gauge registry exposed by the exporter and the
//! translation of parsed pg_probackup reports into gauge values.

use crate::error::{ExporterError, Result};
use crate::report::InstanceReport;
use prometheus::{Encoder, Gauge, GaugeVec, Opts, Registry, TextEncoder};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::debug;

/// Label schema shared by all per-backup families.
const BACKUP_LABELS: &[&str] = &["instance", "backup_mode", "backup_id"];

/// Gauge registry for the exporter.
///
/// Series are keyed by `(instance, backup_mode, backup_id)` and only ever
/// overwritten, never removed: a backup that disappears from the catalog
/// keeps its last values until restart.
#[derive(Clone)]
pub struct BackupMetrics {
    registry: Registry,

    // Per-backup metrics
    status: GaugeVec,
    size_bytes: GaugeVec,
    wal_bytes: GaugeVec,
    integrity_check: GaugeVec,

    // Exporter metrics
    up: Gauge,
    last_success_timestamp_seconds: Gauge,
}

impl BackupMetrics {
    /// Create a fresh registry with all families registered and empty.
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let status = backup_gauge_vec(
            &registry,
            "pg_probackup_status",
            "Status of current backup 1 - OK, 0 - FAIL",
        )?;
        let size_bytes =
            backup_gauge_vec(&registry, "pg_probackup_size_bytes", "Backup data size in bytes")?;
        let wal_bytes =
            backup_gauge_vec(&registry, "pg_probackup_wal_bytes", "Backup WAL size in bytes")?;
        let integrity_check = backup_gauge_vec(
            &registry,
            "pg_probackup_integrity_check",
            "Integrity check status 1 - OK, 0 - FAIL",
        )?;

        let up = Gauge::with_opts(Opts::new(
            "pg_probackup_up",
            "Whether the last pg_probackup poll was successful (1 = success, 0 = failure)",
        ))
        .map_err(|e| ExporterError::Metrics(e.to_string()))?;
        registry
            .register(Box::new(up.clone()))
            .map_err(|e| ExporterError::Metrics(e.to_string()))?;

        let last_success_timestamp_seconds = Gauge::with_opts(Opts::new(
            "pg_probackup_last_success_timestamp_seconds",
            "Unix timestamp of the last successful pg_probackup poll",
        ))
        .map_err(|e| ExporterError::Metrics(e.to_string()))?;
        registry
            .register(Box::new(last_success_timestamp_seconds.clone()))
            .map_err(|e| ExporterError::Metrics(e.to_string()))?;

        #[cfg(target_os = "linux")]
        registry
            .register(Box::new(
                prometheus::process_collector::ProcessCollector::for_self(),
            ))
            .map_err(|e| ExporterError::Metrics(e.to_string()))?;

        Ok(Self {
            registry,
            status,
            size_bytes,
            wal_bytes,
            integrity_check,
            up,
            last_success_timestamp_seconds,
        })
    }

    /// Write every backup of every instance into the per-backup families.
    ///
    /// Pure overwrite per series, so applying the same reports twice leaves
    /// the same state. Returns the number of backups applied.
    pub fn apply(&self, reports: &[InstanceReport]) -> usize {
        let mut applied = 0;

        for instance in reports {
            debug!(
                "Updating backup metrics for {} backups in {}",
                instance.backups.len(),
                instance.instance_name
            );

            for backup in &instance.backups {
                let labels = [
                    instance.instance_name.as_str(),
                    backup.backup_mode.as_str(),
                    backup.id.as_str(),
                ];
                let ok = if backup.is_ok() { 1.0 } else { 0.0 };

                self.status.with_label_values(&labels).set(ok);
                self.size_bytes
                    .with_label_values(&labels)
                    .set(backup.data_bytes);
                self.wal_bytes.with_label_values(&labels).set(backup.wal_bytes);
                // pg_probackup has no separate validation field in `show`, so
                // integrity follows status.
                self.integrity_check.with_label_values(&labels).set(ok);

                applied += 1;
            }
        }

        applied
    }

    /// Record a completed poll.
    pub fn mark_success(&self) {
        self.up.set(1.0);
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs_f64();
        self.last_success_timestamp_seconds.set(now);
    }

    /// Record a failed poll. Backup series are left untouched.
    pub fn mark_failure(&self) {
        self.up.set(0.0);
    }

    /// Encode metrics in Prometheus text format.
    pub fn encode(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();

        let mut buffer = Vec::with_capacity(4096);
        encoder
            .encode(&metric_families, &mut buffer)
            .map_err(|e| ExporterError::Metrics(e.to_string()))?;

        String::from_utf8(buffer).map_err(|e| ExporterError::Metrics(e.to_string()))
    }
}

fn backup_gauge_vec(registry: &Registry, name: &str, help: &str) -> Result<GaugeVec> {
    let gauge = GaugeVec::new(Opts::new(name, help), BACKUP_LABELS)
        .map_err(|e| ExporterError::Metrics(e.to_string()))?;
    registry
        .register(Box::new(gauge.clone()))
        .map_err(|e| ExporterError::Metrics(e.to_string()))?;
    Ok(gauge)
}
