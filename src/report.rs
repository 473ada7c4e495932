//! `pg_probackup show --format=json` report model and parser.
//!
//! Decoding is strict: every instance needs `instance` and `backups`, every
//! backup needs `id`, `status`, `backup-mode`, `data-bytes` and `wal-bytes`
//! with the right JSON types. A single bad record rejects the whole report.
//! Unknown fields are ignored since pg_probackup emits many more than we use.

use crate::error::{ExporterError, Result};
use serde::{Deserialize, Serialize};

/// Number of payload bytes quoted in parse errors.
const PREVIEW_LEN: usize = 200;

/// Backups of one pg_probackup instance.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct InstanceReport {
    /// Instance name
    #[serde(rename = "instance")]
    pub instance_name: String,
    /// Backups in the order pg_probackup listed them
    pub backups: Vec<BackupRecord>,
}

/// A single backup entry.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct BackupRecord {
    /// Backup ID (e.g. "S2K8LQ")
    pub id: String,
    /// Backup status ("OK", "ERROR", "RUNNING", "CORRUPT", ...)
    pub status: String,
    /// Backup mode (FULL, PAGE, DELTA, PTRACK)
    #[serde(rename = "backup-mode")]
    pub backup_mode: String,
    /// Data size in bytes
    #[serde(rename = "data-bytes")]
    pub data_bytes: f64,
    /// WAL size in bytes
    #[serde(rename = "wal-bytes")]
    pub wal_bytes: f64,
}

impl BackupRecord {
    /// Whether pg_probackup reported this backup as `OK`.
    pub fn is_ok(&self) -> bool {
        self.status == "OK"
    }
}

/// Decode raw `show` output into instance reports.
pub fn parse(raw: &[u8]) -> Result<Vec<InstanceReport>> {
    serde_json::from_slice(raw).map_err(|e| {
        let preview = String::from_utf8_lossy(&raw[..raw.len().min(PREVIEW_LEN)]);
        ExporterError::Parse(format!("{}. Body preview: {}...", e, preview))
    })
}
