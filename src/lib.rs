//! # pg_probackup Exporter
//!
//! A Prometheus metrics exporter for [pg_probackup](https://github.com/postgrespro/pg_probackup)
//! backup catalogs.
//!
//! ## Overview
//!
//! Once a minute the exporter runs `pg_probackup show --backup-path <dir> --format=json`,
//! parses the report and publishes, for every backup, labeled by
//! `instance`, `backup_mode` and `backup_id`:
//!
//! - `pg_probackup_status` (1 = OK, 0 = anything else)
//! - `pg_probackup_size_bytes`
//! - `pg_probackup_wal_bytes`
//! - `pg_probackup_integrity_check` (1 = OK, 0 = anything else)
//!
//! Series are overwritten in place and never removed. A failed poll leaves the
//! previous values in place and only flips `pg_probackup_up` to 0.
//!
//! ## Quick Start
//!
//! ```no_run
//! use pg_probackup_exporter::{
//!     metrics::BackupMetrics, scheduler::{Scheduler, POLL_INTERVAL},
//!     server::start_server, source::ProbackupCommand,
//! };
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let metrics = Arc::new(BackupMetrics::new()?);
//!     let command = ProbackupCommand::new("pg_probackup-14", "/var/lib/pg_probackup", None);
//!
//!     let (_stop, stop_rx) = tokio::sync::broadcast::channel(1);
//!     tokio::spawn(Scheduler::new(command, metrics.clone(), POLL_INTERVAL).run(stop_rx));
//!
//!     start_server("0.0.0.0:9231", metrics).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`config`] - Configuration management
//! - [`error`] - Error types and handling
//! - [`metrics`] - Gauge registry and report translation
//! - [`report`] - Report model and strict JSON parsing
//! - [`scheduler`] - Poll loop
//! - [`server`] - HTTP server for exposing metrics
//! - [`source`] - pg_probackup subprocess invocation

pub mod config;
pub mod error;
pub mod metrics;
pub mod report;
pub mod scheduler;
pub mod server;
pub mod source;

pub use error::{ExporterError, Result};
