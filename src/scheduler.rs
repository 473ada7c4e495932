//! Poll loop driving source -> parser -> metrics.

use crate::error::Result;
use crate::metrics::BackupMetrics;
use crate::report;
use crate::source::ReportSource;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{error, info};

/// Wait between the end of one poll and the start of the next.
pub const POLL_INTERVAL: Duration = Duration::from_secs(60);

/// Periodically refreshes [`BackupMetrics`] from a [`ReportSource`].
pub struct Scheduler<S> {
    source: S,
    metrics: Arc<BackupMetrics>,
    interval: Duration,
}

impl<S: ReportSource> Scheduler<S> {
    /// Create a scheduler polling every `interval`.
    pub fn new(source: S, metrics: Arc<BackupMetrics>, interval: Duration) -> Self {
        Self {
            source,
            metrics,
            interval,
        }
    }

    /// Run a single fetch + parse + apply cycle.
    ///
    /// On failure nothing but `pg_probackup_up` is touched, so scrapers keep
    /// seeing the previous cycle's backup values.
    pub async fn run_once(&self) -> Result<usize> {
        let outcome = self.cycle().await;

        match &outcome {
            Ok(applied) => {
                self.metrics.mark_success();
                info!("Updated metrics for {} backups", applied);
            }
            Err(e) => {
                self.metrics.mark_failure();
                error!("Error getting pg_probackup status: {}", e);
            }
        }

        outcome
    }

    async fn cycle(&self) -> Result<usize> {
        let raw = self.source.fetch().await?;
        let reports = report::parse(&raw)?;
        Ok(self.metrics.apply(&reports))
    }

    /// Poll until `shutdown` fires. Errors are logged and never end the loop.
    ///
    /// Shutdown also abandons a cycle in flight; dropping it kills the child.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        info!("Polling pg_probackup every {:?}", self.interval);

        loop {
            tokio::select! {
                // Already logged; the next tick is the retry.
                _ = self.run_once() => {}
                _ = shutdown.recv() => {
                    info!("Scheduler stopping during poll");
                    break;
                }
            }

            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                _ = shutdown.recv() => {
                    info!("Scheduler stopping");
                    break;
                }
            }
        }
    }
}
