use anyhow::Result;
use clap::Parser;
use pg_probackup_exporter::{
    config::Settings,
    metrics::BackupMetrics,
    scheduler::{Scheduler, POLL_INTERVAL},
    server::start_server,
    source::ProbackupCommand,
};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// pg_probackup Exporter - Prometheus metrics exporter for pg_probackup backups
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the directory with pg_probackup backups
    #[arg(long = "data-dir", value_name = "PATH")]
    data_dir: String,

    /// Path to the pg_probackup executable (e.g. /usr/bin/pg_probackup-14)
    #[arg(long = "pg_probackup_path", value_name = "PATH")]
    pg_probackup_path: String,

    /// Path to configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse();

    // Load configuration
    let settings = Settings::load(args.config.as_deref(), &args.pg_probackup_path, &args.data_dir)?;

    // Initialize logging
    init_logging(&settings.exporter.log_level, &settings.exporter.log_format)?;

    info!("Starting pg_probackup Exporter");
    info!("pg_probackup binary: {}", settings.probackup.binary_path);
    info!("Backup path: {}", settings.probackup.backup_path);
    info!("Listen address: {}", settings.exporter.listen_address);

    let metrics = Arc::new(BackupMetrics::new()?);
    info!("Metrics registry initialized");

    // Start polling
    let command = ProbackupCommand::from_config(&settings.probackup);
    let scheduler = Scheduler::new(command, metrics.clone(), POLL_INTERVAL);
    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    let poller = tokio::spawn(scheduler.run(shutdown_rx));

    // Start HTTP server
    info!("Starting HTTP server...");
    let result = start_server(&settings.exporter.listen_address, metrics).await;

    let _ = shutdown_tx.send(());
    let _ = poller.await;

    if let Err(e) = result {
        error!("Server error: {}", e);
        return Err(e.into());
    }

    Ok(())
}

/// Initialize structured logging with tracing.
fn init_logging(log_level: &str, log_format: &str) -> Result<()> {
    let env_filter = EnvFilter::try_new(log_level)?;

    if log_format == "json" {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::{error::ErrorKind, CommandFactory};

    #[test]
    fn test_cli_definition_is_valid() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_both_paths_are_required() {
        let err = Args::try_parse_from(["pg-probackup-exporter", "--data-dir", "/b"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
        assert_ne!(err.exit_code(), 0);

        let err = Args::try_parse_from([
            "pg-probackup-exporter",
            "--pg_probackup_path",
            "/usr/bin/pg_probackup-14",
        ])
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn test_help_exits_zero() {
        let err = Args::try_parse_from(["pg-probackup-exporter", "--help"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DisplayHelp);
        assert_eq!(err.exit_code(), 0);
    }

    #[test]
    fn test_parses_flags() {
        let args = Args::try_parse_from([
            "pg-probackup-exporter",
            "--data-dir",
            "/var/lib/pg_probackup",
            "--pg_probackup_path",
            "/usr/bin/pg_probackup-14",
        ])
        .unwrap();

        assert_eq!(args.data_dir, "/var/lib/pg_probackup");
        assert_eq!(args.pg_probackup_path, "/usr/bin/pg_probackup-14");
        assert!(args.config.is_none());
    }
}
