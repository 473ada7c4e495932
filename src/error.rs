//! Error types for the pg_probackup exporter.
//!
//! This module defines custom error types using `thiserror` for structured
//! error handling throughout the application.

use thiserror::Error;

/// Main error type for exporter operations.
#[derive(Debug, Error)]
pub enum ExporterError {
    /// pg_probackup could not be started, waited on, timed out or exited non-zero
    #[error("pg_probackup invocation failed: {0}")]
    Source(String),

    /// Report did not match the expected `show --format=json` shape
    #[error("Failed to parse pg_probackup report: {0}")]
    Parse(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// Metrics error
    #[error("Metrics error: {0}")]
    Metrics(String),

    /// HTTP server error
    #[error("HTTP server error: {0}")]
    Server(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for exporter operations.
pub type Result<T> = std::result::Result<T, ExporterError>;
