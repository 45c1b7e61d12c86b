//! Structured logging for the observation ingest service
//!
//! Console output goes through `tracing-subscriber` (pretty or JSON), with an
//! optional JSON file copy for scheduled runs. Events carry the data source
//! and, where relevant, the bundle or station they concern.

use std::fmt;
use std::path::Path;

use tracing::{error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt as layer_fmt, prelude::*};

use crate::config::{LogFormat, LoggingConfig};
use crate::error::IngestError;
use crate::pipeline::RunSummary;

const DEFAULT_DIRECTIVE: &str = "bomobs_service=info";

// ---------------------------------------------------------------------------
// Data Source Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataSource {
    Ftp,
    Archive,
    Store,
    System,
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSource::Ftp => write!(f, "FTP"),
            DataSource::Archive => write!(f, "ARCHIVE"),
            DataSource::Store => write!(f, "STORE"),
            DataSource::System => write!(f, "SYS"),
        }
    }
}

// ---------------------------------------------------------------------------
// Failure Classification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureType {
    /// The remote side or the store misbehaved; likely transient.
    External,
    /// The data itself is malformed; re-running will fail the same way.
    Data,
    /// The service is misconfigured or the host is unhealthy.
    Setup,
}

impl fmt::Display for FailureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureType::External => write!(f, "EXTERNAL"),
            FailureType::Data => write!(f, "DATA"),
            FailureType::Setup => write!(f, "SETUP"),
        }
    }
}

/// Classify a run failure and the source it came from.
pub fn classify_failure(err: &IngestError) -> (DataSource, FailureType) {
    match err {
        IngestError::Retrieval { .. } => (DataSource::Ftp, FailureType::External),
        IngestError::Extraction { .. } => (DataSource::Archive, FailureType::Data),
        IngestError::Parse { .. } | IngestError::MalformedTimestamp { .. } => {
            (DataSource::Archive, FailureType::Data)
        }
        IngestError::StoreQuery { .. } | IngestError::StoreWrite { .. } => {
            (DataSource::Store, FailureType::External)
        }
        IngestError::StoreDecode { .. } => (DataSource::Store, FailureType::Data),
        IngestError::Config(_) | IngestError::Io(_) => (DataSource::System, FailureType::Setup),
    }
}

// ---------------------------------------------------------------------------
// Initialisation
// ---------------------------------------------------------------------------

/// Keeps the file writer flushing until dropped. Hold it for the whole run.
pub struct LogGuard {
    _file: Option<WorkerGuard>,
}

/// Installs the global subscriber. `RUST_LOG` overrides the default filter.
pub fn init_logging(config: &LoggingConfig) -> LogGuard {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE));

    let (file_layer, guard) = match config.file.as_deref() {
        Some(path) => {
            let path = Path::new(path);
            let directory = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
            let file_name = path.file_name().map(|n| n.to_os_string()).unwrap_or_else(|| "bomobs.log".into());
            let appender = tracing_appender::rolling::never(directory, file_name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (Some(layer_fmt::layer().json().with_writer(writer)), Some(guard))
        }
        None => (None, None),
    };

    let (pretty_layer, json_layer) = match config.format {
        LogFormat::Pretty => (Some(layer_fmt::layer().with_writer(std::io::stderr)), None),
        LogFormat::Json => (None, Some(layer_fmt::layer().json().with_writer(std::io::stderr))),
    };

    // A second init (e.g. from tests) keeps the first subscriber.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(pretty_layer)
        .with(json_layer)
        .with(file_layer)
        .try_init();

    LogGuard { _file: guard }
}

// ---------------------------------------------------------------------------
// Run Logging
// ---------------------------------------------------------------------------

/// Log a failed run with its classification.
pub fn log_run_failure(err: &IngestError) {
    let (source, failure_type) = classify_failure(err);
    error!(
        source = %source,
        failure = %failure_type,
        stage = err.stage(),
        "ingest run failed: {}",
        err
    );
}

/// Log a summary of a completed run.
pub fn log_run_summary(summary: &RunSummary) {
    let message = format!(
        "Run complete: {}/{} bundles fetched, {} documents, {} observations across {} stations, {} new events written",
        summary.bundles_fetched,
        summary.bundles_fetched + summary.bundles_skipped,
        summary.documents,
        summary.observations,
        summary.stations,
        summary.events_written,
    );

    if summary.bundles_fetched == 0 {
        warn!(source = %DataSource::System, "{}", message);
    } else {
        info!(source = %DataSource::System, "{}", message);
    }
}
