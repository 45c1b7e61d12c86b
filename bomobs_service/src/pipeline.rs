//! One ingest run, end to end.
//!
//! Fetching → Extracting → Canonicalizing → Syncing (filter + write per
//! station) → Done. The first error from any stage ends the run in Failed;
//! no further stations are processed and nothing is retried. Nothing
//! survives the run except what was written to the store.

use std::fs;
use std::path::Path;

use tracing::{debug, info, warn};

use crate::analysis::groupings::{group_by_station, partition_len};
use crate::bundles::find_bundle;
use crate::canonical::canonicalize_all;
use crate::config::Config;
use crate::error::{IngestError, Result};
use crate::ingest::archive::{extract_documents, list_documents};
use crate::ingest::bom::{RawObservation, parse_observation_document};
use crate::ingest::ftp::{BundleSource, FtpBundleSource};
use crate::logging::DataSource;
use crate::store::{self, ObservationStore};
use crate::sync::filter::filter_new_events;
use crate::sync::writer::write_station_events;

// ---------------------------------------------------------------------------
// Run state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Fetching,
    Extracting,
    Canonicalizing,
    Syncing,
    Done,
    Failed,
}

struct RunTracker {
    state: RunState,
}

impl RunTracker {
    fn new() -> Self {
        debug!(state = ?RunState::Fetching, "run started");
        Self {
            state: RunState::Fetching,
        }
    }

    fn enter(&mut self, next: RunState) {
        debug!(from = ?self.state, to = ?next, "run state change");
        self.state = next;
    }

    /// Records the outcome of a stage, moving to Failed on error.
    fn check<T>(&mut self, result: Result<T>) -> Result<T> {
        if result.is_err() {
            self.enter(RunState::Failed);
        }
        result
    }
}

/// Counters reported at the end of a successful run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub bundles_fetched: usize,
    pub bundles_skipped: usize,
    pub documents: usize,
    pub observations: usize,
    pub stations: usize,
    pub events_written: usize,
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// Runs one ingest against the configured FTP server and store.
///
/// The working directory is a fresh temporary directory, removed when the
/// run ends whichever way it ends.
pub fn run(config: &Config) -> Result<RunSummary> {
    let workdir = tempfile::Builder::new().prefix("bom_observations").tempdir()?;

    let mut store = store::connect(&config.store)?;
    let mut source = FtpBundleSource::connect(&config.source)?;

    let outcome = run_with(
        &mut source,
        &mut *store,
        &config.source.bundles,
        &config.store.index,
        workdir.path(),
    );

    source.quit();
    outcome
}

/// Runs one ingest with explicit collaborators.
///
/// `workdir` receives the extracted documents and should be empty.
pub fn run_with<B, S>(
    source: &mut B,
    store: &mut S,
    bundles: &[String],
    collection: &str,
    workdir: &Path,
) -> Result<RunSummary>
where
    B: BundleSource + ?Sized,
    S: ObservationStore + ?Sized,
{
    let mut tracker = RunTracker::new();
    let mut summary = RunSummary::default();

    let extracted = workdir.join("extracted");
    tracker.check(fs::create_dir_all(&extracted).map_err(IngestError::from))?;

    let collected = collect_observations(source, bundles, &extracted, &mut tracker, &mut summary);
    let raws = tracker.check(collected)?;

    tracker.enter(RunState::Canonicalizing);
    let events = tracker.check(canonicalize_all(&raws))?;
    let partition = group_by_station(events);
    summary.stations = partition.len();
    debug!(
        stations = summary.stations,
        events = partition_len(&partition),
        "partitioned events by station"
    );

    tracker.enter(RunState::Syncing);
    for (wmo, station_events) in partition {
        let fresh = tracker.check(filter_new_events(store, collection, wmo, station_events))?;
        summary.events_written +=
            tracker.check(write_station_events(store, collection, wmo, fresh))?;
    }

    tracker.enter(RunState::Done);
    Ok(summary)
}

/// Fetches and extracts every bundle, then decodes all extracted documents.
fn collect_observations<B>(
    source: &mut B,
    bundles: &[String],
    extracted: &Path,
    tracker: &mut RunTracker,
    summary: &mut RunSummary,
) -> Result<Vec<RawObservation>>
where
    B: BundleSource + ?Sized,
{
    let mut fetched = Vec::new();
    for name in bundles {
        let region = find_bundle(name).map(|b| b.region).unwrap_or("unregistered");
        match source.fetch_bundle(name)? {
            Some(bytes) => {
                info!(source = %DataSource::Ftp, bundle = %name, region, bytes = bytes.len(), "fetched bundle");
                fetched.push((name, bytes));
            }
            None => {
                warn!(source = %DataSource::Ftp, bundle = %name, region, "skipping bundle as not found");
                summary.bundles_skipped += 1;
            }
        }
    }
    summary.bundles_fetched = fetched.len();

    tracker.enter(RunState::Extracting);
    for (name, bytes) in &fetched {
        let written = extract_documents(name, bytes, extracted)?;
        debug!(source = %DataSource::Archive, bundle = %name, documents = written.len(), "extracted bundle");
    }

    let documents = list_documents(extracted)?;
    summary.documents = documents.len();

    let mut raws = Vec::new();
    for path in &documents {
        let bytes = fs::read(path)?;
        let label = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        raws.extend(parse_observation_document(&label, &bytes)?);
    }
    summary.observations = raws.len();

    Ok(raws)
}
