//! Core data types for the BOM observation ingest service.
//!
//! This module defines the canonical event model shared by the
//! canonicalizer, the partitioner, the incremental filter and the store
//! backends. It contains no I/O.

use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Format of the source's local timestamp joined with its UTC offset,
/// e.g. `20230615143000 +10:00`.
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S %:z";

/// Collection (index) that canonical events are written to by default.
pub const DEFAULT_INDEX: &str = "bom-observations";

// ---------------------------------------------------------------------------
// Canonical event
// ---------------------------------------------------------------------------

/// WGS84 position of a station.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub lat: f64,
    pub lon: f64,
}

/// One station observation in its normalized, storage-ready form.
///
/// Serialized field names are the stored document's field names; the store
/// backends query on `wmo` and sort on `timestamp`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalEvent {
    pub wmo: i32,
    pub name: String,
    /// Absolute instant, serialized as RFC 3339 with the source offset.
    pub timestamp: DateTime<FixedOffset>,
    pub location: Location,
    pub temperature_apparent: f64,
    pub temperature_delta: f64,
    pub temperature: f64,
    pub dew_point: f64,
    pub humidity: f64,
    pub pressure_msl: f64,
    pub pressure_qnh: f64,
    pub wind_speed: f64,
    pub wind_direction: f64,
    /// Always finite; unreadable source text is stored as `0.0`.
    pub rainfall_trace: f64,
    pub rainfall_hour: f64,
    pub rainfall_ten: f64,
}

// ---------------------------------------------------------------------------
// Partitions
// ---------------------------------------------------------------------------

/// Canonical events of one run keyed by station id.
///
/// Events keep the order in which they were produced. Keys iterate in
/// ascending station id.
pub type StationPartition = BTreeMap<i32, Vec<CanonicalEvent>>;
