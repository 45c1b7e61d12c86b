//! BOM observation document decoding
//!
//! Each `.json` member of a bundle holds the latest observations for one
//! station, shaped as `{"observations": {"data": [ ... ]}}`. Field names are
//! fixed and case-sensitive. Unknown fields are ignored, and a field that is
//! missing or `null` decodes to its zero value (0, empty string, empty list).
//!
//! Product description: http://www.bom.gov.au/catalogue/observations/about.shtml

use serde::{Deserialize, Deserializer};

use crate::error::{IngestError, Result};

// ============================================================================
// Document Structures
// ============================================================================

/// Top level of one extracted document.
#[derive(Debug, Default, Deserialize)]
pub struct ObservationDocument {
    #[serde(default, deserialize_with = "null_as_default")]
    pub observations: ObservationList,
}

#[derive(Debug, Default, Deserialize)]
pub struct ObservationList {
    #[serde(default, deserialize_with = "null_as_default")]
    pub data: Vec<RawObservation>,
}

/// One station reading exactly as published.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawObservation {
    #[serde(default, deserialize_with = "null_as_default")]
    pub wmo: i32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub time_zone_name: String,
    /// UTC offset label, e.g. `+10:00`.
    #[serde(rename = "TDZ", default, deserialize_with = "null_as_default")]
    pub tdz: String,
    #[serde(rename = "aifstime_utc", default, deserialize_with = "null_as_default")]
    pub time_utc: String,
    /// Local time as `yyyyMMddHHmmss`.
    #[serde(rename = "aifstime_local", default, deserialize_with = "null_as_default")]
    pub time_local: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub lat: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub lon: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub apparent_t: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub delta_t: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub air_temp: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub gust_kmh: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub gust_kt: f64,
    #[serde(rename = "dewpt", default, deserialize_with = "null_as_default")]
    pub dew_point: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub press: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub press_msl: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub press_qnh: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub press_tend: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub rain_hour: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub rain_ten: f64,
    /// Free text: a number, an empty string, or a marker such as `-`.
    #[serde(default, deserialize_with = "null_as_default")]
    pub rain_trace: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub rain_trace_time_utc: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub local_9am_date_time_utc: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub rel_hum: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub wind_dir_deg: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub wind_spd_kmh: f64,
}

/// Reads an explicit `null` as the type's zero value. Together with
/// `#[serde(default)]` this covers both absent and null fields.
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

// ============================================================================
// Parsing
// ============================================================================

/// Decode one extracted document into its raw observations.
///
/// `document` names the source (usually the member file name) for error
/// reporting only.
pub fn parse_observation_document(document: &str, bytes: &[u8]) -> Result<Vec<RawObservation>> {
    let parsed: ObservationDocument =
        serde_json::from_slice(bytes).map_err(|source| IngestError::Parse {
            document: document.to_string(),
            source,
        })?;

    Ok(parsed.observations.data)
}

// ============================================================================
// Tests
// ============================================================================
