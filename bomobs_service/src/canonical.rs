//! Conversion of raw BOM readings into canonical events.
//!
//! Everything here is a pure function of its input, so observations can be
//! canonicalized in any order or in parallel.

use chrono::DateTime;

use crate::error::{IngestError, Result};
use crate::ingest::bom::RawObservation;
use crate::model::{CanonicalEvent, Location, TIMESTAMP_FORMAT};

/// Builds the canonical event for one raw observation.
///
/// Fails with [`IngestError::MalformedTimestamp`] when the local time and
/// offset cannot be resolved to an absolute instant. Numeric fields are
/// copied without unit conversion or rounding.
pub fn canonicalize(raw: &RawObservation) -> Result<CanonicalEvent> {
    let timestamp = resolve_timestamp(raw)?;

    Ok(CanonicalEvent {
        wmo: raw.wmo,
        name: raw.name.clone(),
        timestamp,
        location: Location {
            lat: raw.lat,
            lon: raw.lon,
        },
        temperature_apparent: raw.apparent_t,
        temperature_delta: raw.delta_t,
        temperature: raw.air_temp,
        dew_point: raw.dew_point,
        humidity: raw.rel_hum,
        pressure_msl: raw.press_msl,
        pressure_qnh: raw.press_qnh,
        wind_speed: raw.wind_spd_kmh,
        wind_direction: raw.wind_dir_deg,
        rainfall_trace: parse_rain_trace(&raw.rain_trace),
        rainfall_hour: raw.rain_hour,
        rainfall_ten: raw.rain_ten,
    })
}

/// Canonicalizes a batch, stopping at the first malformed observation.
pub fn canonicalize_all(raws: &[RawObservation]) -> Result<Vec<CanonicalEvent>> {
    raws.iter().map(canonicalize).collect()
}

/// Joins `aifstime_local` and `TDZ` and parses the result as an instant.
fn resolve_timestamp(raw: &RawObservation) -> Result<chrono::DateTime<chrono::FixedOffset>> {
    let value = format!("{} {}", raw.time_local, raw.tdz);

    DateTime::parse_from_str(&value, TIMESTAMP_FORMAT).map_err(|source| {
        IngestError::MalformedTimestamp {
            wmo: raw.wmo,
            value,
            source,
        }
    })
}

/// Rainfall since 9am, published as text.
///
/// Anything that is not a finite number (`""`, `"-"`, `"Trace"`, `"NaN"`)
/// reads as `0.0`.
pub fn parse_rain_trace(text: &str) -> f64 {
    match text.parse::<f64>() {
        Ok(value) if value.is_finite() => value,
        _ => 0.0,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, TimeZone, Utc};

    fn raw_at(time_local: &str, tdz: &str) -> RawObservation {
        RawObservation {
            wmo: 94868,
            name: "Melbourne Airport".to_string(),
            time_zone_name: "EST".to_string(),
            tdz: tdz.to_string(),
            time_utc: "20230615043000".to_string(),
            time_local: time_local.to_string(),
            lat: -37.7,
            lon: 144.8,
            apparent_t: 8.1,
            delta_t: 1.9,
            air_temp: 11.4,
            gust_kmh: 31.0,
            gust_kt: 17.0,
            dew_point: 6.2,
            press: 1017.9,
            press_msl: 1018.0,
            press_qnh: 1018.1,
            press_tend: "-".to_string(),
            rain_hour: 0.4,
            rain_ten: 0.1,
            rain_trace: "0.2".to_string(),
            rain_trace_time_utc: "20230615043000".to_string(),
            local_9am_date_time_utc: "20230614230000".to_string(),
            rel_hum: 70.0,
            wind_dir_deg: 340.0,
            wind_spd_kmh: 22.0,
        }
    }

    // --- Timestamp resolution ----------------------------------------------

    #[test]
    fn test_timestamp_resolves_local_time_with_offset() {
        let event = canonicalize(&raw_at("20230615143000", "+10:00"))
            .expect("well-formed local time should canonicalize");

        let expected = FixedOffset::east_opt(10 * 3600)
            .unwrap()
            .with_ymd_and_hms(2023, 6, 15, 14, 30, 0)
            .unwrap();
        assert_eq!(event.timestamp, expected);
        assert_eq!(
            event.timestamp.with_timezone(&Utc),
            Utc.with_ymd_and_hms(2023, 6, 15, 4, 30, 0).unwrap(),
        );
    }

    #[test]
    fn test_half_hour_offset_is_honoured() {
        // Adelaide and Darwin publish +09:30.
        let event = canonicalize(&raw_at("20230615143000", "+09:30")).unwrap();
        assert_eq!(
            event.timestamp.with_timezone(&Utc),
            Utc.with_ymd_and_hms(2023, 6, 15, 5, 0, 0).unwrap(),
        );
    }

    #[test]
    fn test_timezone_name_instead_of_offset_is_malformed() {
        let result = canonicalize(&raw_at("20230615143000", "EST"));
        match result {
            Err(IngestError::MalformedTimestamp { wmo, value, .. }) => {
                assert_eq!(wmo, 94868);
                assert_eq!(value, "20230615143000 EST");
            }
            other => panic!("expected MalformedTimestamp, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_local_time_is_malformed() {
        let result = canonicalize(&raw_at("", "+10:00"));
        assert!(matches!(result, Err(IngestError::MalformedTimestamp { .. })));
    }

    #[test]
    fn test_impossible_date_is_malformed() {
        let result = canonicalize(&raw_at("20230231143000", "+10:00"));
        assert!(matches!(result, Err(IngestError::MalformedTimestamp { .. })));
    }

    // --- Field mapping ------------------------------------------------------

    #[test]
    fn test_fields_are_copied_verbatim() {
        let event = canonicalize(&raw_at("20230615143000", "+10:00")).unwrap();

        assert_eq!(event.wmo, 94868);
        assert_eq!(event.name, "Melbourne Airport");
        assert_eq!(event.location, Location { lat: -37.7, lon: 144.8 });
        assert_eq!(event.temperature_apparent, 8.1);
        assert_eq!(event.temperature_delta, 1.9);
        assert_eq!(event.temperature, 11.4);
        assert_eq!(event.dew_point, 6.2);
        assert_eq!(event.humidity, 70.0);
        assert_eq!(event.pressure_msl, 1018.0);
        assert_eq!(event.pressure_qnh, 1018.1);
        assert_eq!(event.wind_speed, 22.0);
        assert_eq!(event.wind_direction, 340.0);
        assert_eq!(event.rainfall_trace, 0.2);
        assert_eq!(event.rainfall_hour, 0.4);
        assert_eq!(event.rainfall_ten, 0.1);
    }

    #[test]
    fn test_canonicalize_all_stops_at_first_malformed() {
        let raws = vec![
            raw_at("20230615140000", "+10:00"),
            raw_at("garbage", "+10:00"),
            raw_at("20230615150000", "+10:00"),
        ];
        assert!(matches!(
            canonicalize_all(&raws),
            Err(IngestError::MalformedTimestamp { .. })
        ));
    }

    // --- Rainfall trace -----------------------------------------------------

    #[test]
    fn test_numeric_trace_is_parsed_exactly() {
        assert_eq!(parse_rain_trace("0.2"), 0.2);
        assert_eq!(parse_rain_trace("12.6"), 12.6);
        assert_eq!(parse_rain_trace("0"), 0.0);
    }

    #[test]
    fn test_non_numeric_trace_reads_as_zero() {
        assert_eq!(parse_rain_trace("-"), 0.0);
        assert_eq!(parse_rain_trace(""), 0.0);
        assert_eq!(parse_rain_trace("Trace"), 0.0);
        assert_eq!(parse_rain_trace("NaN"), 0.0);
        assert_eq!(parse_rain_trace("inf"), 0.0);
    }

    #[test]
    fn test_unreadable_trace_does_not_fail_canonicalization() {
        let mut raw = raw_at("20230615143000", "+10:00");
        raw.rain_trace = "-".to_string();
        let event = canonicalize(&raw).expect("bad trace text must not fail the record");
        assert_eq!(event.rainfall_trace, 0.0);
    }
}
