//! Per-station deduplication against the latest stored event.
//!
//! The latest stored event for a station acts as a watermark: anything at or
//! before it is assumed to be persisted already. The lookup and the later
//! write are not transactional, so two overlapping runs can both write the
//! same events.

use chrono::{DateTime, FixedOffset};
use tracing::debug;

use crate::error::{IngestError, Result};
use crate::model::CanonicalEvent;
use crate::store::ObservationStore;

/// Returns the events of `wmo` that are not yet persisted, in input order.
///
/// With nothing stored for the station every event is returned. Otherwise
/// only events strictly after the stored watermark survive; an event at
/// exactly the watermark is dropped. Lookup and decode failures are returned
/// as errors, never read as "nothing stored".
pub fn filter_new_events<S>(
    store: &mut S,
    collection: &str,
    wmo: i32,
    events: Vec<CanonicalEvent>,
) -> Result<Vec<CanonicalEvent>>
where
    S: ObservationStore + ?Sized,
{
    let Some(watermark) = latest_stored(store, collection, wmo)? else {
        debug!(wmo, kept = events.len(), "no stored events, keeping all");
        return Ok(events);
    };

    let before = events.len();
    let kept = retain_newer(events, watermark.timestamp);
    debug!(
        wmo,
        watermark = %watermark.timestamp,
        kept = kept.len(),
        dropped = before - kept.len(),
        "filtered against latest stored event"
    );
    Ok(kept)
}

/// The station's most recent stored event, if any.
pub fn latest_stored<S>(store: &mut S, collection: &str, wmo: i32) -> Result<Option<CanonicalEvent>>
where
    S: ObservationStore + ?Sized,
{
    let result = store.latest_for_station(collection, wmo)?;

    // A positive total with no source is a broken response, not an empty store.
    let Some(source) = result.hits.into_iter().next() else {
        if result.total_hits > 0 {
            return Err(IngestError::StoreQuery {
                wmo,
                message: format!("{} matches reported but no document returned", result.total_hits),
            });
        }
        return Ok(None);
    };

    serde_json::from_value(source)
        .map(Some)
        .map_err(|source| IngestError::StoreDecode { wmo, source })
}

/// Stable filter keeping events strictly after `watermark`.
pub fn retain_newer(
    events: Vec<CanonicalEvent>,
    watermark: DateTime<FixedOffset>,
) -> Vec<CanonicalEvent> {
    events
        .into_iter()
        .filter(|event| event.timestamp > watermark)
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
