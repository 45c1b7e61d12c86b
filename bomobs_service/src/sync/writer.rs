//! Bulk insert of filtered events.

use tracing::{info, warn};

use crate::error::Result;
use crate::model::CanonicalEvent;
use crate::store::{BulkRequest, ObservationStore};

/// One insert operation per event, or `None` when there is nothing to write.
pub fn build_bulk_request(
    collection: &str,
    wmo: i32,
    events: Vec<CanonicalEvent>,
) -> Option<BulkRequest> {
    if events.is_empty() {
        return None;
    }

    Some(BulkRequest {
        collection: collection.to_string(),
        wmo,
        documents: events,
    })
}

/// Submits the station's events and returns how many the store accepted.
///
/// Nothing is sent for an empty batch. A rejected request is returned as an
/// error; documents rejected one by one are logged and left out of the count.
/// There is no retry or further chunking.
pub fn write_station_events<S>(
    store: &mut S,
    collection: &str,
    wmo: i32,
    events: Vec<CanonicalEvent>,
) -> Result<usize>
where
    S: ObservationStore + ?Sized,
{
    let Some(request) = build_bulk_request(collection, wmo, events) else {
        return Ok(0);
    };

    let submitted = request.operation_count();
    let written = store.bulk_insert(&request)?;

    if written < submitted {
        warn!(wmo, submitted, rejected = submitted - written, collection, "bulk insert partially rejected");
    } else {
        info!(wmo, written, collection, "bulk insert accepted");
    }
    Ok(written)
}
