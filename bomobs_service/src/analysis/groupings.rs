//! Per-station grouping of canonical events.

use crate::model::{CanonicalEvent, StationPartition};

/// Groups events by station id.
///
/// Within a station, events keep their input order; nothing is sorted or
/// deduplicated and no event is dropped. An empty input yields an empty
/// partition.
pub fn group_by_station<I>(events: I) -> StationPartition
where
    I: IntoIterator<Item = CanonicalEvent>,
{
    events
        .into_iter()
        .fold(StationPartition::new(), |mut partition, event| {
            partition.entry(event.wmo).or_default().push(event);
            partition
        })
}

/// Total number of events held across all stations.
pub fn partition_len(partition: &StationPartition) -> usize {
    partition.values().map(Vec::len).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Location;
    use chrono::{FixedOffset, TimeZone};

    fn event(wmo: i32, hour: u32) -> CanonicalEvent {
        CanonicalEvent {
            wmo,
            name: format!("Station {}", wmo),
            timestamp: FixedOffset::east_opt(10 * 3600)
                .unwrap()
                .with_ymd_and_hms(2023, 6, 15, hour, 0, 0)
                .unwrap(),
            location: Location { lat: -33.9, lon: 151.2 },
            temperature_apparent: 0.0,
            temperature_delta: 0.0,
            temperature: 0.0,
            dew_point: 0.0,
            humidity: 0.0,
            pressure_msl: 0.0,
            pressure_qnh: 0.0,
            wind_speed: 0.0,
            wind_direction: 0.0,
            rainfall_trace: 0.0,
            rainfall_hour: 0.0,
            rainfall_ten: 0.0,
        }
    }

    #[test]
    fn test_empty_input_gives_empty_partition() {
        let partition = group_by_station(Vec::new());
        assert!(partition.is_empty());
    }

    #[test]
    fn test_groups_by_station_preserving_order() {
        // Deliberately out of time order within station 94768.
        let events = vec![
            event(94768, 14),
            event(95936, 9),
            event(94768, 12),
            event(94768, 13),
            event(95936, 8),
        ];

        let partition = group_by_station(events);

        assert_eq!(partition.len(), 2);
        let sydney: Vec<u32> = partition[&94768]
            .iter()
            .map(|e| chrono::Timelike::hour(&e.timestamp))
            .collect();
        assert_eq!(sydney, vec![14, 12, 13], "input order must be kept, not sorted");

        let melbourne: Vec<u32> = partition[&95936]
            .iter()
            .map(|e| chrono::Timelike::hour(&e.timestamp))
            .collect();
        assert_eq!(melbourne, vec![9, 8]);
    }

    #[test]
    fn test_no_events_are_lost_or_deduplicated() {
        let events = vec![event(1, 1), event(1, 1), event(2, 1), event(3, 1), event(1, 2)];
        let input_len = events.len();

        let partition = group_by_station(events);

        assert_eq!(partition_len(&partition), input_len);
        assert_eq!(partition[&1].len(), 3, "duplicates are kept");
    }
}
