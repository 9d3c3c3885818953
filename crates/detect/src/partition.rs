//! Groups a flat event stream into per-day buckets.
//!
//! Buckets are keyed by the producer's day label, never by calendar date:
//! an event at 02:00 on the next calendar date still belongs to the day it
//! was tagged with. Within a bucket the input order is preserved.

use std::collections::BTreeMap;

use carewatch_core::{Day, RawSensorEvent, Result, SensorEvent};

/// Events grouped by day label, iterated in ascending day order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DayPartitions {
    days: BTreeMap<Day, Vec<SensorEvent>>,
}

impl DayPartitions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event to its day bucket.
    pub fn push(&mut self, event: SensorEvent) {
        self.days.entry(event.day).or_default().push(event);
    }

    /// Events of one day, in arrival order.
    pub fn get(&self, day: Day) -> Option<&[SensorEvent]> {
        self.days.get(&day).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Day, &[SensorEvent])> {
        self.days.iter().map(|(day, events)| (*day, events.as_slice()))
    }

    pub fn days(&self) -> impl Iterator<Item = Day> + '_ {
        self.days.keys().copied()
    }

    /// Number of distinct days.
    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    /// Total events across all days.
    pub fn event_count(&self) -> usize {
        self.days.values().map(Vec::len).sum()
    }
}

impl FromIterator<SensorEvent> for DayPartitions {
    fn from_iter<I: IntoIterator<Item = SensorEvent>>(iter: I) -> Self {
        let mut partitions = DayPartitions::new();
        for event in iter {
            partitions.push(event);
        }
        partitions
    }
}

/// Partition already-validated events.
pub fn partition(events: &[SensorEvent]) -> DayPartitions {
    events.iter().cloned().collect()
}

/// Validate and partition raw events.
///
/// Fails on the first event that cannot be parsed; the error carries its
/// position in `raw`.
pub fn partition_raw(raw: &[RawSensorEvent]) -> Result<DayPartitions> {
    let mut partitions = DayPartitions::new();
    for (index, event) in raw.iter().enumerate() {
        partitions.push(event.parse(index)?);
    }
    Ok(partitions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use carewatch_core::{CareError, EventType, SensorLocation};
    use chrono::NaiveDate;

    fn event(day: Day, date: (i32, u32, u32), hour: u32, minute: u32) -> SensorEvent {
        let at = NaiveDate::from_ymd_opt(date.0, date.1, date.2)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap();
        SensorEvent::new(at, SensorLocation::Kitchen, EventType::Motion, day)
    }

    #[test]
    fn groups_by_label_not_calendar_date() {
        let events = vec![
            event(7, (2024, 11, 30), 23, 10),
            event(7, (2024, 12, 1), 2, 15),
            event(8, (2024, 12, 1), 7, 0),
        ];

        let partitions = partition(&events);
        assert_eq!(partitions.len(), 2);
        assert_eq!(partitions.get(7).unwrap().len(), 2);
        assert_eq!(partitions.get(8).unwrap().len(), 1);
        assert_eq!(partitions.event_count(), 3);
    }

    #[test]
    fn keeps_arrival_order_within_day() {
        let events = vec![
            event(1, (2024, 11, 24), 9, 0),
            event(1, (2024, 11, 24), 7, 0),
            event(1, (2024, 11, 24), 8, 0),
        ];

        let partitions = partition(&events);
        let hours: Vec<u32> = partitions.get(1).unwrap().iter().map(|e| e.hour()).collect();
        assert_eq!(hours, vec![9, 7, 8]);
    }

    #[test]
    fn days_iterate_ascending() {
        let events = vec![
            event(3, (2024, 11, 26), 9, 0),
            event(1, (2024, 11, 24), 9, 0),
            event(2, (2024, 11, 25), 9, 0),
        ];

        let days: Vec<Day> = partition(&events).days().collect();
        assert_eq!(days, vec![1, 2, 3]);
    }

    #[test]
    fn empty_input_gives_empty_partitions() {
        let partitions = partition(&[]);
        assert!(partitions.is_empty());
        assert_eq!(partitions.iter().count(), 0);
    }

    #[test]
    fn raw_partition_reports_bad_index() {
        let raw = vec![
            RawSensorEvent {
                timestamp: Some("2024-11-24T07:00:00".into()),
                sensor_id: Some("kitchen".into()),
                event_type: None,
                day: Some(1),
                pattern: None,
            },
            RawSensorEvent {
                timestamp: Some("yesterday".into()),
                sensor_id: Some("kitchen".into()),
                event_type: None,
                day: Some(1),
                pattern: None,
            },
        ];

        match partition_raw(&raw) {
            Err(CareError::Parse { index, .. }) => assert_eq!(index, 1),
            other => panic!("expected parse error, got {other:?}"),
        }
    }
}
