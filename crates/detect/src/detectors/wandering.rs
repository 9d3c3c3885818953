//! Midnight wandering: repeated movement inside the night window.

use std::collections::BTreeMap;

use tracing::debug;

use carewatch_core::{Day, DetectionConfig, SensorEvent, SensorLocation};

use super::{sorted_by_time, Detector};
use crate::types::{AnomalyDetails, AnomalyKind, AnomalyRecord, TimeSpan};

#[derive(Debug, Clone, Copy, Default)]
pub struct MidnightWanderingDetector;

impl Detector for MidnightWanderingDetector {
    fn name(&self) -> &str {
        "midnight_wandering"
    }

    fn kind(&self) -> AnomalyKind {
        AnomalyKind::MidnightWandering
    }

    fn detect(
        &self,
        day: Day,
        events: &[SensorEvent],
        config: &DetectionConfig,
    ) -> Vec<AnomalyRecord> {
        let window = config.midnight_window();
        let night: Vec<&SensorEvent> = sorted_by_time(events)
            .into_iter()
            .filter(|e| window.contains(e.hour()))
            .collect();

        let threshold = config.midnight_event_threshold() as usize;
        let (first, last) = match (night.first(), night.last()) {
            (Some(first), Some(last)) if night.len() >= threshold => (*first, *last),
            _ => return Vec::new(),
        };

        let mut locations: BTreeMap<SensorLocation, usize> = BTreeMap::new();
        for event in &night {
            *locations.entry(event.sensor).or_insert(0) += 1;
        }

        debug!(day, count = night.len(), "night movement over threshold");

        vec![AnomalyRecord::new(
            day,
            AnomalyDetails::MidnightWandering {
                event_count: night.len(),
                time_range: TimeSpan {
                    first: first.timestamp.clone(),
                    last: last.timestamp.clone(),
                },
                locations,
            },
            format!("Day {day}: {} movements detected during the night ({window})", night.len()),
        )]
    }
}
