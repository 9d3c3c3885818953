//! Irregular sleep: the first morning event comes before the early-wake hour.

use carewatch_core::{Day, DetectionConfig, SensorEvent};

use super::{sorted_by_time, Detector};
use crate::types::{AnomalyDetails, AnomalyKind, AnomalyRecord};

/// Events at or after this hour are not considered morning.
pub const MORNING_CUTOFF_HOUR: u32 = 12;

#[derive(Debug, Clone, Copy, Default)]
pub struct IrregularSleepDetector;

impl Detector for IrregularSleepDetector {
    fn name(&self) -> &str {
        "irregular_sleep"
    }

    fn kind(&self) -> AnomalyKind {
        AnomalyKind::IrregularSleep
    }

    fn detect(
        &self,
        day: Day,
        events: &[SensorEvent],
        config: &DetectionConfig,
    ) -> Vec<AnomalyRecord> {
        let wake = sorted_by_time(events)
            .into_iter()
            .find(|e| e.hour() < MORNING_CUTOFF_HOUR);

        match wake {
            Some(first) if first.hour() < config.early_wake_hour() => vec![AnomalyRecord::new(
                day,
                AnomalyDetails::IrregularSleep {
                    wake_time: first.timestamp.clone(),
                    wake_hour: first.hour(),
                    first_location: first.sensor,
                },
                format!(
                    "Day {day}: first activity at {}, before {:02}:00",
                    first.at().format("%H:%M"),
                    config.early_wake_hour(),
                ),
            )],
            _ => Vec::new(),
        }
    }
}
