//! Per-day anomaly detectors.
//!
//! Each detector looks at the events of a single closed day and emits zero
//! or more [`AnomalyRecord`]s. Detectors are stateless: the same day and
//! config always produce the same records, so days can be processed in any
//! order or in parallel.
//!
//! - [`inactivity`]: long daytime gaps and early end of activity
//! - [`wandering`]: repeated movement during the night window
//! - [`sleep`]: first morning event earlier than the wake threshold

pub mod inactivity;
pub mod sleep;
pub mod wandering;

use carewatch_core::{Day, DetectionConfig, SensorEvent};

use crate::types::{AnomalyKind, AnomalyRecord};

pub use inactivity::LongInactivityDetector;
pub use sleep::IrregularSleepDetector;
pub use wandering::MidnightWanderingDetector;

/// A classifier over one day's events.
pub trait Detector: Send + Sync {
    /// Human-readable name for logging.
    fn name(&self) -> &str;

    /// Kind of every record this detector emits.
    fn kind(&self) -> AnomalyKind;

    /// Inspect one day. `events` may arrive in any order.
    fn detect(&self, day: Day, events: &[SensorEvent], config: &DetectionConfig)
        -> Vec<AnomalyRecord>;
}

/// The built-in detectors, in reporting order.
pub fn default_detectors() -> Vec<Box<dyn Detector>> {
    vec![
        Box::new(LongInactivityDetector),
        Box::new(MidnightWanderingDetector),
        Box::new(IrregularSleepDetector),
    ]
}

/// Events ordered by timestamp. Ties keep their input order.
pub(crate) fn sorted_by_time(events: &[SensorEvent]) -> Vec<&SensorEvent> {
    let mut sorted: Vec<&SensorEvent> = events.iter().collect();
    sorted.sort_by_key(|e| e.at());
    sorted
}


#[cfg(test)]
mod tests {
    use super::fixtures::on;
    use super::*;
    use carewatch_core::SensorLocation;

    #[test]
    fn default_detectors_in_reporting_order() {
        let kinds: Vec<AnomalyKind> = default_detectors().iter().map(|d| d.kind()).collect();
        assert_eq!(
            kinds,
            vec![
                AnomalyKind::LongInactivity,
                AnomalyKind::MidnightWandering,
                AnomalyKind::IrregularSleep,
            ]
        );
    }

    #[test]
    fn sort_is_stable_on_equal_timestamps() {
        let events = vec![
            on(1, 9, 0, SensorLocation::Kitchen),
            on(1, 8, 0, SensorLocation::Bedroom),
            on(1, 9, 0, SensorLocation::Bathroom),
        ];
        let sorted = sorted_by_time(&events);
        let locs: Vec<SensorLocation> = sorted.iter().map(|e| e.sensor).collect();
        assert_eq!(
            locs,
            vec![SensorLocation::Bedroom, SensorLocation::Kitchen, SensorLocation::Bathroom]
        );
    }
}
