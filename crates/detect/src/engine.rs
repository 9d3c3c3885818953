//! Runs every detector over every day and merges the results.
//!
//! Output order is fixed: detectors in registration order, and within one
//! detector, days ascending. Parallel and sequential runs produce identical
//! output.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info};

use carewatch_core::{DetectionConfig, RawSensorEvent, Result, SensorEvent};

use crate::detectors::{default_detectors, Detector};
use crate::partition::{partition, partition_raw, DayPartitions};
use crate::types::AnomalyRecord;

/// Counters collected during one engine run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunMetrics {
    /// Distinct days processed.
    pub days: usize,
    /// Events across all days.
    pub events: usize,
    /// Records emitted, keyed by detector name.
    pub anomalies_by_detector: BTreeMap<String, usize>,
    /// Wall time per detector in microseconds.
    pub detector_duration_us: BTreeMap<String, u64>,
    pub total_duration_ms: u64,
}

impl RunMetrics {
    fn record_detector(&mut self, name: &str, anomalies: usize, elapsed: Duration) {
        self.anomalies_by_detector.insert(name.to_string(), anomalies);
        self.detector_duration_us
            .insert(name.to_string(), elapsed.as_micros() as u64);
    }

    pub fn total_anomalies(&self) -> usize {
        self.anomalies_by_detector.values().sum()
    }
}

/// Anomalies plus the metrics of the run that produced them.
#[derive(Debug, Clone)]
pub struct DetectionRun {
    pub anomalies: Vec<AnomalyRecord>,
    pub metrics: RunMetrics,
}

pub struct DetectionEngine {
    config: DetectionConfig,
    detectors: Vec<Box<dyn Detector>>,
    parallel: bool,
}

impl DetectionEngine {
    /// Engine with the built-in detectors, processing days in parallel.
    pub fn new(config: DetectionConfig) -> Self {
        Self::with_detectors(config, default_detectors())
    }

    pub fn with_detectors(config: DetectionConfig, detectors: Vec<Box<dyn Detector>>) -> Self {
        Self {
            config,
            detectors,
            parallel: true,
        }
    }

    /// Toggle per-day parallelism.
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn detector_names(&self) -> Vec<&str> {
        self.detectors.iter().map(|d| d.name()).collect()
    }

    pub fn run(&self, events: &[SensorEvent]) -> Vec<AnomalyRecord> {
        self.run_partitions(&partition(events)).anomalies
    }

    /// Validate, partition, and detect. Fails on the first malformed event.
    pub fn run_raw(&self, raw: &[RawSensorEvent]) -> Result<DetectionRun> {
        let partitions = partition_raw(raw)?;
        Ok(self.run_partitions(&partitions))
    }

    pub fn run_partitions(&self, partitions: &DayPartitions) -> DetectionRun {
        let start = Instant::now();
        let mut metrics = RunMetrics {
            days: partitions.len(),
            events: partitions.event_count(),
            ..RunMetrics::default()
        };

        let days: Vec<_> = partitions
            .iter()
            .filter(|(_, events)| !events.is_empty())
            .collect();

        let total = self.detectors.len();
        let mut anomalies = Vec::new();
        for (step, detector) in self.detectors.iter().enumerate() {
            let detector_start = Instant::now();
            let found = self.run_detector(detector.as_ref(), &days);
            let elapsed = detector_start.elapsed();

            info!(
                step = step + 1,
                of = total,
                detector = detector.name(),
                anomalies = found.len(),
                "detector finished"
            );
            metrics.record_detector(detector.name(), found.len(), elapsed);
            anomalies.extend(found);
        }

        metrics.total_duration_ms = start.elapsed().as_millis() as u64;
        info!(
            days = metrics.days,
            events = metrics.events,
            anomalies = anomalies.len(),
            elapsed_ms = metrics.total_duration_ms,
            "detection complete"
        );

        DetectionRun { anomalies, metrics }
    }

    fn run_detector(
        &self,
        detector: &dyn Detector,
        days: &[(u32, &[SensorEvent])],
    ) -> Vec<AnomalyRecord> {
        let config = &self.config;
        let per_day: Vec<Vec<AnomalyRecord>> = if self.parallel {
            days.par_iter()
                .map(|(day, events)| detector.detect(*day, events, config))
                .collect()
        } else {
            days.iter()
                .map(|(day, events)| detector.detect(*day, events, config))
                .collect()
        };
        debug!(detector = detector.name(), days = per_day.len(), "days scanned");
        per_day.into_iter().flatten().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detectors::fixtures::{at, on};
    use crate::types::AnomalyKind;
    use carewatch_core::SensorLocation::{Bathroom, Bedroom, Kitchen, LivingRoom};

    fn normal_day(day: u32) -> Vec<SensorEvent> {
        vec![
            on(day, 7, 0, Bedroom),
            on(day, 8, 30, Kitchen),
            on(day, 11, 0, LivingRoom),
            on(day, 13, 0, Kitchen),
            on(day, 16, 0, LivingRoom),
            on(day, 19, 0, Kitchen),
            on(day, 21, 30, Bathroom),
        ]
    }

    fn week() -> Vec<SensorEvent> {
        let mut events = Vec::new();
        for day in 1..=4 {
            events.extend(normal_day(day));
        }
        // Day 5: stops at 11:00, plus a 3am wake.
        events.push(on(5, 3, 0, Bathroom));
        events.push(on(5, 8, 0, Kitchen));
        events.push(on(5, 11, 0, Kitchen));
        // Day 6: six movements after midnight on the next date. The 02:55
        // tail also leaves the rest of that date silent.
        events.extend(normal_day(6));
        for minute in [5, 15, 25, 35, 45, 55] {
            events.push(at(6, 6, 2, minute, Kitchen));
        }
        events
    }

    #[test]
    fn records_ordered_by_detector_then_day() {
        let anomalies = DetectionEngine::new(DetectionConfig::default()).run(&week());
        let summary: Vec<(AnomalyKind, u32)> =
            anomalies.iter().map(|a| (a.kind(), a.day)).collect();

        assert_eq!(
            summary,
            vec![
                (AnomalyKind::LongInactivity, 5),
                (AnomalyKind::LongInactivity, 6),
                (AnomalyKind::MidnightWandering, 6),
                (AnomalyKind::IrregularSleep, 5),
            ]
        );
    }

    #[test]
    fn parallel_matches_sequential() {
        let events = week();
        let config = DetectionConfig::default();
        let parallel = DetectionEngine::new(config.clone()).run(&events);
        let sequential = DetectionEngine::new(config).parallel(false).run(&events);
        assert_eq!(parallel, sequential);
    }

    #[test]
    fn run_is_idempotent() {
        let engine = DetectionEngine::new(DetectionConfig::default());
        let events = week();
        assert_eq!(engine.run(&events), engine.run(&events));
    }

    #[test]
    fn empty_stream_yields_nothing() {
        let engine = DetectionEngine::new(DetectionConfig::default());
        let run = engine.run_partitions(&DayPartitions::new());
        assert!(run.anomalies.is_empty());
        assert_eq!(run.metrics.days, 0);
        assert_eq!(run.metrics.total_anomalies(), 0);
    }

    #[test]
    fn metrics_count_per_detector() {
        let engine = DetectionEngine::new(DetectionConfig::default());
        let run = engine.run_partitions(&partition(&week()));

        assert_eq!(run.metrics.days, 6);
        assert_eq!(run.metrics.anomalies_by_detector["long_inactivity"], 2);
        assert_eq!(run.metrics.anomalies_by_detector["midnight_wandering"], 1);
        assert_eq!(run.metrics.anomalies_by_detector["irregular_sleep"], 1);
        assert_eq!(run.metrics.total_anomalies(), run.anomalies.len());
    }

    #[test]
    fn custom_detector_list() {
        let engine = DetectionEngine::with_detectors(
            DetectionConfig::default(),
            vec![Box::new(crate::detectors::IrregularSleepDetector)],
        );
        assert_eq!(engine.detector_names(), vec!["irregular_sleep"]);
        let anomalies = engine.run(&week());
        assert!(anomalies.iter().all(|a| a.kind() == AnomalyKind::IrregularSleep));
    }
}
