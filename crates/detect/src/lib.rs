//! Per-day anomaly detection over sensor event streams.
//!
//! Events are partitioned by day label ([`partition`]), each closed day is
//! run through the [`detectors`], and the [`engine`] merges the records in
//! a fixed order. [`evaluator`] scores the result against labelled data.

pub mod detectors;
pub mod engine;
pub mod evaluator;
pub mod partition;
pub mod types;

pub use detectors::{
    default_detectors, Detector, IrregularSleepDetector, LongInactivityDetector,
    MidnightWanderingDetector,
};
pub use engine::{DetectionEngine, DetectionRun, RunMetrics};
pub use evaluator::{evaluate, observed_days, AccuracyGrade, AccuracyReport, FalseAlarmLevel};
pub use partition::{partition, partition_raw, DayPartitions};
pub use types::{AnomalyDetails, AnomalyKind, AnomalyRecord, InactivityEnd, Severity, TimeSpan};
