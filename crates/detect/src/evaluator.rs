//! Day-level accuracy of detected anomalies against ground-truth labels.
//!
//! A day counts as a ground-truth anomaly when any of its events carries a
//! label containing `"anomaly"`; it counts as detected when at least one
//! record names it. Confusion counts are over days, not records.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::info;

use carewatch_core::{CareError, Day, Result, SensorEvent};

use crate::types::AnomalyRecord;

// ── Grading ───────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccuracyGrade {
    Excellent,
    Good,
    Acceptable,
    NeedsImprovement,
}

impl AccuracyGrade {
    /// Grade an accuracy percentage.
    pub fn from_accuracy(accuracy: f64) -> Self {
        if accuracy >= 90.0 {
            AccuracyGrade::Excellent
        } else if accuracy >= 85.0 {
            AccuracyGrade::Good
        } else if accuracy >= 70.0 {
            AccuracyGrade::Acceptable
        } else {
            AccuracyGrade::NeedsImprovement
        }
    }
}

impl fmt::Display for AccuracyGrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AccuracyGrade::Excellent => "excellent",
            AccuracyGrade::Good => "good",
            AccuracyGrade::Acceptable => "acceptable",
            AccuracyGrade::NeedsImprovement => "needs improvement",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FalseAlarmLevel {
    None,
    Low,
    High,
}

impl FalseAlarmLevel {
    pub fn from_count(false_positives: usize) -> Self {
        match false_positives {
            0 => FalseAlarmLevel::None,
            1 => FalseAlarmLevel::Low,
            _ => FalseAlarmLevel::High,
        }
    }
}

// ── Report ────────────────────────────────────────────────────

/// Confusion counts and derived percentages, rounded to two decimals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccuracyReport {
    pub total_days: u32,
    pub ground_truth_days: Vec<Day>,
    pub detected_days: Vec<Day>,
    pub ground_truth_count: usize,
    pub detected_count: usize,
    pub true_positives: usize,
    pub false_positives: usize,
    pub false_negatives: usize,
    pub true_negatives: usize,
    pub precision: f64,
    pub recall: f64,
    pub accuracy: f64,
    pub f1_score: f64,
    pub grade: AccuracyGrade,
    pub false_alarms: FalseAlarmLevel,
}

impl AccuracyReport {
    pub fn log_summary(&self) {
        info!(
            total_days = self.total_days,
            true_positives = self.true_positives,
            false_positives = self.false_positives,
            false_negatives = self.false_negatives,
            true_negatives = self.true_negatives,
            "confusion matrix"
        );
        info!(
            precision = self.precision,
            recall = self.recall,
            accuracy = self.accuracy,
            f1 = self.f1_score,
            grade = %self.grade,
            "accuracy"
        );
    }
}

/// Days whose events carry an anomaly label.
pub fn ground_truth_days(events: &[SensorEvent]) -> BTreeSet<Day> {
    events
        .iter()
        .filter(|e| e.is_labelled_anomaly())
        .map(|e| e.day)
        .collect()
}

/// Days named by at least one record.
pub fn detected_days(anomalies: &[AnomalyRecord]) -> BTreeSet<Day> {
    anomalies.iter().map(|a| a.day).collect()
}

/// Number of distinct days present in the stream.
pub fn observed_days(events: &[SensorEvent]) -> u32 {
    let days: BTreeSet<Day> = events.iter().map(|e| e.day).collect();
    days.len() as u32
}

/// Score `anomalies` against the labels in `events`, over a period of
/// `total_days` days.
///
/// Fails when the period is shorter than the number of distinct days that
/// appear in either the events or the records.
pub fn evaluate(
    anomalies: &[AnomalyRecord],
    events: &[SensorEvent],
    total_days: u32,
) -> Result<AccuracyReport> {
    let truth = ground_truth_days(events);
    let detected = detected_days(anomalies);

    let covered: BTreeSet<Day> = events.iter().map(|e| e.day).chain(detected.iter().copied()).collect();
    let observed = covered.len() as u32;
    if total_days < observed {
        return Err(CareError::Period {
            total_days,
            observed,
        });
    }

    let tp = truth.intersection(&detected).count();
    let fp = detected.difference(&truth).count();
    let fn_ = truth.difference(&detected).count();
    let tn = total_days as usize - (tp + fp + fn_);

    let precision = percentage(tp, tp + fp);
    let recall = percentage(tp, tp + fn_);
    let accuracy = round2(percentage(tp + tn, total_days as usize));
    let f1 = if precision + recall > 0.0 {
        2.0 * precision * recall / (precision + recall)
    } else {
        0.0
    };

    Ok(AccuracyReport {
        total_days,
        ground_truth_count: truth.len(),
        detected_count: detected.len(),
        ground_truth_days: truth.into_iter().collect(),
        detected_days: detected.into_iter().collect(),
        true_positives: tp,
        false_positives: fp,
        false_negatives: fn_,
        true_negatives: tn,
        precision: round2(precision),
        recall: round2(recall),
        accuracy,
        f1_score: round2(f1),
        grade: AccuracyGrade::from_accuracy(accuracy),
        false_alarms: FalseAlarmLevel::from_count(fp),
    })
}

fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

/// Two decimals, ties to even.
fn round2(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detectors::fixtures::on;
    use crate::types::AnomalyDetails;
    use carewatch_core::SensorLocation::Kitchen;

    fn labelled_week() -> Vec<SensorEvent> {
        (1..=7)
            .map(|day| {
                let label = match day {
                    6 => "anomaly_long_inactivity",
                    7 => "anomaly_midnight_wandering",
                    _ => "normal_active",
                };
                on(day, 9, 0, Kitchen).with_pattern_label(label)
            })
            .collect()
    }

    fn record(day: Day) -> AnomalyRecord {
        let event = on(day, 3, 0, Kitchen);
        AnomalyRecord::new(
            day,
            AnomalyDetails::IrregularSleep {
                wake_time: event.timestamp.clone(),
                wake_hour: 3,
                first_location: Kitchen,
            },
            "early wake",
        )
    }

    #[test]
    fn one_hit_one_miss_over_a_week() {
        let report = evaluate(&[record(6)], &labelled_week(), 7).unwrap();

        assert_eq!(report.ground_truth_days, vec![6, 7]);
        assert_eq!(report.detected_days, vec![6]);
        assert_eq!(report.ground_truth_count, 2);
        assert_eq!(report.detected_count, 1);
        assert_eq!(report.true_positives, 1);
        assert_eq!(report.false_positives, 0);
        assert_eq!(report.false_negatives, 1);
        assert_eq!(report.true_negatives, 5);
        assert_eq!(report.precision, 100.0);
        assert_eq!(report.recall, 50.0);
        assert_eq!(report.f1_score, 66.67);
        assert_eq!(report.accuracy, 85.71);
        assert_eq!(report.grade, AccuracyGrade::Good);
        assert_eq!(report.false_alarms, FalseAlarmLevel::None);
    }

    #[test]
    fn several_records_on_one_day_count_once() {
        let report = evaluate(&[record(6), record(6), record(7)], &labelled_week(), 7).unwrap();
        assert_eq!(report.true_positives, 2);
        assert_eq!(report.true_negatives, 5);
        assert_eq!(report.accuracy, 100.0);
        assert_eq!(report.grade, AccuracyGrade::Excellent);
    }

    #[test]
    fn false_positives_lower_precision() {
        let report = evaluate(&[record(2), record(3), record(6)], &labelled_week(), 7).unwrap();
        assert_eq!(report.false_positives, 2);
        assert_eq!(report.precision, 33.33);
        assert_eq!(report.false_alarms, FalseAlarmLevel::High);
    }

    #[test]
    fn nothing_detected_nothing_labelled() {
        let events: Vec<SensorEvent> = (1..=3).map(|d| on(d, 9, 0, Kitchen)).collect();
        let report = evaluate(&[], &events, 3).unwrap();
        assert_eq!(report.precision, 0.0);
        assert_eq!(report.recall, 0.0);
        assert_eq!(report.f1_score, 0.0);
        assert_eq!(report.true_negatives, 3);
        assert_eq!(report.accuracy, 100.0);
    }

    #[test]
    fn zero_total_days_is_not_a_division_error() {
        let report = evaluate(&[], &[], 0).unwrap();
        assert_eq!(report.accuracy, 0.0);
        assert_eq!(report.grade, AccuracyGrade::NeedsImprovement);
    }

    #[test]
    fn period_shorter_than_observed_days_is_rejected() {
        let all = [record(1), record(2), record(3)];
        let events: Vec<SensorEvent> = (1..=3)
            .map(|d| on(d, 9, 0, Kitchen).with_pattern_label("anomaly_long_inactivity"))
            .collect();

        match evaluate(&all, &events, 1) {
            Err(CareError::Period { total_days, observed }) => {
                assert_eq!(total_days, 1);
                assert_eq!(observed, 3);
            }
            other => panic!("expected Period error, got {other:?}"),
        }

        let report = evaluate(&all, &events, 3).unwrap();
        assert_eq!(report.accuracy, 100.0);
        assert_eq!(report.true_negatives, 0);
    }

    #[test]
    fn records_on_unobserved_days_count_towards_the_period() {
        let events = vec![on(1, 9, 0, Kitchen)];
        assert!(evaluate(&[record(2)], &events, 1).is_err());

        let report = evaluate(&[record(2)], &events, 2).unwrap();
        assert_eq!(report.false_positives, 1);
        assert_eq!(report.true_negatives, 1);
        assert_eq!(report.accuracy, 50.0);
    }

    #[test]
    fn longer_period_adds_true_negatives() {
        let report = evaluate(&[record(6), record(7)], &labelled_week(), 10).unwrap();
        assert_eq!(report.true_negatives, 8);
        assert_eq!(report.accuracy, 100.0);
    }

    #[test]
    fn halves_round_to_even() {
        assert_eq!(round2(0.125), 0.12);
        assert_eq!(round2(0.375), 0.38);
    }

    #[test]
    fn observed_days_counts_distinct_labels() {
        assert_eq!(observed_days(&labelled_week()), 7);
        assert_eq!(observed_days(&[]), 0);
    }

    #[test]
    fn grade_boundaries() {
        assert_eq!(AccuracyGrade::from_accuracy(90.0), AccuracyGrade::Excellent);
        assert_eq!(AccuracyGrade::from_accuracy(89.99), AccuracyGrade::Good);
        assert_eq!(AccuracyGrade::from_accuracy(70.0), AccuracyGrade::Acceptable);
        assert_eq!(AccuracyGrade::from_accuracy(69.99), AccuracyGrade::NeedsImprovement);
    }
}
