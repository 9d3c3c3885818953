//! Long-inactivity detection.
//!
//! Two rules, both high severity:
//! - a gap between adjacent events that starts inside the daytime window and
//!   lasts at least `long_inactivity_hours`;
//! - activity that stops before [`END_OF_DAY_CUTOFF_HOUR`] and stays silent
//!   until the day boundary for at least `long_inactivity_hours`.

use chrono::{NaiveDateTime, NaiveTime};
use tracing::debug;

use carewatch_core::{Day, DetectionConfig, SensorEvent};

use super::{sorted_by_time, Detector};
use crate::types::{AnomalyDetails, AnomalyKind, AnomalyRecord, InactivityEnd};

/// Last events at or after this hour never trigger the end-of-day rule.
pub const END_OF_DAY_CUTOFF_HOUR: u32 = 20;

#[derive(Debug, Clone, Copy, Default)]
pub struct LongInactivityDetector;

impl Detector for LongInactivityDetector {
    fn name(&self) -> &str {
        "long_inactivity"
    }

    fn kind(&self) -> AnomalyKind {
        AnomalyKind::LongInactivity
    }

    fn detect(
        &self,
        day: Day,
        events: &[SensorEvent],
        config: &DetectionConfig,
    ) -> Vec<AnomalyRecord> {
        let sorted = sorted_by_time(events);
        let threshold = config.long_inactivity_hours();
        let daytime = config.daytime_window();
        let mut records = Vec::new();

        for pair in sorted.windows(2) {
            let (prev, next) = (pair[0], pair[1]);
            if !daytime.contains(prev.hour()) {
                continue;
            }
            let gap = hours_between(prev.at(), next.at());
            if gap >= threshold {
                let hours = round1(gap);
                records.push(AnomalyRecord::new(
                    day,
                    AnomalyDetails::LongInactivity {
                        start_time: prev.timestamp.clone(),
                        end_time: InactivityEnd::At(next.timestamp.clone()),
                        duration_hours: hours,
                        last_location: prev.sensor,
                    },
                    format!(
                        "Day {day}: no activity for {:.1} hours ({} ~ {})",
                        hours,
                        prev.at().format("%H:%M"),
                        next.at().format("%H:%M"),
                    ),
                ));
            }
        }

        if let Some(last) = sorted.last() {
            if let Some(record) = end_of_day_silence(day, last, threshold) {
                records.push(record);
            }
        }

        if !records.is_empty() {
            debug!(day, count = records.len(), "inactivity gaps found");
        }
        records
    }
}

/// Silence from the last event of the day until the following midnight.
fn end_of_day_silence(day: Day, last: &SensorEvent, threshold: f64) -> Option<AnomalyRecord> {
    if last.hour() >= END_OF_DAY_CUTOFF_HOUR {
        return None;
    }
    let boundary = day_boundary(last.at())?;
    let remaining = hours_between(last.at(), boundary);
    if remaining < threshold {
        return None;
    }
    let hours = round1(remaining);
    Some(AnomalyRecord::new(
        day,
        AnomalyDetails::LongInactivity {
            start_time: last.timestamp.clone(),
            end_time: InactivityEnd::EndOfDay,
            duration_hours: hours,
            last_location: last.sensor,
        },
        format!(
            "Day {day}: no activity after {} ({:.1} hours until end of day)",
            last.at().format("%H:%M"),
            hours,
        ),
    ))
}

/// Midnight that closes the calendar date of `at`. The 23:59 minute counts
/// as part of the day.
fn day_boundary(at: NaiveDateTime) -> Option<NaiveDateTime> {
    at.date().succ_opt().map(|next| next.and_time(NaiveTime::MIN))
}

fn hours_between(from: NaiveDateTime, to: NaiveDateTime) -> f64 {
    (to - from).num_milliseconds() as f64 / 3_600_000.0
}

/// One decimal, ties to even.
fn round1(value: f64) -> f64 {
    (value * 10.0).round_ties_even() / 10.0
}
