//! Anomaly records produced by the detectors.

use std::collections::BTreeMap;
use std::fmt;

use carewatch_core::{Day, EventTime, SensorLocation};
use serde::{Deserialize, Serialize};

/// Wire value of [`InactivityEnd::EndOfDay`].
const END_OF_DAY_SENTINEL: &str = "end_of_day";

/// Which detector produced a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyKind {
    LongInactivity,
    MidnightWandering,
    IrregularSleep,
}

impl AnomalyKind {
    pub const ALL: [AnomalyKind; 3] = [
        AnomalyKind::LongInactivity,
        AnomalyKind::MidnightWandering,
        AnomalyKind::IrregularSleep,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AnomalyKind::LongInactivity => "long_inactivity",
            AnomalyKind::MidnightWandering => "midnight_wandering",
            AnomalyKind::IrregularSleep => "irregular_sleep",
        }
    }

    /// Severity every record of this kind carries.
    pub fn severity(&self) -> Severity {
        match self {
            AnomalyKind::LongInactivity => Severity::High,
            AnomalyKind::MidnightWandering => Severity::Medium,
            AnomalyKind::IrregularSleep => Severity::Low,
        }
    }

    /// What the pattern may indicate.
    pub fn risk(&self) -> &'static str {
        match self {
            AnomalyKind::LongInactivity => "possible fall, loss of consciousness, or emergency",
            AnomalyKind::MidnightWandering => {
                "early signs of dementia, sleep disorder, anxiety or depression"
            }
            AnomalyKind::IrregularSleep => "sleep disorder, insomnia, or stress",
        }
    }
}

impl fmt::Display for AnomalyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse priority of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    pub const ALL: [Severity; 3] = [Severity::Low, Severity::Medium, Severity::High];

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where an inactivity stretch stops.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum InactivityEnd {
    /// The next event of the same day.
    At(EventTime),
    /// No further event before the day boundary.
    EndOfDay,
}

impl TryFrom<String> for InactivityEnd {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        if s == END_OF_DAY_SENTINEL {
            Ok(InactivityEnd::EndOfDay)
        } else {
            EventTime::parse(&s).map(InactivityEnd::At)
        }
    }
}

impl From<InactivityEnd> for String {
    fn from(end: InactivityEnd) -> Self {
        match end {
            InactivityEnd::At(t) => t.into(),
            InactivityEnd::EndOfDay => END_OF_DAY_SENTINEL.to_string(),
        }
    }
}

/// First and last qualifying timestamps, as written by the producer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSpan {
    pub first: EventTime,
    pub last: EventTime,
}

impl fmt::Display for TimeSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ~ {}", self.first.raw(), self.last.raw())
    }
}

/// Kind-specific payload of an [`AnomalyRecord`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AnomalyDetails {
    LongInactivity {
        start_time: EventTime,
        end_time: InactivityEnd,
        /// Gap length rounded to one decimal.
        duration_hours: f64,
        last_location: SensorLocation,
    },
    MidnightWandering {
        event_count: usize,
        time_range: TimeSpan,
        locations: BTreeMap<SensorLocation, usize>,
    },
    IrregularSleep {
        wake_time: EventTime,
        wake_hour: u32,
        first_location: SensorLocation,
    },
}

impl AnomalyDetails {
    pub fn kind(&self) -> AnomalyKind {
        match self {
            AnomalyDetails::LongInactivity { .. } => AnomalyKind::LongInactivity,
            AnomalyDetails::MidnightWandering { .. } => AnomalyKind::MidnightWandering,
            AnomalyDetails::IrregularSleep { .. } => AnomalyKind::IrregularSleep,
        }
    }
}

/// One detected anomaly for a closed day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyRecord {
    pub day: Day,
    pub severity: Severity,
    #[serde(flatten)]
    pub details: AnomalyDetails,
    pub description: String,
    pub risk: String,
}

impl AnomalyRecord {
    /// Build a record whose severity and risk follow from the payload kind.
    pub fn new(day: Day, details: AnomalyDetails, description: impl Into<String>) -> Self {
        let kind = details.kind();
        Self {
            day,
            severity: kind.severity(),
            details,
            description: description.into(),
            risk: kind.risk().to_string(),
        }
    }

    pub fn kind(&self) -> AnomalyKind {
        self.details.kind()
    }
}
