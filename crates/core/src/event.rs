//! Sensor events as delivered by the upstream producer.
//!
//! [`RawSensorEvent`] is the wire shape (every field optional, strings as
//! received). [`SensorEvent`] is the validated record the detectors read.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::error::{CareError, Result};

/// Logical day label. Assigned by the producer, never derived from the clock.
pub type Day = u32;

/// Substring that marks a ground-truth label as anomalous.
const ANOMALY_LABEL_MARKER: &str = "anomaly";

/// Accepted naive timestamp layouts, tried in order.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
];

/// Layout used when a timestamp is built in code rather than parsed.
const CANONICAL_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

// ── Sensor location ──────────────────────────────────────────

/// Monitored locations in the household.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorLocation {
    LivingRoom,
    Bedroom,
    Kitchen,
    Bathroom,
    Entrance,
}

impl SensorLocation {
    pub const ALL: [SensorLocation; 5] = [
        SensorLocation::LivingRoom,
        SensorLocation::Bedroom,
        SensorLocation::Kitchen,
        SensorLocation::Bathroom,
        SensorLocation::Entrance,
    ];

    /// Wire identifier, e.g. `"living_room"`.
    pub fn as_str(&self) -> &'static str {
        match self {
            SensorLocation::LivingRoom => "living_room",
            SensorLocation::Bedroom => "bedroom",
            SensorLocation::Kitchen => "kitchen",
            SensorLocation::Bathroom => "bathroom",
            SensorLocation::Entrance => "entrance",
        }
    }

    /// Human-readable room name for messages.
    pub fn display_name(&self) -> &'static str {
        match self {
            SensorLocation::LivingRoom => "living room",
            SensorLocation::Bedroom => "bedroom",
            SensorLocation::Kitchen => "kitchen",
            SensorLocation::Bathroom => "bathroom",
            SensorLocation::Entrance => "entrance",
        }
    }
}

impl fmt::Display for SensorLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SensorLocation {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        SensorLocation::ALL
            .iter()
            .copied()
            .find(|loc| loc.as_str() == s)
            .ok_or_else(|| format!("unknown sensor location: '{}'", s))
    }
}

// ── Event type ───────────────────────────────────────────────

/// What the sensor reported. Unrecognized kinds are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EventType {
    Motion,
    DoorOpen,
    DoorClose,
    Other(String),
}

impl EventType {
    pub fn as_str(&self) -> &str {
        match self {
            EventType::Motion => "motion",
            EventType::DoorOpen => "door_open",
            EventType::DoorClose => "door_close",
            EventType::Other(s) => s.as_str(),
        }
    }
}

impl From<String> for EventType {
    fn from(s: String) -> Self {
        match s.as_str() {
            "motion" => EventType::Motion,
            "door_open" => EventType::DoorOpen,
            "door_close" => EventType::DoorClose,
            _ => EventType::Other(s),
        }
    }
}

impl From<EventType> for String {
    fn from(t: EventType) -> Self {
        t.as_str().to_string()
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Event time ───────────────────────────────────────────────

/// A wall-clock timestamp together with the text it came from.
///
/// Hours are read from the local wall clock of the source: an offset in the
/// input is kept as written, not converted to UTC.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EventTime {
    at: NaiveDateTime,
    raw: String,
}

impl EventTime {
    /// Parse an ISO-8601 style timestamp, keeping the source text.
    pub fn parse(raw: &str) -> std::result::Result<Self, String> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err("timestamp is empty".to_string());
        }

        let naive = NAIVE_FORMATS
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
            .or_else(|| {
                DateTime::parse_from_rfc3339(trimmed)
                    .ok()
                    .map(|dt| dt.naive_local())
            });

        match naive {
            Some(at) => Ok(Self {
                at,
                raw: raw.to_string(),
            }),
            None => Err(format!("malformed timestamp '{}'", raw)),
        }
    }

    pub fn at(&self) -> NaiveDateTime {
        self.at
    }

    /// The timestamp exactly as the producer wrote it.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn hour(&self) -> u32 {
        self.at.hour()
    }
}

impl From<NaiveDateTime> for EventTime {
    fn from(at: NaiveDateTime) -> Self {
        Self {
            at,
            raw: at.format(CANONICAL_FORMAT).to_string(),
        }
    }
}

impl TryFrom<String> for EventTime {
    type Error = String;

    fn try_from(raw: String) -> std::result::Result<Self, Self::Error> {
        EventTime::parse(&raw)
    }
}

impl From<EventTime> for String {
    fn from(t: EventTime) -> Self {
        t.raw
    }
}

impl fmt::Display for EventTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

// ── Sensor event ─────────────────────────────────────────────

/// A single validated motion/door reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorEvent {
    pub timestamp: EventTime,
    #[serde(rename = "sensor_id")]
    pub sensor: SensorLocation,
    pub event_type: EventType,
    pub day: Day,
    /// Ground-truth tag for accuracy scoring. Detectors never read it.
    #[serde(rename = "pattern", default, skip_serializing_if = "Option::is_none")]
    pub pattern_label: Option<String>,
}

impl SensorEvent {
    pub fn new(
        at: NaiveDateTime,
        sensor: SensorLocation,
        event_type: EventType,
        day: Day,
    ) -> Self {
        Self {
            timestamp: EventTime::from(at),
            sensor,
            event_type,
            day,
            pattern_label: None,
        }
    }

    pub fn with_pattern_label(mut self, label: impl Into<String>) -> Self {
        self.pattern_label = Some(label.into());
        self
    }

    pub fn at(&self) -> NaiveDateTime {
        self.timestamp.at()
    }

    pub fn hour(&self) -> u32 {
        self.timestamp.hour()
    }

    /// True when the ground-truth label marks this event's day as anomalous.
    pub fn is_labelled_anomaly(&self) -> bool {
        self.pattern_label
            .as_deref()
            .is_some_and(|label| label.contains(ANOMALY_LABEL_MARKER))
    }
}

// ── Raw wire event ───────────────────────────────────────────

/// Event as it arrives on the wire, before validation.
///
/// Unknown keys (`sensor_name`, `battery`, ...) are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawSensorEvent {
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub sensor_id: Option<String>,
    #[serde(default)]
    pub event_type: Option<String>,
    #[serde(default)]
    pub day: Option<Day>,
    #[serde(default, alias = "pattern_label")]
    pub pattern: Option<String>,
}

impl RawSensorEvent {
    /// Validate into a [`SensorEvent`]. `index` is the event's position in
    /// the source stream and is reported on failure.
    ///
    /// A missing `event_type` defaults to motion; every other field is required.
    pub fn parse(&self, index: usize) -> Result<SensorEvent> {
        let raw_ts = self
            .timestamp
            .as_deref()
            .ok_or_else(|| CareError::parse(index, "missing timestamp"))?;
        let timestamp = EventTime::parse(raw_ts).map_err(|e| CareError::parse(index, e))?;

        let sensor = self
            .sensor_id
            .as_deref()
            .ok_or_else(|| CareError::parse(index, "missing sensor_id"))?
            .parse::<SensorLocation>()
            .map_err(|e| CareError::parse(index, e))?;

        let day = self
            .day
            .ok_or_else(|| CareError::parse(index, "missing day label"))?;

        let event_type = self
            .event_type
            .clone()
            .map(EventType::from)
            .unwrap_or(EventType::Motion);

        Ok(SensorEvent {
            timestamp,
            sensor,
            event_type,
            day,
            pattern_label: self.pattern.clone(),
        })
    }
}
