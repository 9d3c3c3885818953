//! Event file loading.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use carewatch_core::{RawSensorEvent, SensorEvent};

/// Header written by the event producer. Unknown keys are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FixtureMetadata {
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub duration_days: Option<u32>,
    #[serde(default)]
    pub total_events: Option<usize>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum EventFile {
    Wrapped {
        #[serde(default)]
        metadata: FixtureMetadata,
        events: Vec<RawSensorEvent>,
    },
    Bare(Vec<RawSensorEvent>),
}

#[derive(Debug, Clone, Default)]
pub struct Fixture {
    pub metadata: FixtureMetadata,
    pub events: Vec<RawSensorEvent>,
}

impl Fixture {
    pub fn from_json(json: &str) -> Result<Self> {
        let file: EventFile =
            serde_json::from_str(json).context("event file is neither an object with `events` nor an array")?;
        Ok(match file {
            EventFile::Wrapped { metadata, events } => Fixture { metadata, events },
            EventFile::Bare(events) => Fixture {
                metadata: FixtureMetadata::default(),
                events,
            },
        })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)
            .with_context(|| format!("failed to read event file {}", path.display()))?;
        Self::from_json(&json).with_context(|| format!("failed to parse {}", path.display()))
    }

    /// Validate every event, failing on the first bad one.
    pub fn parse_events(&self) -> Result<Vec<SensorEvent>> {
        let events = self
            .events
            .iter()
            .enumerate()
            .map(|(index, raw)| raw.parse(index))
            .collect::<carewatch_core::Result<Vec<_>>>()?;
        Ok(events)
    }

    /// Evaluation period: explicit flag, then metadata, then observed days.
    pub fn total_days(&self, flag: Option<u32>, observed: u32) -> u32 {
        flag.or(self.metadata.duration_days).unwrap_or(observed)
    }
}
