use std::env;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{CareError, Result};

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

/// Read a profiled env var: tries {PROFILE}_{KEY} first, falls back to {KEY}.
fn profiled_env_opt(profile: &str, key: &str) -> Option<String> {
    if !profile.is_empty() {
        let prefixed = format!("{}_{}", profile, key);
        if let Some(v) = env_opt(&prefixed) {
            return Some(v);
        }
    }
    env_opt(key)
}

/// Parse a profiled env var. Unlike a missing key, a present but unparseable
/// value is a configuration error.
fn profiled_env_parse<T>(profile: &str, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    match profiled_env_opt(profile, key) {
        Some(v) => v
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| CareError::configuration(key, format!("cannot parse '{}': {}", v, e))),
        None => Ok(None),
    }
}

// ── Env keys ──────────────────────────────────────────────────

const PROFILE_KEY: &str = "CAREWATCH_PROFILE";
const LONG_INACTIVITY_HOURS_KEY: &str = "CAREWATCH_LONG_INACTIVITY_HOURS";
const DAYTIME_WINDOW_KEY: &str = "CAREWATCH_DAYTIME_WINDOW";
const MIDNIGHT_WINDOW_KEY: &str = "CAREWATCH_MIDNIGHT_WINDOW";
const MIDNIGHT_EVENT_THRESHOLD_KEY: &str = "CAREWATCH_MIDNIGHT_EVENT_THRESHOLD";
const EARLY_WAKE_HOUR_KEY: &str = "CAREWATCH_EARLY_WAKE_HOUR";

// ── Defaults ──────────────────────────────────────────────────

const DEFAULT_LONG_INACTIVITY_HOURS: f64 = 6.0;
const DEFAULT_DAYTIME_WINDOW: HourWindow = HourWindow::new(6, 22);
const DEFAULT_MIDNIGHT_WINDOW: HourWindow = HourWindow::new(0, 5);
const DEFAULT_MIDNIGHT_EVENT_THRESHOLD: u32 = 5;
const DEFAULT_EARLY_WAKE_HOUR: u32 = 4;

/// Hours at or after noon never count as a wake-up.
const MAX_EARLY_WAKE_HOUR: u32 = 12;

// ── Hour window ───────────────────────────────────────────────

/// Half-open range of wall-clock hours, `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HourWindow {
    pub start: u32,
    pub end: u32,
}

impl HourWindow {
    pub const fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, hour: u32) -> bool {
        hour >= self.start && hour < self.end
    }

    fn validate(&self, field: &str) -> Result<()> {
        if self.end > 24 {
            return Err(CareError::configuration(
                field,
                format!("end hour {} is past 24", self.end),
            ));
        }
        if self.start >= self.end {
            return Err(CareError::configuration(
                field,
                format!("start hour {} must be before end hour {}", self.start, self.end),
            ));
        }
        Ok(())
    }
}

impl fmt::Display for HourWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:00-{:02}:00", self.start, self.end)
    }
}

/// Parses `"6-22"` or `"6..22"`.
impl FromStr for HourWindow {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let (start, end) = s
            .split_once("..")
            .or_else(|| s.split_once('-'))
            .ok_or_else(|| format!("expected START-END, got '{}'", s))?;
        let start = start
            .trim()
            .parse()
            .map_err(|_| format!("invalid start hour '{}'", start.trim()))?;
        let end = end
            .trim()
            .parse()
            .map_err(|_| format!("invalid end hour '{}'", end.trim()))?;
        Ok(HourWindow::new(start, end))
    }
}

// ── Detection config ──────────────────────────────────────────

/// Thresholds shared by all detectors for one run.
///
/// Every constructor (builder, YAML, environment) validates, so a value of
/// this type is always internally consistent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawDetectionConfig", into = "RawDetectionConfig")]
pub struct DetectionConfig {
    long_inactivity_hours: f64,
    daytime_window: HourWindow,
    midnight_window: HourWindow,
    midnight_event_threshold: u32,
    early_wake_hour: u32,
}

/// Unvalidated shape used for deserialization and the builder.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawDetectionConfig {
    #[serde(default = "default_long_inactivity_hours")]
    long_inactivity_hours: f64,
    #[serde(default = "default_daytime_window")]
    daytime_window: HourWindow,
    #[serde(default = "default_midnight_window")]
    midnight_window: HourWindow,
    #[serde(default = "default_midnight_event_threshold")]
    midnight_event_threshold: u32,
    #[serde(default = "default_early_wake_hour")]
    early_wake_hour: u32,
}

fn default_long_inactivity_hours() -> f64 { DEFAULT_LONG_INACTIVITY_HOURS }
fn default_daytime_window() -> HourWindow { DEFAULT_DAYTIME_WINDOW }
fn default_midnight_window() -> HourWindow { DEFAULT_MIDNIGHT_WINDOW }
fn default_midnight_event_threshold() -> u32 { DEFAULT_MIDNIGHT_EVENT_THRESHOLD }
fn default_early_wake_hour() -> u32 { DEFAULT_EARLY_WAKE_HOUR }

impl Default for RawDetectionConfig {
    fn default() -> Self {
        Self {
            long_inactivity_hours: default_long_inactivity_hours(),
            daytime_window: default_daytime_window(),
            midnight_window: default_midnight_window(),
            midnight_event_threshold: default_midnight_event_threshold(),
            early_wake_hour: default_early_wake_hour(),
        }
    }
}

impl TryFrom<RawDetectionConfig> for DetectionConfig {
    type Error = CareError;

    fn try_from(raw: RawDetectionConfig) -> Result<Self> {
        if !raw.long_inactivity_hours.is_finite() || raw.long_inactivity_hours <= 0.0 {
            return Err(CareError::configuration(
                "long_inactivity_hours",
                format!("must be a positive number of hours, got {}", raw.long_inactivity_hours),
            ));
        }
        raw.daytime_window.validate("daytime_window")?;
        raw.midnight_window.validate("midnight_window")?;
        if raw.midnight_event_threshold == 0 {
            return Err(CareError::configuration(
                "midnight_event_threshold",
                "must be at least 1",
            ));
        }
        if raw.early_wake_hour > MAX_EARLY_WAKE_HOUR {
            return Err(CareError::configuration(
                "early_wake_hour",
                format!("must be at most {}, got {}", MAX_EARLY_WAKE_HOUR, raw.early_wake_hour),
            ));
        }

        Ok(Self {
            long_inactivity_hours: raw.long_inactivity_hours,
            daytime_window: raw.daytime_window,
            midnight_window: raw.midnight_window,
            midnight_event_threshold: raw.midnight_event_threshold,
            early_wake_hour: raw.early_wake_hour,
        })
    }
}

impl From<DetectionConfig> for RawDetectionConfig {
    fn from(c: DetectionConfig) -> Self {
        Self {
            long_inactivity_hours: c.long_inactivity_hours,
            daytime_window: c.daytime_window,
            midnight_window: c.midnight_window,
            midnight_event_threshold: c.midnight_event_threshold,
            early_wake_hour: c.early_wake_hour,
        }
    }
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            long_inactivity_hours: DEFAULT_LONG_INACTIVITY_HOURS,
            daytime_window: DEFAULT_DAYTIME_WINDOW,
            midnight_window: DEFAULT_MIDNIGHT_WINDOW,
            midnight_event_threshold: DEFAULT_MIDNIGHT_EVENT_THRESHOLD,
            early_wake_hour: DEFAULT_EARLY_WAKE_HOUR,
        }
    }
}

impl DetectionConfig {
    pub fn builder() -> DetectionConfigBuilder {
        DetectionConfigBuilder::default()
    }

    /// Parse and validate a YAML document. Missing keys take their defaults.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let raw: RawDetectionConfig = serde_yaml::from_str(yaml)?;
        Self::try_from(raw)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let yaml = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml_str(&yaml)
    }

    /// Build config from environment variables (call `load_dotenv()` first).
    /// Profile is read from `CAREWATCH_PROFILE`. When set (e.g. `PROD`),
    /// every key is first looked up as `{PROFILE}_{KEY}`, falling back to `{KEY}`.
    pub fn from_env() -> Result<Self> {
        let profile = env_or(PROFILE_KEY, "").to_uppercase();
        Self::for_profile(&profile)
    }

    /// Build config for a specific named profile (empty string = default).
    pub fn for_profile(profile: &str) -> Result<Self> {
        let p = profile.to_uppercase();
        let p = p.as_str();
        let mut raw = RawDetectionConfig::default();

        if let Some(v) = profiled_env_parse(p, LONG_INACTIVITY_HOURS_KEY)? {
            raw.long_inactivity_hours = v;
        }
        if let Some(v) = profiled_env_parse(p, DAYTIME_WINDOW_KEY)? {
            raw.daytime_window = v;
        }
        if let Some(v) = profiled_env_parse(p, MIDNIGHT_WINDOW_KEY)? {
            raw.midnight_window = v;
        }
        if let Some(v) = profiled_env_parse(p, MIDNIGHT_EVENT_THRESHOLD_KEY)? {
            raw.midnight_event_threshold = v;
        }
        if let Some(v) = profiled_env_parse(p, EARLY_WAKE_HOUR_KEY)? {
            raw.early_wake_hour = v;
        }

        Self::try_from(raw)
    }

    /// Gap length, in hours, that counts as long inactivity.
    pub fn long_inactivity_hours(&self) -> f64 {
        self.long_inactivity_hours
    }

    /// Hours during which an inactivity gap is abnormal.
    pub fn daytime_window(&self) -> HourWindow {
        self.daytime_window
    }

    /// Hours watched for nocturnal activity.
    pub fn midnight_window(&self) -> HourWindow {
        self.midnight_window
    }

    pub fn midnight_event_threshold(&self) -> u32 {
        self.midnight_event_threshold
    }

    /// A first morning event before this hour is an early wake-up.
    pub fn early_wake_hour(&self) -> u32 {
        self.early_wake_hour
    }

    /// Print a summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Detection config:");
        tracing::info!("  long inactivity: >= {}h during {}", self.long_inactivity_hours, self.daytime_window);
        tracing::info!("  midnight wandering: >= {} events during {}", self.midnight_event_threshold, self.midnight_window);
        tracing::info!("  early wake: before {:02}:00", self.early_wake_hour);
    }
}

// ── Builder ───────────────────────────────────────────────────

/// Builder for [`DetectionConfig`]; validation runs in [`build`](Self::build).
#[derive(Debug, Clone, Default)]
pub struct DetectionConfigBuilder {
    raw: RawDetectionConfig,
}

impl DetectionConfigBuilder {
    pub fn long_inactivity_hours(mut self, hours: f64) -> Self {
        self.raw.long_inactivity_hours = hours;
        self
    }

    pub fn daytime_window(mut self, start: u32, end: u32) -> Self {
        self.raw.daytime_window = HourWindow::new(start, end);
        self
    }

    pub fn midnight_window(mut self, start: u32, end: u32) -> Self {
        self.raw.midnight_window = HourWindow::new(start, end);
        self
    }

    pub fn midnight_event_threshold(mut self, count: u32) -> Self {
        self.raw.midnight_event_threshold = count;
        self
    }

    pub fn early_wake_hour(mut self, hour: u32) -> Self {
        self.raw.early_wake_hour = hour;
        self
    }

    pub fn build(self) -> Result<DetectionConfig> {
        DetectionConfig::try_from(self.raw)
    }
}
