//! Shared message types and error type.

use std::fmt;

use carewatch_core::Day;
use carewatch_detect::{AnomalyKind, Severity};
use serde::{Deserialize, Serialize};

/// Errors that can occur while producing a message.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("Template rendering failed: {0}")]
    Template(String),
}

/// Audience a message is written for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    /// Warm, informal wording for relatives.
    Family,
    /// Terse clinical wording for care staff.
    Professional,
}

impl Tone {
    pub const ALL: [Tone; 2] = [Tone::Family, Tone::Professional];

    pub fn as_str(&self) -> &'static str {
        match self {
            Tone::Family => "family",
            Tone::Professional => "professional",
        }
    }
}

impl fmt::Display for Tone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A rendered message ready for delivery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderedMessage {
    pub anomaly_type: AnomalyKind,
    pub severity: Severity,
    pub day: Day,
    pub tone: Tone,
    /// Severity marker followed by the rendered template.
    pub message: String,
    pub recommendation: String,
}

