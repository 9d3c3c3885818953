//! Minijinja rendering of anomaly records into caregiver messages.
//!
//! The message body comes from a template selected by (anomaly kind, tone)
//! and is prefixed with a severity marker. The recommended action is a flat
//! lookup keyed by (anomaly kind, severity).
//!
//! Templates may be overridden per (kind, tone), so a fresh
//! [`minijinja::Environment`] is created per render call.

use std::collections::HashMap;

use carewatch_core::Day;
use carewatch_detect::{AnomalyDetails, AnomalyKind, AnomalyRecord, Severity};
use minijinja::UndefinedBehavior;
use serde::Serialize;
use tracing::debug;

use crate::traits::{NotifyError, RenderedMessage, Tone};

// ── Tables ────────────────────────────────────────────────────

fn default_template(kind: AnomalyKind, tone: Tone) -> &'static str {
    match (kind, tone) {
        (AnomalyKind::LongInactivity, Tone::Family) => {
            "No activity has been detected since {{ time }}. It would be a good idea to call and check in."
        }
        (AnomalyKind::LongInactivity, Tone::Professional) => {
            "No activity for over {{ duration }} hours since {{ time }} (last seen: {{ location }}). Check immediately."
        }
        (AnomalyKind::MidnightWandering, Tone::Family) => {
            "Moved around {{ count }} times during the night ({{ time_range }}). Sleep seems to have been restless."
        }
        (AnomalyKind::MidnightWandering, Tone::Professional) => {
            "Night wandering detected {{ count }} times. Possible early dementia or sleep disorder."
        }
        (AnomalyKind::IrregularSleep, Tone::Family) => {
            "Woke up early today at {{ time }}. Sleep may not have been restful."
        }
        (AnomalyKind::IrregularSleep, Tone::Professional) => {
            "Irregular sleep pattern detected (first activity {{ time }}). Possible insomnia or stress."
        }
    }
}

/// Prefix marking how urgent a message is.
pub fn severity_marker(severity: Severity) -> &'static str {
    match severity {
        Severity::High => "[URGENT]",
        Severity::Medium => "[CAUTION]",
        Severity::Low => "[INFO]",
    }
}

/// Suggested next step for a caregiver.
pub fn recommendation(kind: AnomalyKind, severity: Severity) -> &'static str {
    match (kind, severity) {
        (AnomalyKind::LongInactivity, Severity::High) => {
            "Call or visit right away to confirm safety. If there is no answer, contact emergency services."
        }
        (AnomalyKind::LongInactivity, Severity::Medium) => {
            "Call to check in and ask whether anything is wrong."
        }
        (AnomalyKind::LongInactivity, Severity::Low) => "Check in at a convenient time.",
        (AnomalyKind::MidnightWandering, Severity::High) => {
            "Consider consulting a dementia specialist."
        }
        (AnomalyKind::MidnightWandering, Severity::Medium) => {
            "Review the sleeping environment and encourage more daytime activity."
        }
        (AnomalyKind::MidnightWandering, Severity::Low) => "Help make sure there is enough rest.",
        (AnomalyKind::IrregularSleep, Severity::High) => {
            "A clinic visit for insomnia treatment is recommended."
        }
        (AnomalyKind::IrregularSleep, Severity::Medium) => {
            "Review sleep hours and the sleeping environment."
        }
        (AnomalyKind::IrregularSleep, Severity::Low) => {
            "Encourage fewer naps and a regular sleep schedule."
        }
    }
}

// ── Context ───────────────────────────────────────────────────

/// Values available to message templates.
///
/// Fields that do not apply to a record's kind are `None`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MessageContext {
    pub day: Day,
    pub severity: String,
    /// `HH:MM` of the gap start or wake-up event.
    pub time: Option<String>,
    /// Whole hours of inactivity.
    pub duration: Option<u64>,
    /// Where the resident was last seen.
    pub location: Option<String>,
    /// Number of night events.
    pub count: Option<usize>,
    /// `HH:MM ~ HH:MM` of the night events.
    pub time_range: Option<String>,
}

impl MessageContext {
    pub fn from_record(record: &AnomalyRecord) -> Self {
        let mut ctx = MessageContext {
            day: record.day,
            severity: record.severity.to_string(),
            ..MessageContext::default()
        };

        match &record.details {
            AnomalyDetails::LongInactivity {
                start_time,
                duration_hours,
                last_location,
                ..
            } => {
                ctx.time = Some(start_time.at().format("%H:%M").to_string());
                ctx.duration = Some(duration_hours.trunc().max(0.0) as u64);
                ctx.location = Some(last_location.display_name().to_string());
            }
            AnomalyDetails::MidnightWandering {
                event_count,
                time_range,
                ..
            } => {
                ctx.count = Some(*event_count);
                ctx.time_range = Some(format!(
                    "{} ~ {}",
                    time_range.first.at().format("%H:%M"),
                    time_range.last.at().format("%H:%M"),
                ));
            }
            AnomalyDetails::IrregularSleep {
                wake_time,
                first_location,
                ..
            } => {
                ctx.time = Some(wake_time.at().format("%H:%M").to_string());
                ctx.location = Some(first_location.display_name().to_string());
            }
        }
        ctx
    }
}

// ── Renderer ──────────────────────────────────────────────────

/// Renders anomaly records with the built-in templates, or with
/// per-(kind, tone) overrides.
#[derive(Debug, Default)]
pub struct MessageRenderer {
    overrides: HashMap<(AnomalyKind, Tone), String>,
}

impl MessageRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the template used for one (kind, tone) pair.
    pub fn with_template(
        mut self,
        kind: AnomalyKind,
        tone: Tone,
        template: impl Into<String>,
    ) -> Self {
        self.overrides.insert((kind, tone), template.into());
        self
    }

    /// Strict undefined handling: a template naming a missing variable fails
    /// instead of rendering an empty string.
    fn build_env() -> minijinja::Environment<'static> {
        let mut env = minijinja::Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        env
    }

    fn template(&self, kind: AnomalyKind, tone: Tone) -> &str {
        self.overrides
            .get(&(kind, tone))
            .map(String::as_str)
            .unwrap_or_else(|| default_template(kind, tone))
    }

    /// Render one record.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError::Template`] if the selected template is invalid
    /// or references a variable the context does not provide.
    pub fn render(&self, record: &AnomalyRecord, tone: Tone) -> Result<RenderedMessage, NotifyError> {
        let kind = record.kind();
        let ctx = MessageContext::from_record(record);
        let body = Self::build_env()
            .render_str(self.template(kind, tone), &ctx)
            .map_err(|e| NotifyError::Template(e.to_string()))?;

        debug!(day = record.day, kind = %kind, tone = %tone, "message rendered");

        Ok(RenderedMessage {
            anomaly_type: kind,
            severity: record.severity,
            day: record.day,
            tone,
            message: format!("{} {}", severity_marker(record.severity), body),
            recommendation: recommendation(kind, record.severity).to_string(),
        })
    }

    /// Render every record in order, stopping at the first failure.
    pub fn render_all(
        &self,
        records: &[AnomalyRecord],
        tone: Tone,
    ) -> Result<Vec<RenderedMessage>, NotifyError> {
        records.iter().map(|r| self.render(r, tone)).collect()
    }

    /// Check that every template in use parses.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError::Template`] naming the first broken pair.
    pub fn validate(&self) -> Result<(), NotifyError> {
        let env = Self::build_env();
        for kind in AnomalyKind::ALL {
            for tone in Tone::ALL {
                env.template_from_str(self.template(kind, tone))
                    .map_err(|e| NotifyError::Template(format!("{kind}/{tone}: {e}")))?;
            }
        }
        Ok(())
    }
}
