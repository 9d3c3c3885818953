//! Results file written by `carewatch detect`.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use carewatch_detect::{AccuracyReport, AnomalyKind, AnomalyRecord, DetectionRun, RunMetrics};
use carewatch_notify::RenderedMessage;

#[derive(Debug, Serialize)]
pub struct Summary {
    pub total_anomalies: usize,
    pub by_type: BTreeMap<AnomalyKind, usize>,
    pub metrics: AccuracyReport,
    pub run: RunMetrics,
}

#[derive(Debug, Serialize)]
pub struct DetectionOutput {
    pub summary: Summary,
    pub anomalies: Vec<AnomalyRecord>,
    pub messages: Vec<RenderedMessage>,
}

impl DetectionOutput {
    pub fn new(run: DetectionRun, metrics: AccuracyReport, messages: Vec<RenderedMessage>) -> Self {
        let mut by_type = BTreeMap::new();
        for anomaly in &run.anomalies {
            *by_type.entry(anomaly.kind()).or_insert(0) += 1;
        }
        Self {
            summary: Summary {
                total_anomalies: run.anomalies.len(),
                by_type,
                metrics,
                run: run.metrics,
            },
            anomalies: run.anomalies,
            messages,
        }
    }

    /// One log line per anomaly, in output order.
    pub fn log_anomalies(&self) {
        for anomaly in &self.anomalies {
            info!(
                day = anomaly.day,
                kind = %anomaly.kind(),
                severity = %anomaly.severity,
                "{}",
                anomaly.description
            );
        }
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("failed to serialize results")
    }

    /// Write pretty JSON to `path`, creating parent directories.
    pub fn write(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        fs::write(path, self.to_json()?)
            .with_context(|| format!("failed to write {}", path.display()))?;
        info!(path = %path.display(), "results written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use carewatch_core::{DetectionConfig, EventType, SensorEvent, SensorLocation};
    use carewatch_detect::{evaluate, partition, DetectionEngine};
    use carewatch_notify::{MessageRenderer, Tone};

    fn quiet_afternoon() -> Vec<SensorEvent> {
        ["2024-11-24T07:30:00", "2024-11-24T09:00:00", "2024-11-24T12:00:00"]
            .iter()
            .map(|ts| {
                let at = carewatch_core::EventTime::parse(ts).unwrap().at();
                SensorEvent::new(at, SensorLocation::Kitchen, EventType::Motion, 1)
                    .with_pattern_label("anomaly_long_inactivity")
            })
            .collect()
    }

    fn output() -> DetectionOutput {
        let events = quiet_afternoon();
        let run = DetectionEngine::new(DetectionConfig::default()).run_partitions(&partition(&events));
        let report = evaluate(&run.anomalies, &events, 1).unwrap();
        let messages = MessageRenderer::new().render_all(&run.anomalies, Tone::Family).unwrap();
        DetectionOutput::new(run, report, messages)
    }

    #[test]
    fn summary_shape() {
        let json: serde_json::Value = serde_json::from_str(&output().to_json().unwrap()).unwrap();

        assert_eq!(json["summary"]["total_anomalies"], 1);
        assert_eq!(json["summary"]["by_type"]["long_inactivity"], 1);
        assert_eq!(json["summary"]["metrics"]["true_positives"], 1);
        assert_eq!(json["summary"]["metrics"]["accuracy"], 100.0);
        assert_eq!(json["anomalies"][0]["end_time"], "end_of_day");
        assert_eq!(json["messages"][0]["tone"], "family");
    }

    #[test]
    fn write_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results").join("week.json");

        output().write(&path).unwrap();

        let written: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written["summary"]["total_anomalies"], 1);
    }
}
