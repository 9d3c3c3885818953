mod cli;
mod fixture;
mod report;

use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use carewatch_core::{load_dotenv, DetectionConfig};
use carewatch_detect::{evaluate, observed_days, partition, DetectionEngine};
use carewatch_notify::MessageRenderer;

use crate::cli::{CliArgs, Command, DetectArgs};
use crate::fixture::Fixture;
use crate::report::DetectionOutput;

fn main() -> Result<()> {
    load_dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let args = CliArgs::parse();
    match args.command {
        Command::Detect(detect) => run_detect(detect),
        Command::CheckConfig { path } => check_config(&path),
    }
}

/// File config when given, otherwise environment over defaults.
fn load_config(path: Option<&Path>) -> Result<DetectionConfig> {
    let config = match path {
        Some(path) => DetectionConfig::from_file(path)
            .with_context(|| format!("failed to load detection config {}", path.display()))?,
        None => DetectionConfig::from_env().context("invalid detection settings in environment")?,
    };
    config.log_summary();
    Ok(config)
}

fn run_detect(args: DetectArgs) -> Result<()> {
    let config = load_config(args.config.as_deref())?;

    let fixture = Fixture::load(&args.events)?;
    let events = fixture.parse_events()?;
    let partitions = partition(&events);
    info!(
        path = %args.events.display(),
        events = events.len(),
        days = partitions.len(),
        "events loaded"
    );

    let engine = DetectionEngine::new(config).parallel(!args.sequential);
    let run = engine.run_partitions(&partitions);

    let total_days = fixture.total_days(args.total_days, observed_days(&events));
    let report = evaluate(&run.anomalies, &events, total_days)
        .with_context(|| format!("cannot score {} over {total_days} days", args.events.display()))?;
    report.log_summary();

    let renderer = MessageRenderer::new();
    let mut messages = Vec::new();
    for tone in args.tone.tones() {
        messages.extend(renderer.render_all(&run.anomalies, tone)?);
    }

    let output = DetectionOutput::new(run, report, messages);
    output.log_anomalies();

    match &args.output {
        Some(path) => output.write(path)?,
        None => println!("{}", output.to_json()?),
    }
    Ok(())
}

fn check_config(path: &Path) -> Result<()> {
    let config = DetectionConfig::from_file(path)
        .with_context(|| format!("invalid detection config {}", path.display()))?;
    config.log_summary();
    println!("{} is valid", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;

    use crate::cli::ToneArg;

    const TWO_DAYS: &str = r#"{
        "metadata": {"start_date": "2024-11-24", "duration_days": 2},
        "events": [
            {"timestamp": "2024-11-24T07:30:00", "sensor_id": "bedroom", "day": 1, "pattern": "anomaly_long_inactivity"},
            {"timestamp": "2024-11-24T09:00:00", "sensor_id": "kitchen", "day": 1, "pattern": "anomaly_long_inactivity"},
            {"timestamp": "2024-11-24T12:00:00", "sensor_id": "kitchen", "day": 1, "pattern": "anomaly_long_inactivity"},
            {"timestamp": "2024-11-25T07:00:00", "sensor_id": "bedroom", "day": 2, "pattern": "normal_active"},
            {"timestamp": "2024-11-25T10:00:00", "sensor_id": "kitchen", "day": 2, "pattern": "normal_active"},
            {"timestamp": "2024-11-25T13:00:00", "sensor_id": "kitchen", "day": 2, "pattern": "normal_active"},
            {"timestamp": "2024-11-25T16:00:00", "sensor_id": "bathroom", "day": 2, "pattern": "normal_active"},
            {"timestamp": "2024-11-25T19:00:00", "sensor_id": "kitchen", "day": 2, "pattern": "normal_active"},
            {"timestamp": "2024-11-25T21:30:00", "sensor_id": "bedroom", "day": 2, "pattern": "normal_active"}
        ]
    }"#;

    fn detect_args(dir: &Path, total_days: Option<u32>) -> DetectArgs {
        let events = dir.join("events.json");
        fs::write(&events, TWO_DAYS).unwrap();
        DetectArgs {
            events,
            config: Some(PathBuf::from(concat!(
                env!("CARGO_MANIFEST_DIR"),
                "/../../config/detection.yaml"
            ))),
            total_days,
            output: Some(dir.join("out").join("results.json")),
            tone: ToneArg::Both,
            sequential: true,
        }
    }

    #[test]
    fn detect_writes_results_file() {
        let dir = tempfile::tempdir().unwrap();
        run_detect(detect_args(dir.path(), None)).unwrap();

        let written = fs::read_to_string(dir.path().join("out").join("results.json")).unwrap();
        let json: serde_json::Value = serde_json::from_str(&written).unwrap();

        assert_eq!(json["summary"]["total_anomalies"], 1);
        assert_eq!(json["anomalies"][0]["type"], "long_inactivity");
        assert_eq!(json["anomalies"][0]["day"], 1);
        assert_eq!(json["summary"]["metrics"]["total_days"], 2);
        assert_eq!(json["summary"]["metrics"]["true_positives"], 1);
        assert_eq!(json["summary"]["metrics"]["true_negatives"], 1);
        assert_eq!(json["summary"]["metrics"]["accuracy"], 100.0);
        assert_eq!(json["messages"].as_array().unwrap().len(), 2);
        assert_eq!(json["messages"][0]["tone"], "family");
        assert_eq!(json["messages"][1]["tone"], "professional");
    }

    #[test]
    fn total_days_flag_overrides_metadata() {
        let dir = tempfile::tempdir().unwrap();
        run_detect(detect_args(dir.path(), Some(4))).unwrap();

        let written = fs::read_to_string(dir.path().join("out").join("results.json")).unwrap();
        let json: serde_json::Value = serde_json::from_str(&written).unwrap();
        assert_eq!(json["summary"]["metrics"]["total_days"], 4);
        assert_eq!(json["summary"]["metrics"]["true_negatives"], 3);
    }

    #[test]
    fn period_shorter_than_the_events_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = run_detect(detect_args(dir.path(), Some(1))).unwrap_err();

        assert!(err.to_string().contains("over 1 days"), "{err}");
        assert!(format!("{err:#}").contains("2 days observed"), "{err:#}");
        assert!(!dir.path().join("out").join("results.json").exists());
    }
}
