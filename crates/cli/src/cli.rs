use std::path::PathBuf;

use carewatch_notify::Tone;
use clap::{Args, Parser, Subcommand, ValueEnum};

/// Household sensor anomaly detection.
///
/// Reads a labelled or unlabelled event file, runs the per-day detectors,
/// scores them against any ground-truth labels, and renders caregiver
/// messages.
#[derive(Parser, Debug)]
#[command(name = "carewatch", version, about)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run detection over an event file
    Detect(DetectArgs),
    /// Validate a detection config file and print the resolved values
    CheckConfig {
        /// Path to the YAML config
        path: PathBuf,
    },
}

#[derive(Args, Debug)]
pub struct DetectArgs {
    /// Event file: `{ "metadata": ..., "events": [...] }` or a bare array
    #[arg(long, env = "CAREWATCH_EVENTS")]
    pub events: PathBuf,

    /// YAML detection config (environment and defaults when not set)
    #[arg(long, env = "CAREWATCH_CONFIG")]
    pub config: Option<PathBuf>,

    /// Length of the evaluated period in days (default: metadata, then observed days)
    #[arg(long)]
    pub total_days: Option<u32>,

    /// Write results JSON here instead of stdout
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Message audience
    #[arg(long, value_enum, default_value_t = ToneArg::Both)]
    pub tone: ToneArg,

    /// Process days on the calling thread
    #[arg(long)]
    pub sequential: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ToneArg {
    Family,
    Professional,
    Both,
}

impl ToneArg {
    pub fn tones(self) -> Vec<Tone> {
        match self {
            ToneArg::Family => vec![Tone::Family],
            ToneArg::Professional => vec![Tone::Professional],
            ToneArg::Both => Tone::ALL.to_vec(),
        }
    }
}
