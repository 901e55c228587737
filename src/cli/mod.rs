//! Command-line interface definitions

pub mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Acoustic degradation test bench for a voice-interactive care companion
#[derive(Parser)]
#[command(name = "carebench", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate a speech-like test utterance as a WAV file
    Generate {
        /// Output WAV path
        #[arg(short, long)]
        output: PathBuf,
        /// Duration in seconds
        #[arg(short, long, default_value_t = 5.0)]
        duration: f32,
    },

    /// Degrade a WAV file through the noise and room pipeline
    Degrade {
        /// Clean input WAV (mono)
        #[arg(short, long)]
        input: PathBuf,
        /// Degraded output WAV
        #[arg(short, long)]
        output: PathBuf,
        /// Microphone distance in meters (1.0 or 3.0)
        #[arg(long, default_value_t = 1.0)]
        distance: f32,
        /// Target signal-to-noise ratio in dB
        #[arg(long, default_value_t = 15.0)]
        snr: f32,
        /// Noise seed for reproducible output
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Run a scripted scenario end to end with regression tracking
    Run {
        /// Built-in scenario name
        #[arg(short, long, default_value = "medication_inquiry")]
        scenario: String,
        /// Microphone distance in meters (1.0 or 3.0)
        #[arg(long, default_value_t = 1.0)]
        distance: f32,
        /// Target signal-to-noise ratio in dB
        #[arg(long, default_value_t = 15.0)]
        snr: f32,
        /// Noise seed for reproducible output
        #[arg(long)]
        seed: Option<u64>,
        /// Directory holding regression baselines
        #[arg(long, default_value = "tests/baselines")]
        baseline_dir: PathBuf,
        /// Save this run as the new baseline instead of comparing
        #[arg(long)]
        update_baseline: bool,
        /// Companion agent endpoint (requires the remote-agent feature)
        #[cfg(feature = "remote-agent")]
        #[arg(long)]
        endpoint: Option<String>,
    },

    /// List stored regression baselines
    Baselines {
        /// Directory holding regression baselines
        #[arg(long, default_value = "tests/baselines")]
        baseline_dir: PathBuf,
    },
}
