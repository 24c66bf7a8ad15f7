//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

/// Config location used when `--config` is not given. A missing file at this
/// path means built-in defaults; any other missing path is an error.
pub const DEFAULT_CONFIG: &str = "etc/turbine.toml";

#[derive(Parser, Debug)]
#[command(
    name = "turbine",
    version,
    about = "Wind-turbine vibration anomaly monitor"
)]
pub struct Cli {
    /// Path to config TOML
    #[arg(long, value_name = "FILE", default_value = DEFAULT_CONFIG)]
    pub config: PathBuf,

    /// Log and report as JSON lines instead of pretty text
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace); overrides [logging].level
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Poll the IMU, score every rotation window and raise alerts
    Monitor(MonitorArgs),
    /// Turn a raw sensor CSV into a per-window feature table
    Extract {
        /// Raw readings CSV written by `monitor`
        #[arg(long, value_name = "FILE")]
        input: PathBuf,
        /// Feature table to write
        #[arg(long, value_name = "FILE")]
        output: PathBuf,
        /// Window length in seconds (default: [window].size_secs)
        #[arg(long, value_name = "SECS")]
        window_secs: Option<f64>,
    },
    /// Measure model accuracy on labelled feature tables
    Evaluate {
        /// Model artifact (default: [model].model_path)
        #[arg(long, value_name = "FILE")]
        model: Option<PathBuf>,
        /// Scaler artifact (default: [model].scaler_path)
        #[arg(long, value_name = "FILE")]
        scaler: Option<PathBuf>,
        /// Feature table of normal operation
        #[arg(long, value_name = "FILE")]
        normal: PathBuf,
        /// Feature table of known anomalies
        #[arg(long, value_name = "FILE")]
        anomaly: PathBuf,
    },
    /// Read one sample and report artifact status
    SelfCheck {
        /// Use the simulated IMU even when built with hardware support
        #[arg(long, action = ArgAction::SetTrue)]
        simulate: bool,
    },
}

#[derive(clap::Args, Debug, Clone, Default)]
pub struct MonitorArgs {
    /// Deliver alerts to display and transport (true|false)
    #[arg(long, value_name = "BOOL")]
    pub alerts: Option<bool>,
    /// Scores strictly below this trigger an alert
    #[arg(long, value_name = "SCORE", allow_negative_numbers = true)]
    pub threshold: Option<f64>,
    /// Operator sensitivity; clamped to [0.0, 1.0]
    #[arg(long, value_name = "S", allow_negative_numbers = true)]
    pub sensitivity: Option<f64>,
    /// Minimum seconds between two alerts
    #[arg(long, value_name = "SECS")]
    pub cooldown_secs: Option<u64>,
    /// Poll the sensor on a background thread
    #[arg(long, action = ArgAction::SetTrue)]
    pub sampler: bool,
    /// Stop after this many polls (default: run until Ctrl-C)
    #[arg(long, value_name = "N")]
    pub max_polls: Option<u64>,
    /// Use the simulated IMU even when built with hardware support
    #[arg(long, action = ArgAction::SetTrue)]
    pub simulate: bool,
}
