#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schema for the turbine monitor.
//!
//! - `Config` and sub-structs are deserialized from TOML and validated.
//! - Every section is optional; an empty document yields the documented
//!   defaults (6.6 s window, threshold -2.0, sensitivity 0.5, 10 s cooldown,
//!   200 ms polling).
use serde::Deserialize;
use serde::de::Deserializer;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SensorCfg {
    /// Pause between two sensor polls in milliseconds.
    pub poll_ms: u64,
    /// Linux I2C bus number of the IMU.
    pub i2c_bus: u8,
    /// 7-bit I2C address. Accepts an integer or a "0x68" style string.
    #[serde(deserialize_with = "de_i2c_address")]
    pub i2c_address: u16,
}

impl Default for SensorCfg {
    fn default() -> Self {
        Self {
            poll_ms: 200,
            i2c_bus: 1,
            i2c_address: 0x68,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct WindowCfg {
    /// Window length in seconds; one full rotation of the turbine.
    pub size_secs: f64,
}

impl Default for WindowCfg {
    fn default() -> Self {
        Self { size_secs: 6.6 }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ModelCfg {
    pub model_path: PathBuf,
    /// Optional scaler artifact; identity normalization when absent.
    pub scaler_path: Option<PathBuf>,
}

impl Default for ModelCfg {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("models/model.json"),
            scaler_path: Some(PathBuf::from("models/scaler.json")),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct AlertsCfg {
    pub enabled: bool,
    /// Scores strictly below this value are anomalies.
    pub threshold: f64,
    /// Range: [0.0, 1.0].
    pub sensitivity: f64,
    /// Minimum time between two dispatched alerts.
    pub cooldown_secs: u64,
    /// Recipient handed to the alert transport.
    pub destination: String,
}

impl Default for AlertsCfg {
    fn default() -> Self {
        Self {
            enabled: true,
            threshold: -2.0,
            sensitivity: 0.5,
            cooldown_secs: 10,
            destination: "+1234567890".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DataLogCfg {
    pub enabled: bool,
    pub path: PathBuf,
}

impl Default for DataLogCfg {
    fn default() -> Self {
        Self {
            enabled: true,
            path: PathBuf::from("data/sensor_data.csv"),
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    /// Poll, process and sleep on a single thread.
    #[default]
    Direct,
    /// Poll on a dedicated thread feeding a bounded channel.
    Sampler,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct RunnerCfg {
    pub mode: RunMode,
    /// Capacity of the sampler channel; oldest readings are dropped when full.
    pub channel_capacity: usize,
}

impl Default for RunnerCfg {
    fn default() -> Self {
        Self {
            mode: RunMode::Direct,
            channel_capacity: 16,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub sensor: SensorCfg,
    pub window: WindowCfg,
    pub model: ModelCfg,
    pub alerts: AlertsCfg,
    pub datalog: DataLogCfg,
    pub logging: Logging,
    pub runner: RunnerCfg,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum AddressToml {
    Int(u16),
    Text(String),
}

fn de_i2c_address<'de, D>(deserializer: D) -> Result<u16, D::Error>
where
    D: Deserializer<'de>,
{
    match AddressToml::deserialize(deserializer)? {
        AddressToml::Int(v) => Ok(v),
        AddressToml::Text(s) => {
            let t = s.trim();
            let parsed = match t.strip_prefix("0x").or_else(|| t.strip_prefix("0X")) {
                Some(hex) => u16::from_str_radix(hex, 16),
                None => t.parse::<u16>(),
            };
            parsed.map_err(|e| serde::de::Error::custom(format!("invalid i2c_address {s:?}: {e}")))
        }
    }
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

/// Read and parse a config file. Validation is left to the caller.
pub fn load_file(path: &Path) -> eyre::Result<Config> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| eyre::eyre!("read config {:?}: {}", path, e))?;
    load_toml(&text).map_err(|e| eyre::eyre!("parse config {:?}: {}", path, e))
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // Sensor
        if self.sensor.poll_ms == 0 {
            eyre::bail!("sensor.poll_ms must be >= 1");
        }
        if self.sensor.poll_ms > 60 * 1000 {
            eyre::bail!("sensor.poll_ms is unreasonably large (>60s)");
        }
        if self.sensor.i2c_address > 0x7F {
            eyre::bail!("sensor.i2c_address must be a 7-bit address (<= 0x7f)");
        }

        // Window
        if !self.window.size_secs.is_finite() || self.window.size_secs <= 0.0 {
            eyre::bail!("window.size_secs must be > 0");
        }
        if self.window.size_secs > 24.0 * 60.0 * 60.0 {
            eyre::bail!("window.size_secs is unreasonably large (>24h)");
        }

        // Alerts
        if !self.alerts.threshold.is_finite() {
            eyre::bail!("alerts.threshold must be a finite number");
        }
        if !(0.0..=1.0).contains(&self.alerts.sensitivity) {
            eyre::bail!("alerts.sensitivity must be in [0.0, 1.0]");
        }
        if self.alerts.enabled && self.alerts.destination.trim().is_empty() {
            eyre::bail!("alerts.destination must be set when alerts are enabled");
        }

        // Model
        if self.model.model_path.as_os_str().is_empty() {
            eyre::bail!("model.model_path must not be empty");
        }

        // Datalog
        if self.datalog.enabled && self.datalog.path.as_os_str().is_empty() {
            eyre::bail!("datalog.path must not be empty when datalog is enabled");
        }

        // Logging
        if let Some(r) = self.logging.rotation.as_deref()
            && !matches!(r, "never" | "daily" | "hourly")
        {
            eyre::bail!("logging.rotation must be one of never|daily|hourly");
        }

        // Runner
        if self.runner.channel_capacity == 0 {
            eyre::bail!("runner.channel_capacity must be >= 1");
        }

        Ok(())
    }
}
