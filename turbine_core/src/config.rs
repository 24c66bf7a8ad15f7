//! Configuration types for the monitor pipeline.
//!
//! These are the runtime configuration structs used by `Monitor` and the
//! runner. They are separate from the TOML-deserialized config in `turbine_config`.

use std::path::PathBuf;
use std::time::Duration;

/// Window aggregation settings.
#[derive(Debug, Clone)]
pub struct WindowCfg {
    /// Window length; one rotation of the turbine. Default: 6.6 s.
    pub size: Duration,
}

impl Default for WindowCfg {
    fn default() -> Self {
        Self {
            size: Duration::from_millis(6600),
        }
    }
}

/// Alert gate and delivery settings.
#[derive(Debug, Clone)]
pub struct AlertCfg {
    /// Deliver alerts to the display and transport. When false anomalies are only logged.
    pub enabled: bool,
    /// Scores strictly below this trigger. Default: -2.0.
    pub threshold: f64,
    /// Operator sensitivity in [0.0, 1.0]. Default: 0.5.
    pub sensitivity: f64,
    /// Minimum time between dispatched alerts. Default: 10 s.
    pub cooldown: Duration,
    /// Recipient passed to the transport.
    pub destination: String,
}

impl Default for AlertCfg {
    fn default() -> Self {
        Self {
            enabled: true,
            threshold: -2.0,
            sensitivity: 0.5,
            cooldown: Duration::from_secs(10),
            destination: "+1234567890".to_string(),
        }
    }
}

/// Artifact locations.
#[derive(Debug, Clone, Default)]
pub struct ModelPaths {
    pub model: PathBuf,
    pub scaler: Option<PathBuf>,
}

/// Sensor polling cadence.
#[derive(Debug, Clone)]
pub struct PollCfg {
    /// Pause between polls. Default: 200 ms (5 Hz).
    pub period: Duration,
}

impl Default for PollCfg {
    fn default() -> Self {
        Self {
            period: Duration::from_millis(200),
        }
    }
}
