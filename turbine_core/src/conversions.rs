//! `From` implementations bridging `turbine_config` types to `turbine_core` types.

use std::time::Duration;

use crate::config::{AlertCfg, ModelPaths, PollCfg, WindowCfg};
use crate::runner::SamplingMode;
use crate::util::secs_to_duration;

// ── WindowCfg ────────────────────────────────────────────────────────────────

impl From<&turbine_config::WindowCfg> for WindowCfg {
    fn from(c: &turbine_config::WindowCfg) -> Self {
        Self {
            size: secs_to_duration(c.size_secs),
        }
    }
}

// ── AlertCfg ─────────────────────────────────────────────────────────────────

impl From<&turbine_config::AlertsCfg> for AlertCfg {
    fn from(c: &turbine_config::AlertsCfg) -> Self {
        Self {
            enabled: c.enabled,
            threshold: c.threshold,
            sensitivity: c.sensitivity,
            cooldown: Duration::from_secs(c.cooldown_secs),
            destination: c.destination.clone(),
        }
    }
}

// ── ModelPaths ───────────────────────────────────────────────────────────────

impl From<&turbine_config::ModelCfg> for ModelPaths {
    fn from(c: &turbine_config::ModelCfg) -> Self {
        Self {
            model: c.model_path.clone(),
            scaler: c.scaler_path.clone(),
        }
    }
}

// ── PollCfg ──────────────────────────────────────────────────────────────────

impl From<&turbine_config::SensorCfg> for PollCfg {
    fn from(c: &turbine_config::SensorCfg) -> Self {
        Self {
            period: Duration::from_millis(c.poll_ms),
        }
    }
}

// ── SamplingMode ─────────────────────────────────────────────────────────────

impl From<&turbine_config::RunnerCfg> for SamplingMode {
    fn from(c: &turbine_config::RunnerCfg) -> Self {
        match c.mode {
            turbine_config::RunMode::Direct => SamplingMode::Direct,
            turbine_config::RunMode::Sampler => SamplingMode::Sampler {
                capacity: c.channel_capacity.max(1),
            },
        }
    }
}
