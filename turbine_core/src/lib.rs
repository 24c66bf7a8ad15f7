#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::missing_errors_doc,
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation
)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Turbine vibration monitoring core (hardware-agnostic).
//!
//! All device access goes through the `turbine_traits` capabilities
//! (`MotionSensor`, `AlertTransport`, `StatusDisplay`, `Clock`).
//!
//! ## Pipeline
//!
//! - **Windowing**: readings are grouped into fixed-duration windows, one
//!   rotor revolution each (`window`)
//! - **Features**: per-axis mean and population standard deviation (`features`)
//! - **Scoring**: optional standardization, then a signed decision score
//!   from a trained model loaded from JSON (`artifact`, `scoring`)
//! - **Alerting**: strict threshold plus cooldown (`alert`)
//! - **Orchestration**: `Monitor` ties the stages together; `runner` polls
//!   the sensor directly or through a background `Sampler`
//!
//! `datalog` and `dataset` cover the raw CSV log and the offline
//! extract/evaluate tools.

pub mod alert;
pub mod artifact;
pub mod config;
pub mod conversions;
pub mod datalog;
pub mod dataset;
pub mod error;
pub mod features;
pub mod hw_error;
pub mod mocks;
pub mod monitor;
pub mod runner;
pub mod sampler;
pub mod scoring;
pub mod types;
pub mod util;
pub mod window;

pub use alert::{AlertDecision, AlertPolicy, AlertState};
pub use artifact::{ModelArtifact, ScalerArtifact, Verdict};
pub use config::{AlertCfg, ModelPaths, PollCfg, WindowCfg};
pub use error::{
    ArtifactLoadError, ConfigError, DataLogError, FeatureError, MonitorError, Result,
    ScoreError, SensorError, TransportError,
};
pub use features::FeatureExtractor;
pub use monitor::{Monitor, MonitorStats, WindowReport};
pub use runner::{RunParams, SamplingMode};
pub use scoring::{NEUTRAL_SCORE, ScoringEngine};
pub use types::{
    Channel, FEATURE_COUNT, FEATURE_NAMES, FeatureVector, Reading, ScoredSample, Window,
};
pub use window::{WindowBuffer, WindowResult};
