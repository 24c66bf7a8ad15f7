use std::path::PathBuf;

use thiserror::Error;

/// Invalid settings detected at construction; fatal at startup.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("window size must be > 0")]
    NonPositiveWindow,
    #[error("sensitivity {0} is out of range [0.0, 1.0]")]
    SensitivityOutOfRange(f64),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// A failed sensor poll. The loop logs it and moves on.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SensorError {
    #[error("timeout waiting for sensor")]
    Timeout,
    #[error("sensor read failed: {0}")]
    Read(String),
    #[error("sensor hardware fault: {0}")]
    Fault(String),
    #[error("sensor returned non-finite {field}")]
    NonFinite { field: &'static str },
}

/// Model or scaler artifact could not be used; scoring degrades instead of failing.
#[derive(Debug, Error)]
pub enum ArtifactLoadError {
    #[error("read artifact {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parse artifact {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid artifact: {0}")]
    Invalid(String),
}

/// Window reduction failures.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum FeatureError {
    #[error("window contains no readings")]
    EmptyWindow,
    #[error("feature {feature} is not finite")]
    NonFinite { feature: &'static str },
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ScoreError {
    #[error("no model loaded")]
    NoModel,
    #[error("dimension mismatch: artifact expects {expected} features, got {got}")]
    DimensionMismatch { expected: usize, got: usize },
    #[error("feature {0:?} required by artifact is not in the feature vector")]
    MissingFeature(String),
    #[error("non-finite value produced during {stage}")]
    NonFinite { stage: &'static str },
}

#[derive(Debug, Error, Clone, PartialEq)]
#[error("alert transport failed: {0}")]
pub struct TransportError(pub String);

#[derive(Debug, Error)]
pub enum DataLogError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("missing column {0:?}")]
    MissingColumn(String),
}

/// Pipeline assembly failures.
#[derive(Debug, Error)]
pub enum MonitorError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    DataLog(#[from] DataLogError),
}

pub type Result<T> = eyre::Result<T>;
