//! Readings, windows and feature vectors.

use std::time::Duration;

use chrono::{DateTime, Utc};
use turbine_traits::ImuSample;

use crate::error::SensorError;

/// Feature channels in training order. Temperature is not a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    AccelX,
    AccelY,
    AccelZ,
    GyroX,
    GyroY,
    GyroZ,
}

impl Channel {
    pub const ALL: [Channel; 6] = [
        Channel::AccelX,
        Channel::AccelY,
        Channel::AccelZ,
        Channel::GyroX,
        Channel::GyroY,
        Channel::GyroZ,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Channel::AccelX => "accel_x",
            Channel::AccelY => "accel_y",
            Channel::AccelZ => "accel_z",
            Channel::GyroX => "gyro_x",
            Channel::GyroY => "gyro_y",
            Channel::GyroZ => "gyro_z",
        }
    }
}

pub const CHANNEL_COUNT: usize = Channel::ALL.len();
pub const FEATURE_COUNT: usize = 2 * CHANNEL_COUNT;

/// Feature names in the order the model was trained on: per channel, mean then std.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "accel_x_mean",
    "accel_x_std",
    "accel_y_mean",
    "accel_y_std",
    "accel_z_mean",
    "accel_z_std",
    "gyro_x_mean",
    "gyro_x_std",
    "gyro_y_mean",
    "gyro_y_std",
    "gyro_z_mean",
    "gyro_z_std",
];

/// One timestamped IMU reading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    pub timestamp: DateTime<Utc>,
    pub accel_x: f64,
    pub accel_y: f64,
    pub accel_z: f64,
    pub gyro_x: f64,
    pub gyro_y: f64,
    pub gyro_z: f64,
    /// Logged only; never part of the feature vector.
    pub temperature: f64,
}

impl Reading {
    /// Build a reading from a raw capability sample, rejecting non-finite values.
    pub fn from_sample(sample: ImuSample, timestamp: DateTime<Utc>) -> Result<Self, SensorError> {
        let reading = Self {
            timestamp,
            accel_x: sample.accel[0],
            accel_y: sample.accel[1],
            accel_z: sample.accel[2],
            gyro_x: sample.gyro[0],
            gyro_y: sample.gyro[1],
            gyro_z: sample.gyro[2],
            temperature: sample.temperature_c,
        };
        reading.validate()?;
        Ok(reading)
    }

    pub fn validate(&self) -> Result<(), SensorError> {
        for ch in Channel::ALL {
            if !self.channel(ch).is_finite() {
                return Err(SensorError::NonFinite { field: ch.name() });
            }
        }
        if !self.temperature.is_finite() {
            return Err(SensorError::NonFinite {
                field: "temperature",
            });
        }
        Ok(())
    }

    #[inline]
    pub fn channel(&self, ch: Channel) -> f64 {
        match ch {
            Channel::AccelX => self.accel_x,
            Channel::AccelY => self.accel_y,
            Channel::AccelZ => self.accel_z,
            Channel::GyroX => self.gyro_x,
            Channel::GyroY => self.gyro_y,
            Channel::GyroZ => self.gyro_z,
        }
    }
}

/// Elapsed wall time from `from` to `to`; zero when `to` is earlier.
#[inline]
pub(crate) fn elapsed_between(from: DateTime<Utc>, to: DateTime<Utc>) -> Duration {
    (to - from).to_std().unwrap_or(Duration::ZERO)
}

/// A completed (or flushed) batch of readings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Window {
    pub(crate) start: Option<DateTime<Utc>>,
    pub(crate) readings: Vec<Reading>,
}

impl Window {
    pub fn new(start: DateTime<Utc>, readings: Vec<Reading>) -> Self {
        Self {
            start: Some(start),
            readings,
        }
    }

    /// Window start; `None` only for a flush of a buffer that never saw a reading.
    pub fn start(&self) -> Option<DateTime<Utc>> {
        self.start
    }

    pub fn readings(&self) -> &[Reading] {
        &self.readings
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    /// Time from window start to the last reading.
    pub fn span(&self) -> Duration {
        match (self.start, self.readings.last()) {
            (Some(start), Some(last)) => elapsed_between(start, last.timestamp),
            _ => Duration::ZERO,
        }
    }
}

/// Twelve finite features in `FEATURE_NAMES` order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector {
    values: [f64; FEATURE_COUNT],
}

impl FeatureVector {
    /// `None` if any value is NaN or infinite.
    pub fn new(values: [f64; FEATURE_COUNT]) -> Option<Self> {
        values
            .iter()
            .all(|v| v.is_finite())
            .then_some(Self { values })
    }

    pub fn values(&self) -> &[f64; FEATURE_COUNT] {
        &self.values
    }

    /// The training-time name of every position in `values()`.
    pub fn names(&self) -> &'static [&'static str; FEATURE_COUNT] {
        &FEATURE_NAMES
    }

    pub fn len(&self) -> usize {
        FEATURE_COUNT
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        FEATURE_NAMES
            .iter()
            .position(|n| *n == name)
            .map(|i| self.values[i])
    }

    pub fn mean(&self, ch: Channel) -> f64 {
        self.values[2 * channel_index(ch)]
    }

    pub fn std(&self, ch: Channel) -> f64 {
        self.values[2 * channel_index(ch) + 1]
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, f64)> + '_ {
        FEATURE_NAMES.iter().copied().zip(self.values.iter().copied())
    }
}

#[inline]
fn channel_index(ch: Channel) -> usize {
    match ch {
        Channel::AccelX => 0,
        Channel::AccelY => 1,
        Channel::AccelZ => 2,
        Channel::GyroX => 3,
        Channel::GyroY => 4,
        Channel::GyroZ => 5,
    }
}

/// A feature vector with its anomaly score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredSample {
    pub features: FeatureVector,
    /// Signed distance from the decision boundary; negative is anomalous.
    pub score: f64,
}
