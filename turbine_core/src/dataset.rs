//! Offline tools: replay a raw log into feature vectors, persist feature
//! tables, and measure a model against labelled feature sets.

use std::path::Path;
use std::time::Duration;

use crate::artifact::Verdict;
use crate::error::{ConfigError, DataLogError};
use crate::features::FeatureExtractor;
use crate::scoring::ScoringEngine;
use crate::types::{FEATURE_COUNT, FEATURE_NAMES, FeatureVector, Reading};
use crate::window::{WindowBuffer, WindowResult};

/// Replay `readings` in order through a fresh buffer and reduce every closed
/// window. The trailing partial window is not emitted.
pub fn extract_features(
    readings: &[Reading],
    window_size: Duration,
) -> Result<Vec<FeatureVector>, ConfigError> {
    let mut buffer = WindowBuffer::new(window_size)?;
    let mut out = Vec::new();
    for reading in readings {
        if let WindowResult::Closed(window) = buffer.accumulate(*reading) {
            match FeatureExtractor::reduce(&window) {
                Ok(fv) => out.push(fv),
                Err(e) => tracing::warn!(error = %e, "skipping window"),
            }
        }
    }
    tracing::info!(
        readings = readings.len(),
        windows = out.len(),
        "feature extraction complete"
    );
    Ok(out)
}

pub fn write_features_csv(path: &Path, features: &[FeatureVector]) -> Result<(), DataLogError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    let mut wtr = csv::Writer::from_path(path)?;
    wtr.write_record(FEATURE_NAMES)?;
    for fv in features {
        wtr.write_record(fv.values().iter().map(f64::to_string))?;
    }
    wtr.flush()?;
    Ok(())
}

/// Read a feature table. Columns are matched by header name, so extra
/// columns and any column order are accepted; rows with a missing or
/// non-finite value are dropped.
pub fn read_features_csv(path: &Path) -> Result<Vec<FeatureVector>, DataLogError> {
    let mut rdr = csv::ReaderBuilder::new().flexible(true).from_path(path)?;
    let headers = rdr.headers()?.clone();
    let mut columns = [0usize; FEATURE_COUNT];
    for (slot, name) in columns.iter_mut().zip(FEATURE_NAMES) {
        *slot = headers
            .iter()
            .position(|h| h.trim() == name)
            .ok_or_else(|| DataLogError::MissingColumn(name.to_string()))?;
    }

    let mut out = Vec::new();
    let mut dropped = 0usize;
    for record in rdr.records() {
        let record = record?;
        let mut values = [0.0; FEATURE_COUNT];
        let parsed = columns.iter().zip(values.iter_mut()).all(|(&col, v)| {
            match record.get(col).and_then(|s| s.trim().parse::<f64>().ok()) {
                Some(x) => {
                    *v = x;
                    true
                }
                None => false,
            }
        });
        match parsed.then(|| FeatureVector::new(values)).flatten() {
            Some(fv) => out.push(fv),
            None => dropped += 1,
        }
    }
    if dropped > 0 {
        tracing::warn!(dropped, path = %path.display(), "dropped incomplete feature rows");
    }
    Ok(out)
}

/// Per-class results of running a model over labelled feature sets.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Evaluation {
    pub normal_total: usize,
    pub normal_correct: usize,
    pub anomaly_total: usize,
    pub anomaly_correct: usize,
    /// Vectors the engine could not score.
    pub unscored: usize,
}

impl Evaluation {
    /// Fraction of all samples classified correctly; `None` with no samples.
    pub fn accuracy(&self) -> Option<f64> {
        let total = self.normal_total + self.anomaly_total;
        (total > 0).then(|| (self.normal_correct + self.anomaly_correct) as f64 / total as f64)
    }

    pub fn normal_rate(&self) -> Option<f64> {
        (self.normal_total > 0).then(|| self.normal_correct as f64 / self.normal_total as f64)
    }

    pub fn anomaly_rate(&self) -> Option<f64> {
        (self.anomaly_total > 0).then(|| self.anomaly_correct as f64 / self.anomaly_total as f64)
    }
}

/// Classify both sets with `engine`. A vector that cannot be scored counts
/// toward its class total but never as correct.
pub fn evaluate(
    engine: &ScoringEngine,
    normal: &[FeatureVector],
    anomalies: &[FeatureVector],
) -> Evaluation {
    let mut eval = Evaluation {
        normal_total: normal.len(),
        anomaly_total: anomalies.len(),
        ..Evaluation::default()
    };
    for (set, expected, correct) in [
        (normal, Verdict::Normal, &mut eval.normal_correct),
        (anomalies, Verdict::Anomaly, &mut eval.anomaly_correct),
    ] {
        for fv in set {
            match engine.predict(fv) {
                Some(v) if v == expected => *correct += 1,
                Some(_) => {}
                None => eval.unscored += 1,
            }
        }
    }
    eval
}
