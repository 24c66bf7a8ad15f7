//! Normalization and anomaly scoring against trained artifacts.
//!
//! Scoring is fail-quiet: any failure yields the neutral score `0.0`, which
//! sits above every negative alert threshold, and is reported in the log.

use std::path::Path;

use crate::artifact::{Decision, ModelArtifact, ScalerArtifact, Verdict};
use crate::error::{ConfigError, ScoreError};
use crate::types::FeatureVector;

/// Score used whenever scoring cannot complete.
pub const NEUTRAL_SCORE: f64 = 0.0;

#[derive(Debug)]
pub struct ScoringEngine {
    model: Option<ModelArtifact>,
    scaler: Option<ScalerArtifact>,
    sensitivity: f64,
}

impl ScoringEngine {
    /// Load artifacts from disk. Never fails: a missing or malformed model
    /// puts the engine in neutral mode, a missing or malformed scaler means
    /// identity normalization.
    pub fn load(model_path: &Path, scaler_path: Option<&Path>) -> Self {
        let model = match ModelArtifact::load(model_path) {
            Ok(m) => Some(m),
            Err(e) => {
                tracing::error!(error = %e, "model unavailable; every window will score neutral");
                None
            }
        };
        let scaler = match scaler_path {
            Some(p) => match ScalerArtifact::load(p) {
                Ok(s) => Some(s),
                Err(e) => {
                    tracing::warn!(error = %e, "scaler unavailable; using identity normalization");
                    None
                }
            },
            None => {
                tracing::warn!("no scaler configured; using identity normalization");
                None
            }
        };
        Self::from_parts(model, scaler)
    }

    pub fn from_parts(model: Option<ModelArtifact>, scaler: Option<ScalerArtifact>) -> Self {
        Self {
            model,
            scaler,
            sensitivity: 0.5,
        }
    }

    /// Record the operator sensitivity (0.0..=1.0). Informational only.
    pub fn with_sensitivity(mut self, sensitivity: f64) -> Result<Self, ConfigError> {
        if !(0.0..=1.0).contains(&sensitivity) {
            return Err(ConfigError::SensitivityOutOfRange(sensitivity));
        }
        self.sensitivity = sensitivity;
        Ok(self)
    }

    pub fn sensitivity(&self) -> f64 {
        self.sensitivity
    }

    pub fn has_model(&self) -> bool {
        self.model.is_some()
    }

    pub fn has_scaler(&self) -> bool {
        self.scaler.is_some()
    }

    /// Score a feature vector, substituting `NEUTRAL_SCORE` on any failure.
    pub fn score(&self, features: &FeatureVector) -> f64 {
        match self.try_score(features) {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!(error = %e, score = NEUTRAL_SCORE, "scoring failed; using neutral score");
                NEUTRAL_SCORE
            }
        }
    }

    /// Normal iff score >= 0; `None` when scoring failed.
    pub fn predict(&self, features: &FeatureVector) -> Option<Verdict> {
        self.try_score(features).ok().map(|s| {
            if s >= 0.0 {
                Verdict::Normal
            } else {
                Verdict::Anomaly
            }
        })
    }

    pub fn try_score(&self, features: &FeatureVector) -> Result<f64, ScoreError> {
        let model = self.model.as_ref().ok_or(ScoreError::NoModel)?;

        let mut values: Vec<f64> = features.values().to_vec();
        let mut order: Vec<&str> = features.names().to_vec();

        if let Some(scaler) = &self.scaler {
            if let Some(names) = &scaler.feature_names {
                values = realign(&values, &order, names)?;
                order = names.iter().map(String::as_str).collect();
            }
            values = scaler.scaler.transform(&values)?;
        }

        if let Some(names) = &model.feature_names
            && !order.iter().copied().eq(names.iter().map(String::as_str))
        {
            values = realign(&values, &order, names)?;
        }

        let score = match model.model.decide(&values)? {
            Decision::Score(s) => s,
            Decision::Label(Verdict::Normal) => 1.0,
            Decision::Label(Verdict::Anomaly) => -1.0,
        };
        if !score.is_finite() {
            return Err(ScoreError::NonFinite { stage: "decision" });
        }
        tracing::debug!(score, "window scored");
        Ok(score)
    }
}

/// Reorder `values` (named by `from`) into the order given by `to`.
fn realign(values: &[f64], from: &[&str], to: &[String]) -> Result<Vec<f64>, ScoreError> {
    to.iter()
        .map(|name| {
            from.iter()
                .position(|n| *n == name.as_str())
                .map(|i| values[i])
                .ok_or_else(|| ScoreError::MissingFeature(name.clone()))
        })
        .collect()
}
