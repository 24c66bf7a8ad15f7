//! Trained scaler and model artifacts.
//!
//! Both are JSON documents in one of two shapes:
//!
//! - bare: the transform itself, e.g. `{"mean": [...], "scale": [...]}`
//! - bundle: `{"scaler": {...}, "feature_names": [...]}` or
//!   `{"model": {...}, "feature_names": [...]}`
//!
//! Bundles carry the feature order used at training time so live vectors can
//! be realigned by name. An empty `feature_names` list is treated as absent.

use std::path::Path;

use serde::Deserialize;

use crate::error::{ArtifactLoadError, ScoreError};

/// Which document shape an artifact was loaded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactShape {
    Bare,
    Bundle,
}

impl ArtifactShape {
    pub fn as_str(self) -> &'static str {
        match self {
            ArtifactShape::Bare => "bare",
            ArtifactShape::Bundle => "bundle",
        }
    }
}

/// Per-feature standardization `(x - mean_i) / scale_i`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StandardScaler {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

impl StandardScaler {
    pub fn dim(&self) -> usize {
        self.mean.len()
    }

    pub fn transform(&self, x: &[f64]) -> Result<Vec<f64>, ScoreError> {
        if x.len() != self.dim() {
            return Err(ScoreError::DimensionMismatch {
                expected: self.dim(),
                got: x.len(),
            });
        }
        let out: Vec<f64> = x
            .iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(v, (m, s))| (v - m) / s)
            .collect();
        if out.iter().any(|v| !v.is_finite()) {
            return Err(ScoreError::NonFinite { stage: "scaling" });
        }
        Ok(out)
    }

    fn validate(&self) -> Result<(), ArtifactLoadError> {
        if self.mean.is_empty() {
            return Err(invalid("scaler has no features"));
        }
        if self.mean.len() != self.scale.len() {
            return Err(invalid(format!(
                "scaler mean has {} entries but scale has {}",
                self.mean.len(),
                self.scale.len()
            )));
        }
        if self.mean.iter().any(|v| !v.is_finite()) {
            return Err(invalid("scaler mean contains non-finite values"));
        }
        if self.scale.iter().any(|s| !s.is_finite() || *s == 0.0) {
            return Err(invalid("scaler scale must be finite and non-zero"));
        }
        Ok(())
    }
}

/// Outcome of a model's decision capability.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Decision {
    /// Signed distance from the boundary; positive is normal.
    Score(f64),
    /// Classification only.
    Label(Verdict),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Normal,
    Anomaly,
}

/// Anything that can place a normalized feature vector relative to a
/// normal/anomaly boundary.
pub trait AnomalyModel: Send + Sync + std::fmt::Debug {
    fn input_dim(&self) -> usize;
    fn decide(&self, x: &[f64]) -> Result<Decision, ScoreError>;
    fn kind(&self) -> &'static str;
}

/// Model families understood by the JSON loader.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DecisionModel {
    /// `w . x + intercept`
    Linear { weights: Vec<f64>, intercept: f64 },
    /// One-class SVM with RBF kernel:
    /// `sum_i dual_coef_i * exp(-gamma * |x - sv_i|^2) + intercept`
    RbfOneClass {
        gamma: f64,
        support_vectors: Vec<Vec<f64>>,
        dual_coef: Vec<f64>,
        intercept: f64,
    },
    /// Label-only classifier: normal iff every feature is inside `[lower, upper]`.
    Envelope { lower: Vec<f64>, upper: Vec<f64> },
}

impl AnomalyModel for DecisionModel {
    fn input_dim(&self) -> usize {
        match self {
            DecisionModel::Linear { weights, .. } => weights.len(),
            DecisionModel::RbfOneClass {
                support_vectors, ..
            } => support_vectors.first().map_or(0, Vec::len),
            DecisionModel::Envelope { lower, .. } => lower.len(),
        }
    }

    fn decide(&self, x: &[f64]) -> Result<Decision, ScoreError> {
        let expected = self.input_dim();
        if x.len() != expected {
            return Err(ScoreError::DimensionMismatch {
                expected,
                got: x.len(),
            });
        }
        match self {
            DecisionModel::Linear { weights, intercept } => Ok(Decision::Score(
                weights.iter().zip(x).map(|(w, v)| w * v).sum::<f64>() + intercept,
            )),
            DecisionModel::RbfOneClass {
                gamma,
                support_vectors,
                dual_coef,
                intercept,
            } => {
                let mut acc = *intercept;
                for (sv, alpha) in support_vectors.iter().zip(dual_coef) {
                    let d2: f64 = sv.iter().zip(x).map(|(a, b)| (a - b) * (a - b)).sum();
                    acc += alpha * (-gamma * d2).exp();
                }
                Ok(Decision::Score(acc))
            }
            DecisionModel::Envelope { lower, upper } => {
                let inside = x
                    .iter()
                    .zip(lower.iter().zip(upper))
                    .all(|(v, (lo, hi))| *v >= *lo && *v <= *hi);
                Ok(Decision::Label(if inside {
                    Verdict::Normal
                } else {
                    Verdict::Anomaly
                }))
            }
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            DecisionModel::Linear { .. } => "linear",
            DecisionModel::RbfOneClass { .. } => "rbf_one_class",
            DecisionModel::Envelope { .. } => "envelope",
        }
    }
}

impl DecisionModel {
    fn validate(&self) -> Result<(), ArtifactLoadError> {
        let finite = |xs: &[f64]| xs.iter().all(|v| v.is_finite());
        match self {
            DecisionModel::Linear { weights, intercept } => {
                if weights.is_empty() {
                    return Err(invalid("linear model has no weights"));
                }
                if !finite(weights) || !intercept.is_finite() {
                    return Err(invalid("linear model contains non-finite values"));
                }
            }
            DecisionModel::RbfOneClass {
                gamma,
                support_vectors,
                dual_coef,
                intercept,
            } => {
                if !(gamma.is_finite() && *gamma > 0.0) {
                    return Err(invalid("rbf gamma must be finite and > 0"));
                }
                let Some(dim) = support_vectors.first().map(Vec::len) else {
                    return Err(invalid("rbf model has no support vectors"));
                };
                if dim == 0 || support_vectors.iter().any(|sv| sv.len() != dim) {
                    return Err(invalid("rbf support vectors have inconsistent dimensions"));
                }
                if dual_coef.len() != support_vectors.len() {
                    return Err(invalid(format!(
                        "rbf model has {} support vectors but {} dual coefficients",
                        support_vectors.len(),
                        dual_coef.len()
                    )));
                }
                if !support_vectors.iter().all(|sv| finite(sv))
                    || !finite(dual_coef)
                    || !intercept.is_finite()
                {
                    return Err(invalid("rbf model contains non-finite values"));
                }
            }
            DecisionModel::Envelope { lower, upper } => {
                if lower.is_empty() || lower.len() != upper.len() {
                    return Err(invalid("envelope bounds must be non-empty and equal length"));
                }
                if lower.iter().zip(upper).any(|(lo, hi)| lo > hi) {
                    return Err(invalid("envelope lower bound exceeds upper bound"));
                }
            }
        }
        Ok(())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ScalerDoc {
    Bundle {
        scaler: StandardScaler,
        #[serde(default)]
        feature_names: Vec<String>,
    },
    Bare(StandardScaler),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ModelDoc {
    Bundle {
        model: DecisionModel,
        #[serde(default)]
        feature_names: Vec<String>,
    },
    Bare(DecisionModel),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScalerArtifact {
    pub scaler: StandardScaler,
    pub feature_names: Option<Vec<String>>,
    pub shape: ArtifactShape,
}

impl ScalerArtifact {
    pub fn load(path: &Path) -> Result<Self, ArtifactLoadError> {
        let text = read(path)?;
        let doc: ScalerDoc = serde_json::from_str(&text).map_err(|source| ArtifactLoadError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        let artifact = match doc {
            ScalerDoc::Bundle {
                scaler,
                feature_names,
            } => Self::with_names(scaler, feature_names)?,
            ScalerDoc::Bare(scaler) => Self::bare(scaler)?,
        };
        tracing::info!(
            path = %path.display(),
            shape = artifact.shape.as_str(),
            features = artifact.scaler.dim(),
            names = ?artifact.feature_names,
            "scaler loaded"
        );
        Ok(artifact)
    }

    pub fn bare(scaler: StandardScaler) -> Result<Self, ArtifactLoadError> {
        scaler.validate()?;
        Ok(Self {
            scaler,
            feature_names: None,
            shape: ArtifactShape::Bare,
        })
    }

    pub fn with_names(
        scaler: StandardScaler,
        names: Vec<String>,
    ) -> Result<Self, ArtifactLoadError> {
        scaler.validate()?;
        let feature_names = check_names(names, scaler.dim())?;
        Ok(Self {
            scaler,
            feature_names,
            shape: ArtifactShape::Bundle,
        })
    }
}

#[derive(Debug)]
pub struct ModelArtifact {
    pub model: Box<dyn AnomalyModel>,
    pub feature_names: Option<Vec<String>>,
    pub shape: ArtifactShape,
}

impl ModelArtifact {
    pub fn load(path: &Path) -> Result<Self, ArtifactLoadError> {
        let text = read(path)?;
        let doc: ModelDoc = serde_json::from_str(&text).map_err(|source| ArtifactLoadError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        let artifact = match doc {
            ModelDoc::Bundle {
                model,
                feature_names,
            } => {
                model.validate()?;
                Self::with_names(model, feature_names)?
            }
            ModelDoc::Bare(model) => {
                model.validate()?;
                Self::bare(model)
            }
        };
        tracing::info!(
            path = %path.display(),
            shape = artifact.shape.as_str(),
            kind = artifact.model.kind(),
            features = artifact.model.input_dim(),
            names = ?artifact.feature_names,
            "model loaded"
        );
        Ok(artifact)
    }

    pub fn bare(model: impl AnomalyModel + 'static) -> Self {
        Self {
            model: Box::new(model),
            feature_names: None,
            shape: ArtifactShape::Bare,
        }
    }

    pub fn with_names(
        model: impl AnomalyModel + 'static,
        names: Vec<String>,
    ) -> Result<Self, ArtifactLoadError> {
        let feature_names = check_names(names, model.input_dim())?;
        Ok(Self {
            model: Box::new(model),
            feature_names,
            shape: ArtifactShape::Bundle,
        })
    }
}

fn read(path: &Path) -> Result<String, ArtifactLoadError> {
    std::fs::read_to_string(path).map_err(|source| ArtifactLoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn invalid(msg: impl Into<String>) -> ArtifactLoadError {
    ArtifactLoadError::Invalid(msg.into())
}

fn check_names(names: Vec<String>, dim: usize) -> Result<Option<Vec<String>>, ArtifactLoadError> {
    if names.is_empty() {
        return Ok(None);
    }
    if names.len() != dim {
        return Err(invalid(format!(
            "artifact lists {} feature names for {} features",
            names.len(),
            dim
        )));
    }
    for (i, n) in names.iter().enumerate() {
        if names[..i].contains(n) {
            return Err(invalid(format!("duplicate feature name {n:?}")));
        }
    }
    Ok(Some(names))
}
