use std::io::Write;

use tempfile::NamedTempFile;
use turbine_core::artifact::{AnomalyModel, ArtifactShape, DecisionModel, StandardScaler};
use turbine_core::{
    FEATURE_COUNT, FEATURE_NAMES, FeatureVector, ModelArtifact, NEUTRAL_SCORE, ScalerArtifact,
    ScoreError, ScoringEngine, Verdict,
};

fn features() -> FeatureVector {
    let mut v = [0.0; FEATURE_COUNT];
    for (i, x) in v.iter_mut().enumerate() {
        *x = i as f64 * 0.5;
    }
    FeatureVector::new(v).unwrap()
}

fn linear(weights: Vec<f64>, intercept: f64) -> DecisionModel {
    DecisionModel::Linear { weights, intercept }
}

fn json_file(body: &str) -> NamedTempFile {
    let mut f = NamedTempFile::new().unwrap();
    f.write_all(body.as_bytes()).unwrap();
    f
}

fn names_json(names: &[&str]) -> String {
    serde_json::to_string(names).unwrap()
}

#[test]
fn identity_scaler_and_linear_model_match_hand_computation() {
    let weights: Vec<f64> = (0..FEATURE_COUNT).map(|i| if i % 2 == 0 { 1.0 } else { -1.0 }).collect();
    let scaler = StandardScaler {
        mean: vec![0.0; FEATURE_COUNT],
        scale: vec![1.0; FEATURE_COUNT],
    };
    let engine = ScoringEngine::from_parts(
        Some(ModelArtifact::bare(linear(weights, 0.25))),
        Some(ScalerArtifact::bare(scaler).unwrap()),
    );
    // Pairs (0.5k, 0.5(k+1)) contribute -0.5 each; six pairs give -3.0.
    assert_eq!(engine.score(&features()), -3.0 + 0.25);
    assert_eq!(engine.predict(&features()), Some(Verdict::Anomaly));
}

#[test]
fn scaler_standardizes_before_the_model() {
    let mut weights = vec![0.0; FEATURE_COUNT];
    weights[2] = 1.0; // accel_y_mean
    let scaler = StandardScaler {
        mean: vec![1.0; FEATURE_COUNT],
        scale: vec![2.0; FEATURE_COUNT],
    };
    let engine = ScoringEngine::from_parts(
        Some(ModelArtifact::bare(linear(weights, 0.0))),
        Some(ScalerArtifact::bare(scaler).unwrap()),
    );
    // accel_y_mean = 1.0 -> (1.0 - 1.0) / 2.0 = 0.0
    assert_eq!(engine.score(&features()), 0.0);
    assert_eq!(engine.predict(&features()), Some(Verdict::Normal));
}

#[test]
fn scaler_names_reorder_live_features() {
    // Scaler and model were trained on the reversed column order.
    let reversed: Vec<String> = FEATURE_NAMES.iter().rev().map(|s| s.to_string()).collect();
    let mut mean = vec![0.0; FEATURE_COUNT];
    mean[0] = 5.5; // gyro_z_std in training order
    let scaler = ScalerArtifact::with_names(
        StandardScaler {
            mean,
            scale: vec![1.0; FEATURE_COUNT],
        },
        reversed.clone(),
    )
    .unwrap();
    let mut weights = vec![0.0; FEATURE_COUNT];
    weights[0] = 1.0;
    let model = ModelArtifact::with_names(linear(weights, -1.0), reversed).unwrap();
    let engine = ScoringEngine::from_parts(Some(model), Some(scaler));
    // gyro_z_std = 5.5 live; standardized to 0.0, so the score is the intercept.
    assert_eq!(engine.try_score(&features()), Ok(-1.0));
}

#[test]
fn model_names_without_scaler_realign_too() {
    let mut names: Vec<String> = FEATURE_NAMES.iter().map(|s| s.to_string()).collect();
    names.swap(0, 11);
    let mut weights = vec![0.0; FEATURE_COUNT];
    weights[0] = 2.0;
    let engine = ScoringEngine::from_parts(
        Some(ModelArtifact::with_names(linear(weights, 0.0), names).unwrap()),
        None,
    );
    assert_eq!(engine.score(&features()), 2.0 * 5.5);
}

#[test]
fn missing_model_scores_neutral() {
    let engine = ScoringEngine::load(std::path::Path::new("/nonexistent/model.json"), None);
    assert!(!engine.has_model());
    assert_eq!(engine.score(&features()), NEUTRAL_SCORE);
    assert_eq!(engine.predict(&features()), None);
    assert_eq!(engine.try_score(&features()), Err(ScoreError::NoModel));
}

#[test]
fn dimension_mismatch_scores_neutral() {
    let engine =
        ScoringEngine::from_parts(Some(ModelArtifact::bare(linear(vec![1.0; 5], -9.0))), None);
    assert_eq!(engine.score(&features()), NEUTRAL_SCORE);
    assert_eq!(
        engine.try_score(&features()),
        Err(ScoreError::DimensionMismatch {
            expected: 5,
            got: FEATURE_COUNT
        })
    );
}

#[test]
fn unknown_feature_name_scores_neutral() {
    let mut names: Vec<String> = FEATURE_NAMES.iter().map(|s| s.to_string()).collect();
    names[3] = "rotor_rpm".into();
    let engine = ScoringEngine::from_parts(
        Some(ModelArtifact::with_names(linear(vec![1.0; FEATURE_COUNT], 0.0), names).unwrap()),
        None,
    );
    assert_eq!(engine.score(&features()), NEUTRAL_SCORE);
}

#[test]
fn loads_bare_and_bundle_json() {
    let scaler = json_file(&format!(
        r#"{{"scaler": {{"mean": {m}, "scale": {s}}}, "feature_names": {n}}}"#,
        m = serde_json::to_string(&vec![0.0; FEATURE_COUNT]).unwrap(),
        s = serde_json::to_string(&vec![1.0; FEATURE_COUNT]).unwrap(),
        n = names_json(&FEATURE_NAMES),
    ));
    let model = json_file(&format!(
        r#"{{"kind": "linear", "weights": {w}, "intercept": -1.5}}"#,
        w = serde_json::to_string(&vec![0.0; FEATURE_COUNT]).unwrap(),
    ));

    let s = ScalerArtifact::load(scaler.path()).unwrap();
    assert_eq!(s.shape, ArtifactShape::Bundle);
    assert_eq!(s.feature_names.as_ref().map(Vec::len), Some(FEATURE_COUNT));
    let m = ModelArtifact::load(model.path()).unwrap();
    assert_eq!(m.shape, ArtifactShape::Bare);
    assert_eq!(m.model.kind(), "linear");

    let engine = ScoringEngine::load(model.path(), Some(scaler.path()));
    assert!(engine.has_model() && engine.has_scaler());
    assert_eq!(engine.score(&features()), -1.5);
}

#[test]
fn loads_rbf_bundle_and_envelope_model() {
    let sv = vec![features().values().to_vec()];
    let rbf = json_file(&format!(
        r#"{{"model": {{"kind": "rbf_one_class", "gamma": 0.1, "support_vectors": {sv}, "dual_coef": [2.0], "intercept": -0.5}}, "feature_names": []}}"#,
        sv = serde_json::to_string(&sv).unwrap(),
    ));
    let m = ModelArtifact::load(rbf.path()).unwrap();
    assert_eq!(m.shape, ArtifactShape::Bundle);
    assert!(m.feature_names.is_none());
    let engine = ScoringEngine::from_parts(Some(m), None);
    // Distance zero to the only support vector: 2.0 * exp(0) - 0.5.
    assert_eq!(engine.score(&features()), 1.5);

    let env = json_file(&format!(
        r#"{{"kind": "envelope", "lower": {lo}, "upper": {hi}}}"#,
        lo = serde_json::to_string(&vec![-1.0; FEATURE_COUNT]).unwrap(),
        hi = serde_json::to_string(&vec![1.0; FEATURE_COUNT]).unwrap(),
    ));
    let engine = ScoringEngine::from_parts(Some(ModelArtifact::load(env.path()).unwrap()), None);
    assert_eq!(engine.score(&features()), -1.0);
    assert_eq!(engine.predict(&features()), Some(Verdict::Anomaly));
}

#[test]
fn malformed_artifacts_are_rejected() {
    let bad_json = json_file("{ not json");
    assert!(ModelArtifact::load(bad_json.path()).is_err());

    let zero_scale = json_file(r#"{"mean": [0.0, 0.0], "scale": [1.0, 0.0]}"#);
    assert!(ScalerArtifact::load(zero_scale.path()).is_err());

    let dup_names = json_file(
        r#"{"model": {"kind": "linear", "weights": [1.0, 1.0], "intercept": 0.0}, "feature_names": ["a", "a"]}"#,
    );
    assert!(ModelArtifact::load(dup_names.path()).is_err());

    let wrong_len = json_file(
        r#"{"model": {"kind": "linear", "weights": [1.0, 1.0], "intercept": 0.0}, "feature_names": ["a"]}"#,
    );
    assert!(ModelArtifact::load(wrong_len.path()).is_err());
}

#[test]
fn bad_scaler_file_falls_back_to_identity() {
    let model = json_file(&format!(
        r#"{{"kind": "linear", "weights": {w}, "intercept": 0.0}}"#,
        w = serde_json::to_string(&vec![1.0; FEATURE_COUNT]).unwrap(),
    ));
    let scaler = json_file("[]");
    let engine = ScoringEngine::load(model.path(), Some(scaler.path()));
    assert!(engine.has_model());
    assert!(!engine.has_scaler());
    let expected: f64 = features().values().iter().sum();
    assert_eq!(engine.score(&features()), expected);
}
