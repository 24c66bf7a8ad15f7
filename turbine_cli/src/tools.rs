//! Offline commands: feature extraction, model evaluation, self-check.

use std::path::{Path, PathBuf};

use eyre::WrapErr;
use turbine_core::datalog::read_raw_csv;
use turbine_core::dataset::{Evaluation, evaluate, extract_features, read_features_csv, write_features_csv};
use turbine_core::hw_error::map_sensor_error;
use turbine_core::util::secs_to_duration;
use turbine_core::{ModelPaths, Reading, ScoringEngine, WindowCfg};
use turbine_traits::MotionSensor;

use crate::monitor::make_sensor;

pub fn run_extract(
    cfg: &turbine_config::Config,
    input: &Path,
    output: &Path,
    window_secs: Option<f64>,
    json: bool,
) -> eyre::Result<()> {
    let window = match window_secs {
        Some(s) => secs_to_duration(s),
        None => WindowCfg::from(&cfg.window).size,
    };
    let raw = read_raw_csv(input).wrap_err_with(|| format!("read raw data {input:?}"))?;
    let features = extract_features(&raw.readings, window)?;
    write_features_csv(output, &features)
        .wrap_err_with(|| format!("write features {output:?}"))?;

    if json {
        println!(
            "{}",
            serde_json::json!({
                "readings": raw.readings.len(),
                "dropped_rows": raw.dropped,
                "windows": features.len(),
                "output": output.display().to_string(),
            })
        );
    } else {
        println!(
            "extracted {} windows from {} readings ({} rows dropped) into {}",
            features.len(),
            raw.readings.len(),
            raw.dropped,
            output.display()
        );
    }
    Ok(())
}

pub fn run_evaluate(
    cfg: &turbine_config::Config,
    model: Option<PathBuf>,
    scaler: Option<PathBuf>,
    normal: &Path,
    anomaly: &Path,
    json: bool,
) -> eyre::Result<()> {
    let defaults = ModelPaths::from(&cfg.model);
    let model = model.unwrap_or(defaults.model);
    let scaler = scaler.or(defaults.scaler);

    let engine = ScoringEngine::load(&model, scaler.as_deref());
    if !engine.has_model() {
        eyre::bail!("model artifact {model:?} could not be loaded");
    }
    let normal_set =
        read_features_csv(normal).wrap_err_with(|| format!("read features {normal:?}"))?;
    let anomaly_set =
        read_features_csv(anomaly).wrap_err_with(|| format!("read features {anomaly:?}"))?;
    let eval = evaluate(&engine, &normal_set, &anomaly_set);
    print_evaluation(&eval, json);
    Ok(())
}

fn pct(rate: Option<f64>) -> String {
    rate.map_or_else(|| "n/a".to_string(), |r| format!("{:.1}%", r * 100.0))
}

fn print_evaluation(eval: &Evaluation, json: bool) {
    if json {
        println!(
            "{}",
            serde_json::json!({
                "normal": { "total": eval.normal_total, "correct": eval.normal_correct },
                "anomaly": { "total": eval.anomaly_total, "correct": eval.anomaly_correct },
                "unscored": eval.unscored,
                "accuracy": eval.accuracy(),
            })
        );
        return;
    }
    println!(
        "normal:   {}/{} correct ({})",
        eval.normal_correct,
        eval.normal_total,
        pct(eval.normal_rate())
    );
    println!(
        "anomaly:  {}/{} correct ({})",
        eval.anomaly_correct,
        eval.anomaly_total,
        pct(eval.anomaly_rate())
    );
    if eval.unscored > 0 {
        println!("unscored: {}", eval.unscored);
    }
    println!("accuracy: {}", pct(eval.accuracy()));
}

pub fn run_self_check(cfg: &turbine_config::Config, simulate: bool, json: bool) -> eyre::Result<()> {
    let paths = ModelPaths::from(&cfg.model);
    let engine = ScoringEngine::load(&paths.model, paths.scaler.as_deref());

    let mut sensor = make_sensor(cfg, simulate)?;
    let sample = sensor
        .read()
        .map_err(|e| map_sensor_error(&*e))
        .wrap_err("self-check sensor read")?;
    let reading = Reading::from_sample(sample, chrono::Utc::now())?;

    if json {
        println!(
            "{}",
            serde_json::json!({
                "sensor": "ok",
                "accel": [reading.accel_x, reading.accel_y, reading.accel_z],
                "gyro": [reading.gyro_x, reading.gyro_y, reading.gyro_z],
                "temperature": reading.temperature,
                "model": engine.has_model(),
                "scaler": engine.has_scaler(),
            })
        );
    } else {
        println!(
            "sensor: ok (accel z {:.2} m/s², temp {:.1} °C)",
            reading.accel_z, reading.temperature
        );
        println!(
            "model: {}",
            if engine.has_model() { "loaded" } else { "missing (neutral scoring)" }
        );
        println!(
            "scaler: {}",
            if engine.has_scaler() { "loaded" } else { "missing (identity)" }
        );
        println!("self-check ok");
    }
    Ok(())
}
