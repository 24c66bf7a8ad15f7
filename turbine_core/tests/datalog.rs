use std::io::Write;
use std::time::Duration;

use chrono::{TimeDelta, TimeZone, Utc};
use tempfile::tempdir;
use turbine_core::artifact::DecisionModel;
use turbine_core::datalog::{CsvDataLog, RAW_HEADER, ReadingSink, read_raw_csv};
use turbine_core::dataset::{evaluate, extract_features, read_features_csv, write_features_csv};
use turbine_core::{
    DataLogError, FEATURE_COUNT, FEATURE_NAMES, FeatureVector, ModelArtifact, Reading,
    ScoringEngine,
};

fn reading_at(ms: i64, accel_x: f64) -> Reading {
    Reading {
        timestamp: Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap()
            + TimeDelta::milliseconds(ms),
        accel_x,
        accel_y: 0.0,
        accel_z: 9.81,
        gyro_x: 0.0,
        gyro_y: 0.0,
        gyro_z: 0.9,
        temperature: 19.0,
    }
}

#[test]
fn header_is_written_once_across_reopens() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("data").join("sensor_data.csv");

    let mut log = CsvDataLog::open(&path).unwrap();
    log.record(&reading_at(0, 0.1)).unwrap();
    log.record(&reading_at(200, 0.2)).unwrap();
    assert_eq!(log.rows(), 2);
    drop(log);

    let mut log = CsvDataLog::open(&path).unwrap();
    log.record(&reading_at(400, 0.3)).unwrap();
    drop(log);

    let text = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 4);
    assert_eq!(lines[0], RAW_HEADER.join(","));
    assert_eq!(text.matches("timestamp").count(), 1);

    let loaded = read_raw_csv(&path).unwrap();
    assert_eq!(loaded.dropped, 0);
    assert_eq!(loaded.readings.len(), 3);
    assert_eq!(loaded.readings[2], reading_at(400, 0.3));
}

#[test]
fn incomplete_rows_are_dropped() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("raw.csv");
    let mut f = std::fs::File::create(&path).unwrap();
    writeln!(f, "{}", RAW_HEADER.join(",")).unwrap();
    writeln!(f, "2024-06-01T08:00:00.000,0.1,0.0,9.81,0.0,0.0,0.9,19.0").unwrap();
    writeln!(f, "2024-06-01T08:00:00.200,,0.0,9.81,0.0,0.0,0.9,19.0").unwrap();
    writeln!(f, "not-a-time,0.1,0.0,9.81,0.0,0.0,0.9,19.0").unwrap();
    writeln!(f, "2024-06-01T08:00:00.600+00:00,0.3,0.0,9.81,0.0,0.0,0.9,19.0").unwrap();
    drop(f);

    let loaded = read_raw_csv(&path).unwrap();
    assert_eq!(loaded.readings.len(), 2);
    assert_eq!(loaded.dropped, 2);
    assert_eq!(loaded.readings[0], reading_at(0, 0.1));
}

#[test]
fn extract_skips_trailing_partial_window() {
    let readings: Vec<Reading> = (0..25).map(|i| reading_at(i * 100, 1.0)).collect();
    // Windows close at 1000 ms and 2000 ms; 2100..2400 stays partial.
    let features = extract_features(&readings, Duration::from_secs(1)).unwrap();
    assert_eq!(features.len(), 2);
    assert_eq!(features[0].get("accel_x_mean"), Some(1.0));
    assert!(extract_features(&readings, Duration::ZERO).is_err());
}

#[test]
fn feature_table_survives_a_write_read_cycle() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("out").join("features.csv");
    let readings: Vec<Reading> = (0..40)
        .map(|i| reading_at(i * 100, if i % 2 == 0 { 0.5 } else { -0.5 }))
        .collect();
    let features = extract_features(&readings, Duration::from_secs(1)).unwrap();
    write_features_csv(&path, &features).unwrap();

    let header = std::fs::read_to_string(&path).unwrap();
    assert!(header.starts_with(&FEATURE_NAMES.join(",")));
    assert_eq!(read_features_csv(&path).unwrap(), features);
}

#[test]
fn feature_columns_are_found_by_name() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("features.csv");
    let mut cols: Vec<&str> = FEATURE_NAMES.iter().rev().copied().collect();
    cols.insert(0, "label");
    let mut f = std::fs::File::create(&path).unwrap();
    writeln!(f, "{}", cols.join(",")).unwrap();
    // Reversed order: gyro_z_std first, accel_x_mean last.
    let row: Vec<String> = (0..FEATURE_COUNT).map(|i| i.to_string()).collect();
    writeln!(f, "normal,{}", row.join(",")).unwrap();
    writeln!(f, "normal,{}", row[..FEATURE_COUNT - 1].join(",")).unwrap();
    drop(f);

    let loaded = read_features_csv(&path).unwrap();
    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded[0].get("gyro_z_std"), Some(0.0));
    assert_eq!(loaded[0].get("accel_x_mean"), Some(11.0));
}

#[test]
fn missing_feature_column_is_an_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("features.csv");
    std::fs::write(&path, "accel_x_mean,accel_x_std\n1.0,2.0\n").unwrap();
    assert!(matches!(
        read_features_csv(&path),
        Err(DataLogError::MissingColumn(c)) if c == "accel_y_mean"
    ));
}

#[test]
fn evaluation_reports_per_class_accuracy() {
    // Normal iff accel_x_std < 1.0.
    let mut weights = vec![0.0; FEATURE_COUNT];
    weights[1] = -1.0;
    let engine = ScoringEngine::from_parts(
        Some(ModelArtifact::bare(DecisionModel::Linear {
            weights,
            intercept: 1.0,
        })),
        None,
    );
    let with_std = |s: f64| {
        let mut v = [0.0; FEATURE_COUNT];
        v[1] = s;
        FeatureVector::new(v).unwrap()
    };
    let normal = [with_std(0.1), with_std(0.5), with_std(3.0)];
    let anomalies = [with_std(2.0), with_std(0.2)];

    let eval = evaluate(&engine, &normal, &anomalies);
    assert_eq!(eval.normal_correct, 2);
    assert_eq!(eval.anomaly_correct, 1);
    assert_eq!(eval.unscored, 0);
    assert_eq!(eval.accuracy(), Some(3.0 / 5.0));

    let neutral = evaluate(&ScoringEngine::from_parts(None, None), &normal, &anomalies);
    assert_eq!(neutral.unscored, 5);
    assert_eq!(neutral.accuracy(), Some(0.0));
}
