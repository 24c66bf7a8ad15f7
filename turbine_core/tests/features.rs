use chrono::{TimeDelta, TimeZone, Utc};
use proptest::prelude::*;
use turbine_core::{
    Channel, FEATURE_COUNT, FEATURE_NAMES, FeatureError, FeatureExtractor, Reading, Window,
};

fn window_of(rows: &[[f64; 6]]) -> Window {
    let t0 = Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap();
    let readings = rows
        .iter()
        .enumerate()
        .map(|(i, v)| Reading {
            timestamp: t0 + TimeDelta::milliseconds(200 * i as i64),
            accel_x: v[0],
            accel_y: v[1],
            accel_z: v[2],
            gyro_x: v[3],
            gyro_y: v[4],
            gyro_z: v[5],
            temperature: 20.0,
        })
        .collect();
    Window::new(t0, readings)
}

#[test]
fn empty_window_is_an_error() {
    assert_eq!(
        FeatureExtractor::reduce(&Window::default()),
        Err(FeatureError::EmptyWindow)
    );
}

#[test]
fn single_reading_has_zero_std() {
    let fv = FeatureExtractor::reduce(&window_of(&[[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]])).unwrap();
    for (i, ch) in Channel::ALL.iter().enumerate() {
        assert_eq!(fv.mean(*ch), (i + 1) as f64);
        assert_eq!(fv.std(*ch), 0.0);
    }
}

#[test]
fn uses_population_standard_deviation() {
    // accel_x = {2, 4, 4, 4, 5, 5, 7, 9}: mean 5, population std 2.
    let rows: Vec<[f64; 6]> = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]
        .iter()
        .map(|&x| [x, 0.0, 9.81, 0.0, 0.0, 1.0])
        .collect();
    let fv = FeatureExtractor::reduce(&window_of(&rows)).unwrap();
    assert_eq!(fv.get("accel_x_mean"), Some(5.0));
    assert_eq!(fv.get("accel_x_std"), Some(2.0));
    assert_eq!(fv.get("gyro_z_std"), Some(0.0));
}

#[test]
fn feature_order_is_mean_then_std_per_channel() {
    assert_eq!(FEATURE_NAMES[0], "accel_x_mean");
    assert_eq!(FEATURE_NAMES[1], "accel_x_std");
    assert_eq!(FEATURE_NAMES[FEATURE_COUNT - 1], "gyro_z_std");
}

proptest! {
    #[test]
    fn twelve_finite_features_for_any_window(
        rows in prop::collection::vec(prop::array::uniform6(-50.0f64..50.0), 1..80)
    ) {
        let fv = FeatureExtractor::reduce(&window_of(&rows)).unwrap();
        prop_assert_eq!(fv.len(), FEATURE_COUNT);
        prop_assert!(fv.values().iter().all(|v| v.is_finite()));
        for ch in Channel::ALL {
            prop_assert!(fv.std(ch) >= 0.0);
        }
    }

    #[test]
    fn reading_order_does_not_matter(
        rows in prop::collection::vec(prop::array::uniform6(-50.0f64..50.0), 1..60)
    ) {
        let forward = FeatureExtractor::reduce(&window_of(&rows)).unwrap();
        let mut reversed = rows.clone();
        reversed.reverse();
        let backward = FeatureExtractor::reduce(&window_of(&reversed)).unwrap();
        for (a, b) in forward.values().iter().zip(backward.values()) {
            prop_assert!((a - b).abs() <= 1e-9 * (1.0 + a.abs()));
        }
    }
}
