use std::time::Duration;

use chrono::{TimeDelta, TimeZone, Utc};
use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use turbine_core::artifact::{DecisionModel, StandardScaler};
use turbine_core::dataset::extract_features;
use turbine_core::{
    FEATURE_COUNT, FeatureExtractor, ModelArtifact, Reading, ScalerArtifact, ScoringEngine, Window,
};

// One rotation of synthetic vibration at 5 Hz with xorshift noise
fn synth_readings(n: usize, seed: u32) -> Vec<Reading> {
    let mut state = seed.max(1);
    let mut noise = || {
        let mut x = state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        state = x;
        f64::from(x) / (f64::from(u32::MAX) + 1.0) - 0.5
    };
    let t0 = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
    (0..n)
        .map(|i| {
            let phase = i as f64 * 0.2 * std::f64::consts::TAU / 6.6;
            Reading {
                timestamp: t0 + TimeDelta::milliseconds(200 * i as i64),
                accel_x: 0.3 * phase.sin() + 0.05 * noise(),
                accel_y: 0.3 * phase.cos() + 0.05 * noise(),
                accel_z: 9.81 + 0.05 * noise(),
                gyro_x: 0.01 * noise(),
                gyro_y: 0.01 * noise(),
                gyro_z: 0.95 + 0.01 * noise(),
                temperature: 20.0,
            }
        })
        .collect()
}

fn rbf_engine(support: usize) -> ScoringEngine {
    let support_vectors: Vec<Vec<f64>> = (0..support)
        .map(|i| vec![i as f64 / support as f64; FEATURE_COUNT])
        .collect();
    let model = DecisionModel::RbfOneClass {
        gamma: 0.08,
        dual_coef: vec![1.0 / support as f64; support],
        support_vectors,
        intercept: -0.2,
    };
    let scaler = StandardScaler {
        mean: vec![0.1; FEATURE_COUNT],
        scale: vec![0.5; FEATURE_COUNT],
    };
    ScoringEngine::from_parts(
        Some(ModelArtifact::bare(model)),
        ScalerArtifact::bare(scaler).ok(),
    )
}

pub fn bench_reduce_score(c: &mut Criterion) {
    let mut g = c.benchmark_group("window_pipeline");
    //   BENCH_SAMPLE_SIZE=10 BENCH_MEAS_MS=50 cargo bench -p turbine_core --bench pipeline
    if let Ok(ss) = std::env::var("BENCH_SAMPLE_SIZE") {
        if let Ok(n) = ss.parse::<usize>() {
            g.sample_size(n.max(1));
        }
    } else {
        g.sample_size(50);
    }
    if let Ok(ms) = std::env::var("BENCH_MEAS_MS")
        && let Ok(ms_u64) = ms.parse::<u64>()
    {
        g.measurement_time(Duration::from_millis(ms_u64));
    }

    let readings = synth_readings(34, 0xC0FFEE);
    let window = Window::new(readings[0].timestamp, readings.clone());
    g.bench_function("reduce_rotation", |b| {
        b.iter(|| black_box(FeatureExtractor::reduce(black_box(&window))))
    });

    let features = FeatureExtractor::reduce(&window).unwrap();
    for &support in &[16usize, 128, 512] {
        let engine = rbf_engine(support);
        g.bench_function(format!("score_rbf_{support}"), |b| {
            b.iter(|| black_box(engine.score(black_box(&features))))
        });
    }

    let hour = synth_readings(5 * 60 * 60, 7);
    g.bench_function("extract_one_hour", |b| {
        b.iter_batched(
            || hour.clone(),
            |r| black_box(extract_features(&r, Duration::from_millis(6600))),
            BatchSize::LargeInput,
        )
    });
    g.finish();
}

criterion_group!(pipeline, bench_reduce_score);
criterion_main!(pipeline);
