//! Reduction of a window to its per-channel mean and standard deviation.

use crate::error::FeatureError;
use crate::types::{CHANNEL_COUNT, Channel, FEATURE_COUNT, FEATURE_NAMES, FeatureVector, Window};

/// Stateless window reducer.
#[derive(Debug, Default, Clone, Copy)]
pub struct FeatureExtractor;

impl FeatureExtractor {
    /// Mean and population standard deviation (divide by N) of every channel,
    /// in `FEATURE_NAMES` order.
    pub fn reduce(window: &Window) -> Result<FeatureVector, FeatureError> {
        let readings = window.readings();
        if readings.is_empty() {
            return Err(FeatureError::EmptyWindow);
        }
        let n = readings.len() as f64;

        let mut out = [0.0f64; FEATURE_COUNT];
        for (i, ch) in Channel::ALL.iter().copied().enumerate() {
            // Two passes: mean first, then squared deviations around it.
            let mean = readings.iter().map(|r| r.channel(ch)).sum::<f64>() / n;
            let var = readings
                .iter()
                .map(|r| {
                    let d = r.channel(ch) - mean;
                    d * d
                })
                .sum::<f64>()
                / n;
            out[2 * i] = mean;
            out[2 * i + 1] = var.sqrt();
        }
        debug_assert_eq!(out.len(), 2 * CHANNEL_COUNT);

        if let Some(idx) = out.iter().position(|v| !v.is_finite()) {
            return Err(FeatureError::NonFinite {
                feature: FEATURE_NAMES[idx],
            });
        }
        FeatureVector::new(out).ok_or(FeatureError::NonFinite { feature: "vector" })
    }
}
