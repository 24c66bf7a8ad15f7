//! Common time helpers for turbine_core.

use std::time::{Duration, Instant};

use chrono::{DateTime, TimeDelta, Utc};
use turbine_traits::Clock;

/// Number of nanoseconds in one second.
pub const NANOS_PER_SEC: f64 = 1_000_000_000.0;

/// Convert seconds to a `Duration`, rounding to the nearest nanosecond.
/// Negative and NaN inputs map to zero; +inf saturates.
#[inline]
pub fn secs_to_duration(secs: f64) -> Duration {
    if secs.is_nan() || secs <= 0.0 {
        return Duration::ZERO;
    }
    let nanos = (secs * NANOS_PER_SEC).round();
    if nanos >= u64::MAX as f64 {
        Duration::from_nanos(u64::MAX)
    } else {
        Duration::from_nanos(nanos as u64)
    }
}

/// Maps monotonic instants to wall-clock timestamps.
///
/// Anchored once; later stamps are `wall_epoch + (instant - mono_epoch)` so
/// reading timestamps never go backwards when the system clock is adjusted.
#[derive(Debug, Clone, Copy)]
pub struct Timestamper {
    wall_epoch: DateTime<Utc>,
    mono_epoch: Instant,
}

impl Timestamper {
    pub fn new(clock: &impl Clock) -> Self {
        Self::anchored(Utc::now(), clock.now())
    }

    pub fn anchored(wall_epoch: DateTime<Utc>, mono_epoch: Instant) -> Self {
        Self {
            wall_epoch,
            mono_epoch,
        }
    }

    pub fn stamp(&self, at: Instant) -> DateTime<Utc> {
        let offset = TimeDelta::from_std(at.saturating_duration_since(self.mono_epoch))
            .unwrap_or(TimeDelta::zero());
        self.wall_epoch
            .checked_add_signed(offset)
            .unwrap_or(self.wall_epoch)
    }
}
