//! Time-bounded accumulation of readings.
//!
//! A window opens at the timestamp of its first reading and covers
//! `[start, start + window_size)`. The first reading at least `window_size`
//! after `start` closes it: the readings collected so far are handed off and
//! the closing reading's timestamp becomes the next start. The closing
//! reading is a member of neither window.

use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::error::ConfigError;
use crate::types::{Reading, Window, elapsed_between};

/// Outcome of feeding one reading to the buffer.
#[derive(Debug, Clone, PartialEq)]
pub enum WindowResult {
    Open,
    Closed(Window),
}

#[derive(Debug)]
pub struct WindowBuffer {
    window_size: Duration,
    start: Option<DateTime<Utc>>,
    readings: Vec<Reading>,
    flushed: bool,
}

impl WindowBuffer {
    pub fn new(window_size: Duration) -> Result<Self, ConfigError> {
        if window_size.is_zero() {
            return Err(ConfigError::NonPositiveWindow);
        }
        Ok(Self {
            window_size,
            start: None,
            readings: Vec::new(),
            flushed: false,
        })
    }

    /// Construct from a duration in seconds; rejects `<= 0`, NaN and infinity.
    pub fn from_secs_f64(secs: f64) -> Result<Self, ConfigError> {
        if !secs.is_finite() || secs <= 0.0 {
            return Err(ConfigError::NonPositiveWindow);
        }
        Self::new(crate::util::secs_to_duration(secs))
    }

    pub fn window_size(&self) -> Duration {
        self.window_size
    }

    /// Start of the open window, if one has begun.
    pub fn window_start(&self) -> Option<DateTime<Utc>> {
        self.start
    }

    /// Readings collected in the open window.
    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    pub fn accumulate(&mut self, reading: Reading) -> WindowResult {
        let ts = reading.timestamp;
        self.flushed = false;
        let Some(start) = self.start else {
            self.start = Some(ts);
            self.readings.push(reading);
            return WindowResult::Open;
        };

        if elapsed_between(start, ts) < self.window_size {
            self.readings.push(reading);
            return WindowResult::Open;
        }

        let readings = std::mem::take(&mut self.readings);
        tracing::debug!(
            readings = readings.len(),
            start = %start,
            end = %ts,
            "window closed"
        );
        self.start = Some(ts);
        WindowResult::Closed(Window::new(start, readings))
    }

    /// Hand off the partial window at shutdown.
    ///
    /// Returns `Some` (possibly empty) on the first call and `None` on repeated
    /// calls until new readings arrive. The next reading opens a fresh window.
    pub fn flush(&mut self) -> Option<Window> {
        if self.flushed {
            return None;
        }
        self.flushed = true;
        let readings = std::mem::take(&mut self.readings);
        let start = self.start.take();
        tracing::debug!(readings = readings.len(), "window flushed");
        Some(Window { start, readings })
    }
}
