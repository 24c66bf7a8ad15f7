//! The per-reading pipeline: log, display, window, reduce, score, alert.
//!
//! `Monitor` owns every piece of mutable pipeline state. It is driven by the
//! runner (or directly by tests) one reading at a time and never blocks.

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use eyre::WrapErr;
use turbine_traits::{AlertTransport, StatusDisplay};

use crate::alert::{AlertDecision, AlertPolicy};
use crate::config::{AlertCfg, ModelPaths, WindowCfg};
use crate::datalog::{CsvDataLog, ReadingSink};
use crate::error::{ConfigError, FeatureError, MonitorError, SensorError};
use crate::features::FeatureExtractor;
use crate::hw_error::map_transport_error;
use crate::scoring::ScoringEngine;
use crate::types::{Reading, ScoredSample, Window};
use crate::window::{WindowBuffer, WindowResult};

/// First display line while an alert is shown.
pub const ALERT_BANNER: &str = "ANOMALY DETECTED";

#[derive(Debug, Clone)]
pub struct MonitorSettings {
    /// Deliver alerts to the display and transport.
    pub alerts_enabled: bool,
    pub destination: String,
}

impl From<&AlertCfg> for MonitorSettings {
    fn from(c: &AlertCfg) -> Self {
        Self {
            alerts_enabled: c.enabled,
            destination: c.destination.clone(),
        }
    }
}

/// Running counters, reported at shutdown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MonitorStats {
    pub readings: u64,
    pub sensor_errors: u64,
    /// Windows reduced and scored.
    pub windows: u64,
    pub empty_windows: u64,
    pub alerts: u64,
    pub suppressed: u64,
    pub transport_failures: u64,
    pub log_failures: u64,
}

/// Outcome of one processed window.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowReport {
    pub start: Option<DateTime<Utc>>,
    pub readings: usize,
    pub sample: ScoredSample,
    pub decision: AlertDecision,
}

impl WindowReport {
    pub fn alerted(&self) -> bool {
        self.decision == AlertDecision::Emit
    }

    pub fn score(&self) -> f64 {
        self.sample.score
    }
}

pub struct Monitor {
    buffer: WindowBuffer,
    engine: ScoringEngine,
    policy: AlertPolicy,
    settings: MonitorSettings,
    sink: Option<Box<dyn ReadingSink>>,
    transport: Option<Box<dyn AlertTransport>>,
    display: Option<Box<dyn StatusDisplay>>,
    stats: MonitorStats,
}

impl std::fmt::Debug for Monitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Monitor")
            .field("buffer", &self.buffer)
            .field("engine", &self.engine)
            .field("policy", &self.policy)
            .field("settings", &self.settings)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

impl Monitor {
    pub fn new(
        window: &WindowCfg,
        alerts: &AlertCfg,
        engine: ScoringEngine,
    ) -> Result<Self, MonitorError> {
        if !alerts.threshold.is_finite() {
            return Err(ConfigError::Invalid(format!(
                "alert threshold must be finite, got {}",
                alerts.threshold
            ))
            .into());
        }
        let buffer = WindowBuffer::new(window.size)?;
        let engine = engine.with_sensitivity(alerts.sensitivity)?;
        let policy = AlertPolicy::new(alerts.threshold, alerts.cooldown);
        tracing::info!(
            window_s = window.size.as_secs_f64(),
            threshold = alerts.threshold,
            cooldown_s = alerts.cooldown.as_secs_f64(),
            sensitivity = alerts.sensitivity,
            alerts_enabled = alerts.enabled,
            model = engine.has_model(),
            scaler = engine.has_scaler(),
            "monitor ready"
        );
        Ok(Self {
            buffer,
            engine,
            policy,
            settings: MonitorSettings::from(alerts),
            sink: None,
            transport: None,
            display: None,
            stats: MonitorStats::default(),
        })
    }

    /// Assemble a monitor from the file configuration: artifacts, pipeline
    /// stages and, when enabled, the raw-data log. Display and transport are
    /// attached by the caller.
    pub fn from_config(cfg: &turbine_config::Config) -> crate::error::Result<Self> {
        let window = WindowCfg::from(&cfg.window);
        let alerts = AlertCfg::from(&cfg.alerts);
        let paths = ModelPaths::from(&cfg.model);
        let engine = ScoringEngine::load(&paths.model, paths.scaler.as_deref());
        let monitor = Self::new(&window, &alerts, engine).wrap_err("invalid monitor configuration")?;
        if !cfg.datalog.enabled {
            tracing::info!("raw data log disabled");
            return Ok(monitor);
        }
        let log = CsvDataLog::open(&cfg.datalog.path)
            .wrap_err_with(|| format!("open data log {:?}", cfg.datalog.path))?;
        Ok(monitor.with_sink(log))
    }

    pub fn with_sink(mut self, sink: impl ReadingSink + 'static) -> Self {
        self.sink = Some(Box::new(sink));
        self
    }

    pub fn with_transport(mut self, transport: impl AlertTransport + 'static) -> Self {
        self.transport = Some(Box::new(transport));
        self
    }

    pub fn with_display(mut self, display: impl StatusDisplay + 'static) -> Self {
        self.display = Some(Box::new(display));
        self
    }

    pub fn stats(&self) -> &MonitorStats {
        &self.stats
    }

    pub fn engine(&self) -> &ScoringEngine {
        &self.engine
    }

    pub fn policy(&self) -> &AlertPolicy {
        &self.policy
    }

    pub fn settings(&self) -> &MonitorSettings {
        &self.settings
    }

    pub fn buffer(&self) -> &WindowBuffer {
        &self.buffer
    }

    /// Change the alert cooldown while running; applies from the next window.
    pub fn set_alert_cooldown(&mut self, cooldown: Duration) {
        tracing::info!(cooldown_s = cooldown.as_secs_f64(), "alert cooldown changed");
        self.policy.set_cooldown(cooldown);
    }

    /// Feed one accepted reading. Returns a report when it closed a window
    /// that could be scored.
    pub fn ingest(&mut self, reading: Reading, now: Instant) -> Option<WindowReport> {
        self.stats.readings += 1;
        if let Some(sink) = self.sink.as_mut()
            && let Err(e) = sink.record(&reading)
        {
            self.stats.log_failures += 1;
            tracing::warn!(error = %e, "failed to log reading");
        }
        self.show(&reading_lines(&reading));
        tracing::trace!(
            accel_x = reading.accel_x,
            accel_y = reading.accel_y,
            accel_z = reading.accel_z,
            gyro_x = reading.gyro_x,
            gyro_y = reading.gyro_y,
            gyro_z = reading.gyro_z,
            "reading"
        );

        match self.buffer.accumulate(reading) {
            WindowResult::Open => None,
            WindowResult::Closed(window) => self.process_window(&window, now),
        }
    }

    /// A failed poll: counted and logged, window state untouched.
    pub fn record_sensor_error(&mut self, err: &SensorError) {
        self.stats.sensor_errors += 1;
        tracing::warn!(error = %err, "sensor read failed; skipping poll");
    }

    /// Reduce, score and gate one window.
    pub fn process_window(&mut self, window: &Window, now: Instant) -> Option<WindowReport> {
        let features = match FeatureExtractor::reduce(window) {
            Ok(f) => f,
            Err(FeatureError::EmptyWindow) => {
                self.stats.empty_windows += 1;
                tracing::info!("empty window; nothing to score");
                return None;
            }
            Err(e) => {
                tracing::warn!(error = %e, readings = window.len(), "window discarded");
                return None;
            }
        };
        self.stats.windows += 1;

        let score = self.engine.score(&features);
        let decision = self.policy.decide(score, now);
        tracing::info!(score, readings = window.len(), ?decision, "window scored");

        match decision {
            AlertDecision::Emit => {
                self.stats.alerts += 1;
                self.dispatch_alert(score, window.readings().last());
            }
            AlertDecision::Suppressed { .. } => self.stats.suppressed += 1,
            AlertDecision::Normal => {}
        }

        Some(WindowReport {
            start: window.start(),
            readings: window.len(),
            sample: ScoredSample { features, score },
            decision,
        })
    }

    /// Flush and process the partial window. Safe to call repeatedly; the
    /// buffered readings are processed exactly once.
    pub fn shutdown(&mut self, now: Instant) -> Option<WindowReport> {
        let window = self.buffer.flush()?;
        tracing::info!(readings = window.len(), "processing final partial window");
        let report = self.process_window(&window, now);
        tracing::info!(stats = ?self.stats, "monitor stopped");
        report
    }

    fn dispatch_alert(&mut self, score: f64, last: Option<&Reading>) {
        let message = format_alert(score, last);
        if !self.settings.alerts_enabled {
            tracing::warn!(score, "anomaly detected (alert delivery disabled)");
            return;
        }
        tracing::warn!(score, destination = %self.settings.destination, "anomaly detected; sending alert");
        self.show(&[ALERT_BANNER.to_string(), format!("Score: {score:.2}")]);
        if let Some(transport) = self.transport.as_mut()
            && let Err(e) = transport.send(&self.settings.destination, &message)
        {
            self.stats.transport_failures += 1;
            let err = map_transport_error(&*e);
            tracing::error!(error = %err, "alert delivery failed");
        }
    }

    fn show(&mut self, lines: &[String]) {
        if let Some(display) = self.display.as_mut()
            && let Err(e) = display.show(lines)
        {
            tracing::debug!(error = %e, "display update failed");
        }
    }
}

/// Alert text: score plus the most recent acceleration and angular rate.
pub fn format_alert(score: f64, last: Option<&Reading>) -> String {
    let mut msg = format!("ALERT: wind turbine anomaly detected\nScore: {score:.2}");
    if let Some(r) = last {
        msg.push_str(&format!(
            "\nAccel: X={:.2}, Y={:.2}, Z={:.2}\nGyro: X={:.2}, Y={:.2}, Z={:.2}",
            r.accel_x, r.accel_y, r.accel_z, r.gyro_x, r.gyro_y, r.gyro_z
        ));
    }
    msg
}

fn reading_lines(r: &Reading) -> [String; 2] {
    [
        format!("A:{:.1},{:.1},{:.1}", r.accel_x, r.accel_y, r.accel_z),
        format!("G:{:.1},{:.1},{:.1}", r.gyro_x, r.gyro_y, r.gyro_z),
    ]
}
