//! Threshold + cooldown gate for anomaly alerts.

use std::time::{Duration, Instant};

/// Lazily derived policy state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertState {
    Idle,
    Cooling { remaining: Duration },
}

/// Result of evaluating one score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertDecision {
    /// Score at or above threshold.
    Normal,
    /// Alert emitted; cooldown restarted.
    Emit,
    /// Anomalous, but inside the cooldown of the previous alert.
    Suppressed { remaining: Duration },
}

#[derive(Debug, Clone)]
pub struct AlertPolicy {
    threshold: f64,
    cooldown: Duration,
    last_alert: Option<Instant>,
}

impl AlertPolicy {
    pub fn new(threshold: f64, cooldown: Duration) -> Self {
        Self {
            threshold,
            cooldown,
            last_alert: None,
        }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    /// Change the cooldown for subsequent evaluations.
    pub fn set_cooldown(&mut self, cooldown: Duration) {
        tracing::info!(cooldown_s = cooldown.as_secs_f64(), "alert cooldown updated");
        self.cooldown = cooldown;
    }

    pub fn last_alert(&self) -> Option<Instant> {
        self.last_alert
    }

    pub fn state(&self, now: Instant) -> AlertState {
        match self.last_alert {
            Some(last) => {
                let elapsed = now.saturating_duration_since(last);
                if elapsed < self.cooldown {
                    AlertState::Cooling {
                        remaining: self.cooldown - elapsed,
                    }
                } else {
                    AlertState::Idle
                }
            }
            None => AlertState::Idle,
        }
    }

    /// `true` when an alert is emitted for this score.
    pub fn evaluate(&mut self, score: f64, now: Instant) -> bool {
        self.decide(score, now) == AlertDecision::Emit
    }

    pub fn decide(&mut self, score: f64, now: Instant) -> AlertDecision {
        // Strict comparison; NaN never qualifies.
        let anomalous = score < self.threshold;
        if !anomalous {
            return AlertDecision::Normal;
        }
        if let AlertState::Cooling { remaining } = self.state(now) {
            tracing::info!(
                score,
                remaining_s = remaining.as_secs_f64(),
                "alert suppressed during cooldown"
            );
            return AlertDecision::Suppressed { remaining };
        }
        // Keep the recorded instant non-decreasing.
        self.last_alert = Some(self.last_alert.map_or(now, |last| last.max(now)));
        AlertDecision::Emit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_to_threshold_does_not_trigger() {
        let mut p = AlertPolicy::new(-2.0, Duration::from_secs(10));
        assert!(!p.evaluate(-2.0, Instant::now()));
        assert!(p.last_alert().is_none());
    }

    #[test]
    fn nan_score_does_not_trigger() {
        let mut p = AlertPolicy::new(-2.0, Duration::from_secs(10));
        assert!(!p.evaluate(f64::NAN, Instant::now()));
    }

    #[test]
    fn state_goes_idle_after_cooldown() {
        let t0 = Instant::now();
        let mut p = AlertPolicy::new(0.0, Duration::from_secs(10));
        assert_eq!(p.state(t0), AlertState::Idle);
        assert!(p.evaluate(-1.0, t0));
        assert_eq!(
            p.state(t0 + Duration::from_secs(4)),
            AlertState::Cooling {
                remaining: Duration::from_secs(6)
            }
        );
        assert_eq!(p.state(t0 + Duration::from_secs(10)), AlertState::Idle);
    }

    #[test]
    fn zero_cooldown_never_suppresses() {
        let t0 = Instant::now();
        let mut p = AlertPolicy::new(0.0, Duration::ZERO);
        assert!(p.evaluate(-1.0, t0));
        assert!(p.evaluate(-1.0, t0));
    }
}
