use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crossbeam_channel::RecvTimeoutError;
use turbine_traits::MotionSensor;
use turbine_traits::clock::Clock;

use crate::config::PollCfg;
use crate::hw_error::map_sensor_error;
use crate::monitor::{Monitor, MonitorStats};
use crate::sampler::Sampler;
use crate::types::Reading;
use crate::util::Timestamper;

/// How sensor polling is orchestrated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SamplingMode {
    /// Poll, process and sleep on the calling thread.
    #[default]
    Direct,
    /// Poll on a dedicated thread; the calling thread only processes.
    Sampler { capacity: usize },
}

#[derive(Debug, Clone, Copy)]
pub struct RunParams {
    pub poll_period: Duration,
    pub mode: SamplingMode,
    /// Stop after this many polls (successful or failed). `None` runs until
    /// the shutdown flag is raised.
    pub max_polls: Option<u64>,
}

impl Default for RunParams {
    fn default() -> Self {
        Self {
            poll_period: PollCfg::default().period,
            mode: SamplingMode::Direct,
            max_polls: None,
        }
    }
}

impl From<&PollCfg> for RunParams {
    fn from(p: &PollCfg) -> Self {
        Self {
            poll_period: p.period,
            ..Self::default()
        }
    }
}

/// Floor for the sampler-mode receive timeout.
const MIN_RECV_WAIT: Duration = Duration::from_millis(50);

/// Drive `monitor` from `sensor` until `shutdown` is raised or `max_polls`
/// is reached, then process the partial window and return the final counters.
pub fn run<S, C>(
    sensor: S,
    monitor: &mut Monitor,
    clock: C,
    shutdown: &AtomicBool,
    params: RunParams,
) -> MonitorStats
where
    S: MotionSensor + Send + 'static,
    C: Clock + Clone + Send + Sync + 'static,
{
    tracing::info!(
        mode = ?params.mode,
        poll_ms = params.poll_period.as_millis() as u64,
        max_polls = ?params.max_polls,
        "monitoring started"
    );
    match params.mode {
        SamplingMode::Direct => run_direct(sensor, monitor, &clock, shutdown, params),
        SamplingMode::Sampler { capacity } => {
            run_with_sampler(sensor, monitor, clock.clone(), shutdown, params, capacity);
        }
    }
    if shutdown.load(Ordering::Relaxed) {
        tracing::info!("shutdown requested");
    }
    monitor.shutdown(clock.now());
    *monitor.stats()
}

#[inline]
fn keep_going(shutdown: &AtomicBool, polls: u64, max_polls: Option<u64>) -> bool {
    !shutdown.load(Ordering::Relaxed) && max_polls.is_none_or(|m| polls < m)
}

fn run_direct<S: MotionSensor, C: Clock>(
    mut sensor: S,
    monitor: &mut Monitor,
    clock: &C,
    shutdown: &AtomicBool,
    params: RunParams,
) {
    let stamper = Timestamper::new(clock);
    let mut polls = 0u64;
    while keep_going(shutdown, polls, params.max_polls) {
        let polled_at = clock.now();
        let reading = sensor
            .read()
            .map_err(|e| map_sensor_error(&*e))
            .and_then(|s| Reading::from_sample(s, stamper.stamp(polled_at)));
        match reading {
            Ok(r) => {
                monitor.ingest(r, clock.now());
            }
            Err(e) => monitor.record_sensor_error(&e),
        }
        polls += 1;

        let spent = clock.now().saturating_duration_since(polled_at);
        clock.sleep(params.poll_period.saturating_sub(spent));
    }
}

fn run_with_sampler<S, C>(
    sensor: S,
    monitor: &mut Monitor,
    clock: C,
    shutdown: &AtomicBool,
    params: RunParams,
    capacity: usize,
) where
    S: MotionSensor + Send + 'static,
    C: Clock + Clone + Send + Sync + 'static,
{
    let stamper = Timestamper::new(&clock);
    let sampler = Sampler::spawn(sensor, params.poll_period, capacity, clock.clone(), stamper);
    let wait = params.poll_period.saturating_mul(2).max(MIN_RECV_WAIT);
    let mut polls = 0u64;
    while keep_going(shutdown, polls, params.max_polls) {
        match sampler.recv_timeout(wait) {
            Ok(Ok(r)) => {
                monitor.ingest(r, clock.now());
                polls += 1;
            }
            Ok(Err(e)) => {
                monitor.record_sensor_error(&e);
                polls += 1;
            }
            Err(RecvTimeoutError::Timeout) => {
                tracing::debug!(
                    stalled_ms = sampler.stalled_for(clock.ms_since(sampler.epoch())),
                    "no sample within wait window"
                );
            }
            Err(RecvTimeoutError::Disconnected) => {
                tracing::error!("sampler thread ended unexpectedly");
                break;
            }
        }
    }
    if sampler.dropped() > 0 {
        tracing::warn!(dropped = sampler.dropped(), "samples dropped while pipeline was busy");
    }
}
