//! Background sensor polling.
//!
//! A `Sampler` owns the sensor on a dedicated thread and hands timestamped
//! readings (or typed read failures) to the pipeline over a bounded channel.
//! When the pipeline falls behind, the oldest queued item is discarded so
//! the channel always holds the most recent data.
//!
//! Each `Sampler` spawns exactly one thread, which is stopped and joined
//! when the `Sampler` is dropped.
use crossbeam_channel as xch;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};
use turbine_traits::MotionSensor;
use turbine_traits::clock::Clock;

use crate::error::SensorError;
use crate::hw_error::map_sensor_error;
use crate::types::Reading;
use crate::util::Timestamper;

/// One poll outcome as delivered to the pipeline.
pub type SampleResult = Result<Reading, SensorError>;

pub struct Sampler {
    rx: xch::Receiver<SampleResult>,
    last_ok: Arc<AtomicU64>,
    dropped: Arc<AtomicU64>,
    epoch: Instant,
    shutdown: Arc<AtomicBool>,
    join_handle: Option<std::thread::JoinHandle<()>>,
}

impl Sampler {
    pub fn spawn<S, C>(
        mut sensor: S,
        period: Duration,
        capacity: usize,
        clock: C,
        stamper: Timestamper,
    ) -> Self
    where
        S: MotionSensor + Send + 'static,
        C: Clock + Send + Sync + 'static,
    {
        let (tx, rx) = xch::bounded(capacity.max(1));
        // The thread keeps a receiver handle to evict the oldest item.
        let evict = rx.clone();
        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_clone = shutdown.clone();
        let last_ok = Arc::new(AtomicU64::new(0));
        let last_ok_clone = last_ok.clone();
        let dropped = Arc::new(AtomicU64::new(0));
        let dropped_clone = dropped.clone();
        let epoch = clock.now();

        let join_handle = std::thread::spawn(move || {
            loop {
                if shutdown_clone.load(Ordering::Relaxed) {
                    tracing::debug!("sampler thread received shutdown signal");
                    break;
                }

                let polled_at = clock.now();
                let item = match sensor.read() {
                    Ok(sample) => Reading::from_sample(sample, stamper.stamp(polled_at)),
                    Err(e) => Err(map_sensor_error(&*e)),
                };
                if item.is_ok() {
                    last_ok_clone.store(clock.ms_since(epoch), Ordering::Relaxed);
                }
                if !push_latest(&tx, &evict, item, &dropped_clone) {
                    tracing::debug!("sampler consumer disconnected, exiting thread");
                    break;
                }

                if shutdown_clone.load(Ordering::Relaxed) {
                    break;
                }
                let spent = clock.now().saturating_duration_since(polled_at);
                clock.sleep(period.saturating_sub(spent));
            }
            tracing::trace!("sampler thread exiting cleanly");
        });

        Self {
            rx,
            last_ok,
            dropped,
            epoch,
            shutdown,
            join_handle: Some(join_handle),
        }
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Result<SampleResult, xch::RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }

    pub fn try_recv(&self) -> Option<SampleResult> {
        self.rx.try_recv().ok()
    }

    /// Items discarded because the pipeline fell behind.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Milliseconds since the last successful read, measured against `now_ms`
    /// on the sampler's clock.
    pub fn stalled_for(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.last_ok.load(Ordering::Relaxed))
    }

    pub fn epoch(&self) -> Instant {
        self.epoch
    }
}

/// Send `item`, evicting the oldest queued entry while the channel is full.
/// Returns `false` once the channel is disconnected.
fn push_latest(
    tx: &xch::Sender<SampleResult>,
    evict: &xch::Receiver<SampleResult>,
    mut item: SampleResult,
    dropped: &AtomicU64,
) -> bool {
    loop {
        match tx.try_send(item) {
            Ok(()) => return true,
            Err(xch::TrySendError::Full(back)) => {
                if evict.try_recv().is_ok() {
                    let n = dropped.fetch_add(1, Ordering::Relaxed) + 1;
                    tracing::trace!(dropped = n, "pipeline behind; dropped oldest sample");
                }
                item = back;
            }
            Err(xch::TrySendError::Disconnected(_)) => return false,
        }
    }
}

impl Drop for Sampler {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);

        // The thread exits at its next flag check, at most one sensor read
        // plus one poll period from now.
        if let Some(handle) = self.join_handle.take() {
            match handle.join() {
                Ok(()) => {
                    tracing::trace!("sampler thread joined");
                }
                Err(e) => {
                    tracing::warn!(?e, "sampler thread panicked during shutdown");
                }
            }
        }
    }
}
