pub mod error;
#[cfg(all(feature = "hardware", target_os = "linux"))]
pub mod mpu6050;
pub mod util;

use turbine_traits::{AlertTransport, ImuSample, MotionSensor, StatusDisplay};

use crate::error::HwError;

/// Rotation period of the monitored turbine in seconds.
pub const ROTATION_PERIOD_S: f64 = 6.6;

/// Simulated IMU strapped to a turbine nacelle.
///
/// Produces gravity on Z plus a once-per-revolution sinusoid on X/Y and a
/// little deterministic noise. `fault_amplitude` adds an out-of-envelope
/// oscillation at three times the rotation frequency; `fail_every` makes every
/// n-th read fail.
pub struct SimulatedImu {
    sample_period_s: f64,
    n: u64,
    noise_state: u32,
    fault_amplitude: f64,
    fail_every: Option<u64>,
}

impl SimulatedImu {
    pub fn new(sample_period_s: f64) -> Self {
        Self {
            sample_period_s,
            n: 0,
            noise_state: 0x9E37_79B9,
            fault_amplitude: 0.0,
            fail_every: None,
        }
    }

    pub fn with_fault(mut self, amplitude: f64) -> Self {
        self.fault_amplitude = amplitude;
        self
    }

    pub fn with_fail_every(mut self, n: u64) -> Self {
        self.fail_every = (n > 0).then_some(n);
        self
    }

    fn next_noise(&mut self) -> f64 {
        // xorshift32
        let mut x = self.noise_state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.noise_state = x;
        (f64::from(x) / (f64::from(u32::MAX) + 1.0)) * 2.0 - 1.0
    }
}

impl MotionSensor for SimulatedImu {
    fn read(&mut self) -> Result<ImuSample, Box<dyn std::error::Error + Send + Sync>> {
        self.n = self.n.saturating_add(1);
        if let Some(every) = self.fail_every
            && self.n % every == 0
        {
            return Err(Box::new(HwError::Simulated));
        }

        let t = self.n as f64 * self.sample_period_s;
        let phase = std::f64::consts::TAU * t / ROTATION_PERIOD_S;
        let fault = self.fault_amplitude * (3.0 * phase).sin();
        let sample = ImuSample {
            accel: [
                0.3 * phase.sin() + fault + 0.02 * self.next_noise(),
                0.3 * phase.cos() + 0.02 * self.next_noise(),
                util::STANDARD_GRAVITY + 0.5 * fault + 0.02 * self.next_noise(),
            ],
            gyro: [
                0.01 * self.next_noise(),
                0.01 * self.next_noise(),
                std::f64::consts::TAU / ROTATION_PERIOD_S * 0.05 + 0.1 * fault,
            ],
            temperature_c: 21.5 + 0.1 * self.next_noise(),
        };
        Ok(sample)
    }
}

/// Alert transport that only records the message in the log.
#[derive(Debug, Default)]
pub struct LogTransport {
    sent: usize,
}

impl LogTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> usize {
        self.sent
    }
}

impl AlertTransport for LogTransport {
    fn send(
        &mut self,
        destination: &str,
        message: &str,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.sent += 1;
        tracing::warn!(destination, message, "alert dispatched (log transport)");
        Ok(())
    }
}

/// Character display emulation: clips each line to the panel geometry
/// and writes it to the log.
#[derive(Debug)]
pub struct LogDisplay {
    cols: usize,
    rows: usize,
    last: Vec<String>,
}

impl LogDisplay {
    /// 16x2 panel, the common HD44780 + PCF8574 backpack.
    pub fn new() -> Self {
        Self::with_geometry(16, 2)
    }

    pub fn with_geometry(cols: usize, rows: usize) -> Self {
        Self {
            cols: cols.max(1),
            rows: rows.max(1),
            last: Vec::new(),
        }
    }

    /// Lines currently on the panel.
    pub fn contents(&self) -> &[String] {
        &self.last
    }
}

impl Default for LogDisplay {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusDisplay for LogDisplay {
    fn show(&mut self, lines: &[String]) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.last = lines
            .iter()
            .take(self.rows)
            .map(|l| l.chars().take(self.cols).collect())
            .collect();
        tracing::debug!(lines = ?self.last, "display");
        Ok(())
    }
}

#[cfg(all(feature = "hardware", target_os = "linux"))]
pub use hardware::HardwareImu;

#[cfg(all(feature = "hardware", target_os = "linux"))]
pub mod hardware {
    use super::*;
    use crate::mpu6050::Mpu6050;

    /// MPU-6050 on the Raspberry Pi I2C bus.
    pub struct HardwareImu {
        dev: Mpu6050,
    }

    impl HardwareImu {
        pub fn try_new(bus: u8, address: u16) -> crate::error::Result<Self> {
            let dev = Mpu6050::new(bus, address)?;
            tracing::info!(bus, address, "mpu6050 ready");
            Ok(Self { dev })
        }
    }

    impl MotionSensor for HardwareImu {
        fn read(&mut self) -> Result<ImuSample, Box<dyn std::error::Error + Send + Sync>> {
            match self.dev.read_sample() {
                Ok((accel, gyro, temperature_c)) => Ok(ImuSample {
                    accel,
                    gyro,
                    temperature_c,
                }),
                Err(e) => {
                    tracing::error!("IMU read error: {}", e);
                    Err(Box::new(e))
                }
            }
        }
    }
}
