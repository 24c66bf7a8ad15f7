//! Capability contracts shared across the monitor stack.
//!
//! Everything the pipeline talks to that is not pure computation (the IMU,
//! the display, the alert transport, time) is reached through one of these
//! traits so the core stays hardware-agnostic.
pub mod clock;

pub use clock::{Clock, MonotonicClock};

/// One raw sample from a six-axis IMU.
///
/// Acceleration is in m/s², angular rate in rad/s, temperature in °C.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImuSample {
    pub accel: [f64; 3],
    pub gyro: [f64; 3],
    pub temperature_c: f64,
}

pub trait MotionSensor {
    fn read(&mut self) -> Result<ImuSample, Box<dyn std::error::Error + Send + Sync>>;
}

/// Fire-and-forget alert delivery (SMS gateway, pager, ...).
///
/// Rate limiting happens upstream; implementations send every message they get.
pub trait AlertTransport {
    fn send(
        &mut self,
        destination: &str,
        message: &str,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

/// Small character display attached to the monitor.
pub trait StatusDisplay {
    fn show(&mut self, lines: &[String]) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

impl<T: MotionSensor + ?Sized> MotionSensor for Box<T> {
    fn read(&mut self) -> Result<ImuSample, Box<dyn std::error::Error + Send + Sync>> {
        (**self).read()
    }
}

impl<T: AlertTransport + ?Sized> AlertTransport for Box<T> {
    fn send(
        &mut self,
        destination: &str,
        message: &str,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        (**self).send(destination, message)
    }
}

impl<T: StatusDisplay + ?Sized> StatusDisplay for Box<T> {
    fn show(&mut self, lines: &[String]) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        (**self).show(lines)
    }
}
