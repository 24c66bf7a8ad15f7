//! Test and helper mocks for turbine_core

use turbine_traits::{AlertTransport, ImuSample, MotionSensor};

/// A sensor that always errors on read; useful for exercising the
/// sensor-error path and sampler lifecycle.
pub struct NoopSensor;

impl MotionSensor for NoopSensor {
    fn read(&mut self) -> Result<ImuSample, Box<dyn std::error::Error + Send + Sync>> {
        Err(Box::new(std::io::Error::other("noop sensor")))
    }
}

/// A sensor that returns the same sample on every poll.
#[derive(Debug, Clone, Copy)]
pub struct ConstantSensor(pub ImuSample);

impl MotionSensor for ConstantSensor {
    fn read(&mut self) -> Result<ImuSample, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self.0)
    }
}

/// Transport that always fails; alert state must not depend on delivery.
pub struct FailingTransport;

impl AlertTransport for FailingTransport {
    fn send(
        &mut self,
        _destination: &str,
        _message: &str,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        Err("gateway unreachable".into())
    }
}

/// Transport that remembers every message in a shared list.
#[derive(Debug, Clone, Default)]
pub struct RecordingTransport {
    pub sent: std::sync::Arc<std::sync::Mutex<Vec<(String, String)>>>,
}

impl AlertTransport for RecordingTransport {
    fn send(
        &mut self,
        destination: &str,
        message: &str,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.sent
            .lock()
            .map_err(|_| "poisoned")?
            .push((destination.to_string(), message.to_string()));
        Ok(())
    }
}
