//! Maps `Box<dyn Error>` from trait boundaries to typed `SensorError`.
//!
//! The traits in `turbine_traits` use `Box<dyn Error + Send + Sync>` for maximum
//! flexibility; this module converts those to our typed error enum, with an
//! optional feature-gated path for `turbine_hardware::HwError` downcasting.

use crate::error::{SensorError, TransportError};

/// Map a sensor capability error to a typed `SensorError`.
///
/// Attempts to downcast known hardware error types first, then falls back
/// to string-based heuristics.
pub fn map_sensor_error(e: &(dyn std::error::Error + 'static)) -> SensorError {
    #[cfg(feature = "hardware-errors")]
    {
        use turbine_hardware::error::HwError;
        if let Some(hw) = e.downcast_ref::<HwError>() {
            return match hw {
                HwError::InvalidSample => SensorError::NonFinite { field: "sample" },
                HwError::Simulated => SensorError::Read(hw.to_string()),
                other => SensorError::Fault(other.to_string()),
            };
        }
    }

    let s = e.to_string();
    if s.to_lowercase().contains("timeout") || s.to_lowercase().contains("timed out") {
        SensorError::Timeout
    } else {
        SensorError::Read(s)
    }
}

pub fn map_transport_error(e: &(dyn std::error::Error + 'static)) -> TransportError {
    TransportError(e.to_string())
}
