use thiserror::Error;

#[derive(Debug, Error)]
pub enum HwError {
    #[error("i2c error: {0}")]
    I2c(String),
    #[error("imu not responding (who_am_i = {0:#04x})")]
    NotResponding(u8),
    #[error("imu sample contains non-finite value")]
    InvalidSample,
    #[error("simulated sensor fault")]
    Simulated,
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, HwError>;
