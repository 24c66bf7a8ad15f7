use rppal::i2c::I2c;
use tracing::trace;

use crate::error::{HwError, Result};
use crate::util::{BURST_LEN, decode_burst};

const REG_PWR_MGMT_1: u8 = 0x6B;
const REG_ACCEL_XOUT_H: u8 = 0x3B;
const REG_WHO_AM_I: u8 = 0x75;
const WHO_AM_I_EXPECTED: u8 = 0x68;

pub struct Mpu6050 {
    i2c: I2c,
}

impl Mpu6050 {
    /// Open the IMU on `bus` at `address` and take it out of sleep mode.
    pub fn new(bus: u8, address: u16) -> Result<Self> {
        let mut i2c = I2c::with_bus(bus).map_err(|e| HwError::I2c(e.to_string()))?;
        i2c.set_slave_address(address)
            .map_err(|e| HwError::I2c(e.to_string()))?;

        let who = i2c
            .smbus_read_byte(REG_WHO_AM_I)
            .map_err(|e| HwError::I2c(e.to_string()))?;
        if who != WHO_AM_I_EXPECTED {
            return Err(HwError::NotResponding(who));
        }
        // Clear SLEEP, internal 8 MHz oscillator, default ±2 g / ±250 °/s ranges.
        i2c.smbus_write_byte(REG_PWR_MGMT_1, 0x00)
            .map_err(|e| HwError::I2c(e.to_string()))?;
        Ok(Self { i2c })
    }

    pub fn read_sample(&mut self) -> Result<([f64; 3], [f64; 3], f64)> {
        let mut buf = [0u8; BURST_LEN];
        self.i2c
            .write_read(&[REG_ACCEL_XOUT_H], &mut buf)
            .map_err(|e| HwError::I2c(e.to_string()))?;
        trace!(?buf, "mpu6050 burst");
        Ok(decode_burst(&buf))
    }
}
