//! Register decoding for MPU-6050 class IMUs.
//!
//! Pure functions so the conversion math is testable off-target.

/// Standard gravity in m/s².
pub const STANDARD_GRAVITY: f64 = 9.806_65;
/// Accelerometer sensitivity at ±2 g full scale (LSB per g).
pub const ACCEL_LSB_PER_G: f64 = 16_384.0;
/// Gyroscope sensitivity at ±250 °/s full scale (LSB per °/s).
pub const GYRO_LSB_PER_DPS: f64 = 131.0;

/// Length of the ACCEL_XOUT_H..GYRO_ZOUT_L burst read.
pub const BURST_LEN: usize = 14;

#[inline]
pub fn be_i16(hi: u8, lo: u8) -> i16 {
    i16::from_be_bytes([hi, lo])
}

/// Decode a 14-byte burst (accel xyz, temp, gyro xyz; big-endian words)
/// into SI units: m/s², rad/s and °C.
pub fn decode_burst(buf: &[u8; BURST_LEN]) -> ([f64; 3], [f64; 3], f64) {
    let word = |i: usize| f64::from(be_i16(buf[i], buf[i + 1]));
    let accel = [0, 2, 4].map(|i| word(i) / ACCEL_LSB_PER_G * STANDARD_GRAVITY);
    let temperature_c = word(6) / 340.0 + 36.53;
    let gyro = [8, 10, 12].map(|i| (word(i) / GYRO_LSB_PER_DPS).to_radians());
    (accel, gyro, temperature_c)
}
