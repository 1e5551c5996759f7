//! MPU6050 accelerometer
//!
//! Only the accelerometer is used, at the ±2 g range (16384 LSB/g).

use embedded_hal::i2c::I2c;

use vigia_core::traits::{Acceleration, Sensor, SensorError};

/// Address with AD0 low
pub const MPU6050_ADDR: u8 = 0x68;

mod reg {
    pub const ACCEL_CONFIG: u8 = 0x1C;
    pub const ACCEL_XOUT_H: u8 = 0x3B;
    pub const PWR_MGMT_1: u8 = 0x6B;
    pub const WHO_AM_I: u8 = 0x75;
}

/// ±2 g full scale
const LSB_PER_G: f32 = 16384.0;

/// MPU6050 driver
#[derive(Debug)]
pub struct Mpu6050 {
    address: u8,
}

impl Mpu6050 {
    pub const fn new() -> Self {
        Self {
            address: MPU6050_ADDR,
        }
    }

    /// Check identity, wake the device and select the ±2 g range
    pub fn init<I: I2c>(&mut self, bus: &mut I) -> Result<(), SensorError> {
        let mut id = [0u8; 1];
        bus.write_read(self.address, &[reg::WHO_AM_I], &mut id)
            .map_err(|_| SensorError::Bus)?;
        if id[0] & 0x7E != MPU6050_ADDR {
            return Err(SensorError::InvalidDevice);
        }

        bus.write(self.address, &[reg::PWR_MGMT_1, 0x00])
            .map_err(|_| SensorError::Bus)?;
        bus.write(self.address, &[reg::ACCEL_CONFIG, 0x00])
            .map_err(|_| SensorError::Bus)
    }
}

impl Default for Mpu6050 {
    fn default() -> Self {
        Self::new()
    }
}

fn decode(raw: &[u8; 6]) -> Acceleration {
    let axis = |i: usize| i16::from_be_bytes([raw[i], raw[i + 1]]) as f32 / LSB_PER_G;
    Acceleration::new(axis(0), axis(2), axis(4))
}

impl<I: I2c> Sensor<I> for Mpu6050 {
    type Reading = Acceleration;

    fn read(&mut self, bus: &mut I) -> Result<Acceleration, SensorError> {
        let mut raw = [0u8; 6];
        bus.write_read(self.address, &[reg::ACCEL_XOUT_H], &mut raw)
            .map_err(|_| SensorError::Bus)?;
        Ok(decode(&raw))
    }
}
