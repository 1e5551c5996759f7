//! BH1750 ambient light sensor
//!
//! Runs in continuous high-resolution mode (1 lx resolution, 120 ms
//! conversion), so a read is a single 2-byte transfer.

use embedded_hal::i2c::I2c;

use vigia_core::traits::{Sensor, SensorError};

/// Address with the ADDR pin low
pub const BH1750_ADDR: u8 = 0x23;

const CMD_POWER_ON: u8 = 0x01;
const CMD_CONTINUOUS_HIGH_RES: u8 = 0x10;

/// Counts per lux in high-resolution mode
const COUNTS_PER_LUX: f32 = 1.2;

/// BH1750 driver
#[derive(Debug)]
pub struct Bh1750 {
    address: u8,
}

impl Bh1750 {
    pub const fn new() -> Self {
        Self::with_address(BH1750_ADDR)
    }

    /// Use the alternate address (0x5C, ADDR pin high)
    pub const fn with_address(address: u8) -> Self {
        Self { address }
    }

    /// Power on and start continuous measurement
    pub fn init<I: I2c>(&mut self, bus: &mut I) -> Result<(), SensorError> {
        bus.write(self.address, &[CMD_POWER_ON])
            .map_err(|_| SensorError::Bus)?;
        bus.write(self.address, &[CMD_CONTINUOUS_HIGH_RES])
            .map_err(|_| SensorError::Bus)
    }
}

impl Default for Bh1750 {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: I2c> Sensor<I> for Bh1750 {
    /// Illuminance in lux
    type Reading = f32;

    fn read(&mut self, bus: &mut I) -> Result<f32, SensorError> {
        let mut raw = [0u8; 2];
        bus.read(self.address, &mut raw)
            .map_err(|_| SensorError::Bus)?;
        Ok(u16::from_be_bytes(raw) as f32 / COUNTS_PER_LUX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockI2c;

    #[test]
    fn test_init_sequence() {
        let mut bus = MockI2c::new();
        Bh1750::new().init(&mut bus).unwrap();
        assert_eq!(
            bus.writes_to(BH1750_ADDR),
            vec![vec![CMD_POWER_ON], vec![CMD_CONTINUOUS_HIGH_RES]]
        );
    }

    #[test]
    fn test_read_converts_counts() {
        let mut bus = MockI2c::new();
        // 120 counts = 100 lx
        bus.respond(&[0x00, 0x78]);
        let lux = Bh1750::new().read(&mut bus).unwrap();
        assert!((lux - 100.0).abs() < 1e-3);
    }

    #[test]
    fn test_read_failure() {
        let mut bus = MockI2c::new();
        bus.fail = 1;
        assert_eq!(Bh1750::new().read(&mut bus), Err(SensorError::Bus));
    }

    #[test]
    fn test_alternate_address() {
        let mut bus = MockI2c::new();
        bus.respond(&[0x00, 0x0C]);
        let lux = Bh1750::with_address(0x5C).read(&mut bus).unwrap();
        assert!((lux - 10.0).abs() < 1e-3);
        assert_eq!(bus.reads, vec![(0x5C, 2)]);
    }
}
