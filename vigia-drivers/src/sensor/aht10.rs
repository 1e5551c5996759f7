//! AHT10 temperature and humidity sensor
//!
//! A measurement takes up to 80 ms. Instead of holding the shared bus for
//! that long, the driver runs free: each read collects the measurement
//! triggered by the previous read and immediately triggers the next one.
//! The producer period (seconds) leaves the sensor plenty of time.

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;

use vigia_core::traits::{Sensor, SensorError, ThermalReading};

/// Fixed I2C address
pub const AHT10_ADDR: u8 = 0x38;

const CMD_INIT: [u8; 3] = [0xE1, 0x08, 0x00];
const CMD_TRIGGER: [u8; 3] = [0xAC, 0x33, 0x00];

const STATUS_BUSY: u8 = 1 << 7;
const STATUS_CALIBRATED: u8 = 1 << 3;

/// 2^20, full scale of the 20-bit raw values
const FULL_SCALE: f32 = 1_048_576.0;

/// Rated operating range in °C; the raw scale reaches 150 °C
const MIN_TEMPERATURE_C: f32 = -40.0;
const MAX_TEMPERATURE_C: f32 = 85.0;

/// AHT10 driver
#[derive(Debug, Default)]
pub struct Aht10 {
    triggered: bool,
}

impl Aht10 {
    pub const fn new() -> Self {
        Self { triggered: false }
    }

    /// Load calibration and start the first measurement
    ///
    /// Fails with `InvalidDevice` if the sensor does not report itself
    /// calibrated.
    pub fn init<I: I2c, D: DelayNs>(&mut self, bus: &mut I, delay: &mut D) -> Result<(), SensorError> {
        bus.write(AHT10_ADDR, &CMD_INIT)
            .map_err(|_| SensorError::Bus)?;
        delay.delay_ms(20);

        let mut status = [0u8; 1];
        bus.read(AHT10_ADDR, &mut status)
            .map_err(|_| SensorError::Bus)?;
        if status[0] & STATUS_CALIBRATED == 0 {
            return Err(SensorError::InvalidDevice);
        }

        self.trigger(bus)
    }

    fn trigger<I: I2c>(&mut self, bus: &mut I) -> Result<(), SensorError> {
        bus.write(AHT10_ADDR, &CMD_TRIGGER)
            .map_err(|_| SensorError::Bus)?;
        self.triggered = true;
        Ok(())
    }
}

/// Convert a 6-byte measurement frame
fn decode(frame: &[u8; 6]) -> Result<ThermalReading, SensorError> {
    if frame[0] & STATUS_BUSY != 0 {
        return Err(SensorError::NotReady);
    }

    let raw_humidity =
        ((frame[1] as u32) << 12) | ((frame[2] as u32) << 4) | ((frame[3] as u32) >> 4);
    let raw_temperature =
        (((frame[3] as u32) & 0x0F) << 16) | ((frame[4] as u32) << 8) | frame[5] as u32;

    let temperature_c = raw_temperature as f32 * 200.0 / FULL_SCALE - 50.0;
    // Stuck-high data lines read as all ones, far above the rated range
    if !(MIN_TEMPERATURE_C..=MAX_TEMPERATURE_C).contains(&temperature_c) {
        return Err(SensorError::OutOfRange);
    }

    Ok(ThermalReading {
        temperature_c,
        humidity_pct: raw_humidity as f32 * 100.0 / FULL_SCALE,
    })
}

impl<I: I2c> Sensor<I> for Aht10 {
    type Reading = ThermalReading;

    fn read(&mut self, bus: &mut I) -> Result<ThermalReading, SensorError> {
        if !self.triggered {
            self.trigger(bus)?;
            return Err(SensorError::NotReady);
        }

        let mut frame = [0u8; 6];
        bus.read(AHT10_ADDR, &mut frame)
            .map_err(|_| SensorError::Bus)?;
        let reading = decode(&frame)?;

        // Start the next conversion; if this fails, re-trigger on the next read
        if self.trigger(bus).is_err() {
            self.triggered = false;
        }
        Ok(reading)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockI2c, NoDelay};

    /// Frame for 50 %RH and 25 °C: raw_h = 0x80000, raw_t = 0x60000
    const FRAME_25C_50RH: [u8; 6] = [0x18, 0x80, 0x00, 0x06, 0x00, 0x00];

    #[test]
    fn test_decode_reference_frame() {
        let r = decode(&FRAME_25C_50RH).unwrap();
        assert!((r.humidity_pct - 50.0).abs() < 0.01);
        assert!((r.temperature_c - 25.0).abs() < 0.01);
    }

    #[test]
    fn test_decode_busy_frame() {
        let mut frame = FRAME_25C_50RH;
        frame[0] |= STATUS_BUSY;
        assert_eq!(decode(&frame), Err(SensorError::NotReady));
    }

    #[test]
    fn test_decode_rejects_all_ones_payload() {
        let frame = [STATUS_CALIBRATED, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF];
        assert_eq!(decode(&frame), Err(SensorError::OutOfRange));
    }

    #[test]
    fn test_decode_keeps_range_edges() {
        // raw_t = 0x0CCCD: -40.0 °C
        let frame = [STATUS_CALIBRATED, 0x80, 0x00, 0x00, 0xCC, 0xCD];
        let r = decode(&frame).unwrap();
        assert!((r.temperature_c + 40.0).abs() < 0.01);
    }

    #[test]
    fn test_init_sequence() {
        let mut bus = MockI2c::new();
        bus.respond(&[STATUS_CALIBRATED]);
        let mut sensor = Aht10::new();
        sensor.init(&mut bus, &mut NoDelay).unwrap();

        assert_eq!(
            bus.writes_to(AHT10_ADDR),
            vec![CMD_INIT.to_vec(), CMD_TRIGGER.to_vec()]
        );
    }

    #[test]
    fn test_init_rejects_uncalibrated() {
        let mut bus = MockI2c::new();
        bus.respond(&[0x00]);
        let mut sensor = Aht10::new();
        assert_eq!(
            sensor.init(&mut bus, &mut NoDelay),
            Err(SensorError::InvalidDevice)
        );
    }

    #[test]
    fn test_init_bus_failure() {
        let mut bus = MockI2c::new();
        bus.fail = 1;
        let mut sensor = Aht10::new();
        assert_eq!(sensor.init(&mut bus, &mut NoDelay), Err(SensorError::Bus));
    }

    #[test]
    fn test_read_collects_then_retriggers() {
        let mut bus = MockI2c::new();
        bus.respond(&[STATUS_CALIBRATED]).respond(&FRAME_25C_50RH);
        let mut sensor = Aht10::new();
        sensor.init(&mut bus, &mut NoDelay).unwrap();

        let r = sensor.read(&mut bus).unwrap();
        assert!((r.temperature_c - 25.0).abs() < 0.01);
        // init, trigger, trigger
        assert_eq!(bus.writes_to(AHT10_ADDR).len(), 3);
        assert_eq!(bus.reads.last(), Some(&(AHT10_ADDR, 6)));
    }

    #[test]
    fn test_read_without_init_triggers_first() {
        let mut bus = MockI2c::new();
        let mut sensor = Aht10::new();
        assert_eq!(sensor.read(&mut bus), Err(SensorError::NotReady));
        assert_eq!(bus.writes_to(AHT10_ADDR), vec![CMD_TRIGGER.to_vec()]);
        assert!(bus.reads.is_empty());
    }
}
