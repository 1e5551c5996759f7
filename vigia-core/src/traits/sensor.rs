//! Sensor traits
//!
//! Sensors on the node share one I2C bus, so a driver never owns the bus.
//! Each read borrows it from the [`BusArbiter`](crate::bus::BusArbiter)
//! guard for exactly one measurement.

/// Errors that can occur while reading a sensor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SensorError {
    /// Bus transaction failed (NACK, arbitration lost, timeout)
    Bus,
    /// Device has not finished its measurement yet
    NotReady,
    /// Device did not identify as expected or is not calibrated
    InvalidDevice,
    /// Reading outside the physical range of the device
    OutOfRange,
}

/// Trait for a device on the shared sensor bus
///
/// `B` is the bus type handed out by the arbiter; drivers usually accept
/// any `embedded_hal::i2c::I2c`.
pub trait Sensor<B> {
    /// Value produced by one successful read
    type Reading;

    /// Perform one measurement
    ///
    /// Must not block for longer than a single bus transaction; the bus
    /// lock is held for the whole call.
    fn read(&mut self, bus: &mut B) -> Result<Self::Reading, SensorError>;
}

/// Temperature and relative humidity from a combined sensor
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ThermalReading {
    /// Temperature in °C
    pub temperature_c: f32,
    /// Relative humidity in %RH
    pub humidity_pct: f32,
}

/// Three-axis acceleration in g
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Acceleration {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Acceleration {
    /// Create a new acceleration sample
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Euclidean magnitude `sqrt(x² + y² + z²)`
    pub fn magnitude(&self) -> f32 {
        libm::sqrtf(self.x * self.x + self.y * self.y + self.z * self.z)
    }
}
