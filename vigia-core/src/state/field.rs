//! Sensor fields and snapshots

use heapless::Vec;

/// Most fields a single producer writes in one update
pub const MAX_FIELDS_PER_UPDATE: usize = 2;

/// One value in the shared state, tagged by field
///
/// Each variant has exactly one writer: the thermal producer owns
/// `Temperature` and `Humidity`, the light producer `Opened`, the motion
/// producer `Collision`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SensorField {
    /// Temperature in °C
    Temperature(f32),
    /// Relative humidity in %RH
    Humidity(f32),
    /// Box lid open (light above threshold)
    Opened(bool),
    /// Collision latch active
    Collision(bool),
}

/// Fields written together by one producer cycle
pub type FieldUpdate = Vec<SensorField, MAX_FIELDS_PER_UPDATE>;

/// Copy of every field, taken under one lock
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StateSnapshot {
    pub temperature_c: f32,
    pub humidity_pct: f32,
    pub opened: bool,
    pub collision: bool,
}

impl StateSnapshot {
    /// Initial state: all numbers zero, all flags false
    pub const ZERO: Self = Self {
        temperature_c: 0.0,
        humidity_pct: 0.0,
        opened: false,
        collision: false,
    };

    /// Overwrite the field `field` refers to
    pub fn apply(&mut self, field: SensorField) {
        match field {
            SensorField::Temperature(v) => self.temperature_c = v,
            SensorField::Humidity(v) => self.humidity_pct = v,
            SensorField::Opened(v) => self.opened = v,
            SensorField::Collision(v) => self.collision = v,
        }
    }

    /// Builder form of [`apply`](Self::apply)
    pub fn with(mut self, field: SensorField) -> Self {
        self.apply(field);
        self
    }
}

impl Default for StateSnapshot {
    fn default() -> Self {
        Self::ZERO
    }
}
