//! Field derivation policies
//!
//! Policies are plain state machines with no bus access, so thresholds and
//! debouncing can be tested directly.

use crate::config::Thresholds;
use crate::state::{FieldUpdate, SensorField};
use crate::traits::{Acceleration, ThermalReading};

/// Turns one reading into the fields its producer owns
pub trait FieldPolicy<R> {
    fn derive(&mut self, reading: R) -> FieldUpdate;
}

fn update_of(fields: &[SensorField]) -> FieldUpdate {
    let mut update = FieldUpdate::new();
    for field in fields.iter().take(update.capacity()) {
        let _ = update.push(*field);
    }
    update
}

/// Temperature and humidity pass through unchanged
#[derive(Debug, Clone, Copy, Default)]
pub struct ThermalPolicy;

impl FieldPolicy<ThermalReading> for ThermalPolicy {
    fn derive(&mut self, reading: ThermalReading) -> FieldUpdate {
        update_of(&[
            SensorField::Temperature(reading.temperature_c),
            SensorField::Humidity(reading.humidity_pct),
        ])
    }
}

/// Box counts as opened when light is strictly above the threshold
#[derive(Debug, Clone, Copy)]
pub struct LightPolicy {
    threshold_lux: f32,
}

impl LightPolicy {
    pub const fn new(threshold_lux: f32) -> Self {
        Self { threshold_lux }
    }

    pub fn from_thresholds(thresholds: &Thresholds) -> Self {
        Self::new(thresholds.light_lux)
    }

    pub fn is_opened(&self, lux: f32) -> bool {
        lux > self.threshold_lux
    }
}

impl FieldPolicy<f32> for LightPolicy {
    fn derive(&mut self, lux: f32) -> FieldUpdate {
        update_of(&[SensorField::Opened(self.is_opened(lux))])
    }
}

/// Collision debounce
///
/// An impact (magnitude above threshold) arms a counter of `hold_cycles`.
/// Every calmer sample decrements it; the flag is set while it is non-zero.
/// A new impact re-arms the full hold.
#[derive(Debug, Clone, Copy)]
pub struct CollisionLatch {
    threshold_g: f32,
    hold_cycles: u16,
    remaining: u16,
}

impl CollisionLatch {
    pub const fn new(threshold_g: f32, hold_cycles: u16) -> Self {
        Self {
            threshold_g,
            hold_cycles,
            remaining: 0,
        }
    }

    pub fn from_thresholds(thresholds: &Thresholds) -> Self {
        Self::new(thresholds.collision_g, thresholds.collision_hold_cycles)
    }

    /// Feed one magnitude sample, returning the collision flag
    pub fn update(&mut self, magnitude_g: f32) -> bool {
        if magnitude_g > self.threshold_g {
            self.remaining = self.hold_cycles;
        } else {
            self.remaining = self.remaining.saturating_sub(1);
        }
        self.is_active()
    }

    pub fn is_active(&self) -> bool {
        self.remaining > 0
    }

    /// Cycles left before the flag clears
    pub fn remaining(&self) -> u16 {
        self.remaining
    }
}

impl FieldPolicy<Acceleration> for CollisionLatch {
    fn derive(&mut self, reading: Acceleration) -> FieldUpdate {
        update_of(&[SensorField::Collision(self.update(reading.magnitude()))])
    }
}
