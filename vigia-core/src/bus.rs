//! Shared sensor bus arbitration
//!
//! All sensors sit on one I2C bus. A producer acquires the bus, runs one
//! transaction and releases it before doing anything else, so the bus is
//! never held across a sleep or a store write.
//!
//! Waiters are served in the order the executor polls them; there is no
//! fairness beyond that.

use core::ops::{Deref, DerefMut};

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::mutex::{Mutex, MutexGuard};
use embassy_time::{with_timeout, Duration};

/// Bus arbitration errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BusError {
    /// Bus not obtained within the timeout; skip this cycle
    Busy,
}

/// Serializes access to a shared bus `B`
pub struct BusArbiter<M: RawMutex, B> {
    bus: Mutex<M, B>,
}

/// Exclusive ownership of the bus, released on drop
pub struct BusGuard<'a, M: RawMutex, B> {
    guard: MutexGuard<'a, M, B>,
}

impl<M: RawMutex, B> BusArbiter<M, B> {
    pub const fn new(bus: B) -> Self {
        Self {
            bus: Mutex::new(bus),
        }
    }

    /// Wait up to `timeout` for exclusive ownership of the bus
    pub async fn acquire(&self, timeout: Duration) -> Result<BusGuard<'_, M, B>, BusError> {
        with_timeout(timeout, self.bus.lock())
            .await
            .map(|guard| BusGuard { guard })
            .map_err(|_| BusError::Busy)
    }

    /// Take ownership of the bus without waiting
    pub fn try_acquire(&self) -> Result<BusGuard<'_, M, B>, BusError> {
        self.bus
            .try_lock()
            .map(|guard| BusGuard { guard })
            .map_err(|_| BusError::Busy)
    }
}

impl<M: RawMutex, B> BusGuard<'_, M, B> {
    /// Give the bus back
    pub fn release(self) {}
}

impl<M: RawMutex, B> Deref for BusGuard<'_, M, B> {
    type Target = B;

    fn deref(&self) -> &B {
        &self.guard
    }
}

impl<M: RawMutex, B> DerefMut for BusGuard<'_, M, B> {
    fn deref_mut(&mut self) -> &mut B {
        &mut self.guard
    }
}
