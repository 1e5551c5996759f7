//! Periodic producer cycle
//!
//! One cycle: acquire bus, read device, release bus, derive fields, write
//! store. Any failure skips the rest of the cycle; the store keeps the
//! previous values.

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_time::Duration;

use super::policy::FieldPolicy;
use crate::bus::{BusArbiter, BusError};
use crate::state::{FieldUpdate, SharedStateStore, StoreError};
use crate::traits::{Sensor, SensorError};

/// Why a producer cycle was skipped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CycleError {
    /// Bus not obtained in time
    Bus(BusError),
    /// Device read failed
    Device(SensorError),
    /// Store lock timed out; the update was dropped
    Store(StoreError),
}

impl From<BusError> for CycleError {
    fn from(e: BusError) -> Self {
        CycleError::Bus(e)
    }
}

impl From<SensorError> for CycleError {
    fn from(e: SensorError) -> Self {
        CycleError::Device(e)
    }
}

impl From<StoreError> for CycleError {
    fn from(e: StoreError) -> Self {
        CycleError::Store(e)
    }
}

/// A sensor and the policy deriving its fields
pub struct SensorProducer<S, P> {
    sensor: S,
    policy: P,
    bus_timeout: Duration,
}

impl<S, P> SensorProducer<S, P> {
    pub fn new(sensor: S, policy: P, bus_timeout: Duration) -> Self {
        Self {
            sensor,
            policy,
            bus_timeout,
        }
    }

    pub fn policy(&self) -> &P {
        &self.policy
    }

    /// Run one cycle, returning the fields written
    pub async fn cycle<BM, SM, B>(
        &mut self,
        bus: &BusArbiter<BM, B>,
        store: &SharedStateStore<SM>,
    ) -> Result<FieldUpdate, CycleError>
    where
        BM: RawMutex,
        SM: RawMutex,
        S: Sensor<B>,
        P: FieldPolicy<S::Reading>,
    {
        let reading = {
            let mut guard = bus.acquire(self.bus_timeout).await?;
            let reading = self.sensor.read(&mut *guard);
            guard.release();
            reading?
        };

        let update = self.policy.derive(reading);
        store.apply(&update).await?;
        Ok(update)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensors::{CollisionLatch, LightPolicy};
    use crate::state::SensorField;
    use crate::traits::Acceleration;
    use embassy_futures::block_on;
    use embassy_sync::blocking_mutex::raw::NoopRawMutex;

    /// Bus stand-in counting transactions
    #[derive(Default)]
    struct FakeBus {
        transactions: u32,
    }

    /// Light sensor replaying scripted readings
    struct ScriptedLight {
        readings: std::vec::Vec<Result<f32, SensorError>>,
    }

    impl Sensor<FakeBus> for ScriptedLight {
        type Reading = f32;

        fn read(&mut self, bus: &mut FakeBus) -> Result<f32, SensorError> {
            bus.transactions += 1;
            self.readings.remove(0)
        }
    }

    struct ScriptedMotion(std::vec::Vec<Acceleration>);

    impl Sensor<FakeBus> for ScriptedMotion {
        type Reading = Acceleration;

        fn read(&mut self, _bus: &mut FakeBus) -> Result<Acceleration, SensorError> {
            Ok(self.0.remove(0))
        }
    }

    const TIMEOUT: Duration = Duration::from_millis(10);

    #[test]
    fn test_cycle_writes_derived_field() {
        let bus: BusArbiter<NoopRawMutex, FakeBus> = BusArbiter::new(FakeBus::default());
        let store: SharedStateStore<NoopRawMutex> = SharedStateStore::new();
        let sensor = ScriptedLight {
            readings: vec![Ok(15.0), Ok(5.0)],
        };
        let mut producer = SensorProducer::new(sensor, LightPolicy::new(10.0), TIMEOUT);

        block_on(async {
            let update = producer.cycle(&bus, &store).await.unwrap();
            assert_eq!(update.as_slice(), &[SensorField::Opened(true)]);
            assert!(store.get().await.opened);

            producer.cycle(&bus, &store).await.unwrap();
            assert!(!store.get().await.opened);

            // Bus released after each read
            assert_eq!(bus.try_acquire().unwrap().transactions, 2);
        });
    }

    #[test]
    fn test_device_error_skips_write() {
        let bus: BusArbiter<NoopRawMutex, FakeBus> = BusArbiter::new(FakeBus::default());
        let store: SharedStateStore<NoopRawMutex> = SharedStateStore::new();
        let sensor = ScriptedLight {
            readings: vec![Ok(15.0), Err(SensorError::Bus)],
        };
        let mut producer = SensorProducer::new(sensor, LightPolicy::new(10.0), TIMEOUT);

        block_on(async {
            producer.cycle(&bus, &store).await.unwrap();
            assert_eq!(
                producer.cycle(&bus, &store).await,
                Err(CycleError::Device(SensorError::Bus))
            );
            // Last value kept
            assert!(store.get().await.opened);
            // Bus released even on failure
            assert!(bus.try_acquire().is_ok());
        });
    }

    #[test]
    fn test_busy_bus_skips_cycle() {
        let bus: BusArbiter<NoopRawMutex, FakeBus> = BusArbiter::new(FakeBus::default());
        let store: SharedStateStore<NoopRawMutex> = SharedStateStore::new();
        let sensor = ScriptedLight {
            readings: vec![Ok(15.0)],
        };
        let mut producer = SensorProducer::new(sensor, LightPolicy::new(10.0), TIMEOUT);

        block_on(async {
            let held = bus.acquire(TIMEOUT).await.unwrap();
            assert_eq!(
                producer.cycle(&bus, &store).await,
                Err(CycleError::Bus(BusError::Busy))
            );
            assert_eq!(held.transactions, 0);
            assert!(!store.get().await.opened);
        });
    }

    #[test]
    fn test_motion_latch_lives_in_producer() {
        let bus: BusArbiter<NoopRawMutex, FakeBus> = BusArbiter::new(FakeBus::default());
        let store: SharedStateStore<NoopRawMutex> = SharedStateStore::new();
        let sensor = ScriptedMotion(vec![
            Acceleration::new(0.0, 3.0, 0.0),
            Acceleration::new(0.0, 0.0, 1.0),
            Acceleration::new(0.0, 0.0, 1.0),
        ]);
        let mut producer = SensorProducer::new(sensor, CollisionLatch::new(2.5, 2), TIMEOUT);

        block_on(async {
            producer.cycle(&bus, &store).await.unwrap();
            assert!(store.get().await.collision);
            producer.cycle(&bus, &store).await.unwrap();
            assert!(store.get().await.collision);
            producer.cycle(&bus, &store).await.unwrap();
            assert!(!store.get().await.collision);
            assert_eq!(producer.policy().remaining(), 0);
        });
    }
}
