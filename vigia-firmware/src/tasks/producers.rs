//! Sensor producer tasks
//!
//! One task per device. Each cycle takes the sensor bus, reads, releases
//! and writes the derived fields into the store. A failed cycle is logged
//! and skipped; the store keeps the previous value.

use defmt::*;
use embassy_time::{Duration, Ticker};

use vigia_core::sensors::{
    CollisionLatch, CycleError, FieldPolicy, LightPolicy, SensorProducer, ThermalPolicy,
};
use vigia_core::traits::{Sensor, SensorError};
use vigia_drivers::sensor::{Aht10, Bh1750, Mpu6050};

use crate::shared::{SensorBus, SensorI2c, Store};

fn report(name: &str, result: &Result<vigia_core::state::FieldUpdate, CycleError>) {
    match result {
        Ok(update) => trace!("{}: {}", name, update),
        // Free-running conversion not finished yet
        Err(CycleError::Device(SensorError::NotReady)) => debug!("{}: not ready", name),
        Err(e) => warn!("{}: cycle skipped ({})", name, e),
    }
}

async fn run<S, P>(
    name: &str,
    mut producer: SensorProducer<S, P>,
    bus: &'static SensorBus,
    store: &'static Store,
    period: Duration,
) -> !
where
    S: Sensor<SensorI2c>,
    P: FieldPolicy<S::Reading>,
{
    info!("{} producer started, period {} ms", name, period.as_millis());
    let mut ticker = Ticker::every(period);
    loop {
        let result = producer.cycle(bus, store).await;
        report(name, &result);
        ticker.next().await;
    }
}

#[embassy_executor::task]
pub async fn thermal_task(
    producer: SensorProducer<Aht10, ThermalPolicy>,
    bus: &'static SensorBus,
    store: &'static Store,
    period: Duration,
) -> ! {
    run("thermal", producer, bus, store, period).await
}

#[embassy_executor::task]
pub async fn light_task(
    producer: SensorProducer<Bh1750, LightPolicy>,
    bus: &'static SensorBus,
    store: &'static Store,
    period: Duration,
) -> ! {
    run("light", producer, bus, store, period).await
}

/// Motion runs at 10 Hz, so only latch edges are logged above trace
#[embassy_executor::task]
pub async fn motion_task(
    mut producer: SensorProducer<Mpu6050, CollisionLatch>,
    bus: &'static SensorBus,
    store: &'static Store,
    period: Duration,
) -> ! {
    info!("motion producer started, period {} ms", period.as_millis());
    let mut ticker = Ticker::every(period);
    let mut latched = false;
    loop {
        let result = producer.cycle(bus, store).await;
        match &result {
            Ok(_) => {
                let active = producer.policy().is_active();
                if active && !latched {
                    warn!("Collision detected");
                } else if !active && latched {
                    info!("Collision alert cleared");
                }
                latched = active;
            }
            Err(_) => report("motion", &result),
        }
        ticker.next().await;
    }
}
