//! Resources shared between tasks
//!
//! Type aliases for everything `main` initializes once through `StaticCell`
//! and hands to the tasks as `&'static` references.

use embassy_rp::i2c::{Blocking, I2c};
use embassy_rp::peripherals::{I2C0, I2C1};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;

use vigia_core::bus::BusArbiter;
use vigia_core::net::{LinkStatus, OutboundQueue, SessionStatus};
use vigia_core::state::SharedStateStore;
use vigia_drivers::display::Ssd1306;

/// Sensor bus (I2C0: AHT10, BH1750, MPU6050)
pub type SensorI2c = I2c<'static, I2C0, Blocking>;

/// Display bus (I2C1: SSD1306 only)
pub type DisplayI2c = I2c<'static, I2C1, Blocking>;

pub type SensorBus = BusArbiter<CriticalSectionRawMutex, SensorI2c>;

pub type Store = SharedStateStore<CriticalSectionRawMutex>;

pub type Oled = Ssd1306<DisplayI2c>;

/// Snapshots waiting for the publish worker
pub type Outbound = OutboundQueue<CriticalSectionRawMutex>;
