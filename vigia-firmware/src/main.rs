//! Vigia - Sensor Telemetry Node Firmware
//!
//! Firmware for the Raspberry Pi Pico W. Three sensors on a shared I2C bus
//! feed one state store; snapshots are published to an MQTT broker over
//! Wi-Fi and shown on an SSD1306 OLED.
//!
//! Pin map:
//! - I2C0 (GP0 SDA, GP1 SCL, 100 kHz): AHT10, BH1750, MPU6050
//! - I2C1 (GP14 SDA, GP15 SCL, 400 kHz): SSD1306
//! - CYW43: GP23 power, GP24 data, GP25 chip select, GP29 clock (PIO0)

#![no_std]
#![no_main]

use cyw43_pio::{PioSpi, DEFAULT_CLOCK_DIVIDER};
use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::bind_interrupts;
use embassy_rp::clocks::RoscRng;
use embassy_rp::gpio::{Level, Output};
use embassy_rp::i2c::{Config as I2cConfig, I2c};
use embassy_rp::peripherals::PIO0;
use embassy_rp::pio::{InterruptHandler as PioInterruptHandler, Pio};
use embassy_net::StackResources;
use embassy_time::{Delay, Duration};
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use vigia_core::bus::BusArbiter;
use vigia_core::config::{parse_config, NodeConfig};
use vigia_core::display::{render_fault, render_splash};
use vigia_core::net::{LinkStatus, OutboundQueue, SessionStatus};
use vigia_core::sensors::{CollisionLatch, LightPolicy, SensorProducer, ThermalPolicy};
use vigia_core::state::SharedStateStore;
use vigia_drivers::display::Ssd1306;
use vigia_drivers::sensor::{Aht10, Bh1750, Mpu6050};

use crate::mqtt::{MqttConnector, SessionBuffers};
use crate::shared::{Oled, Outbound, SensorBus, SensorI2c, Store};
use crate::wifi::CywLink;

/// Node configuration compiled into the image
/// Edit node.toml and rebuild to change Wi-Fi or broker settings
const EMBEDDED_CONFIG: &str = include_str!("../node.toml");

/// CYW43439 firmware and regulatory data, copied from the embassy repository
const CYW43_FIRMWARE: &[u8] = include_bytes!("../cyw43-firmware/43439A0.bin");
const CYW43_CLM: &[u8] = include_bytes!("../cyw43-firmware/43439A0_clm.bin");

/// How long a producer waits for the sensor bus before skipping a cycle
const BUS_TIMEOUT: Duration = Duration::from_millis(100);

const SENSOR_BUS_HZ: u32 = 100_000;
const DISPLAY_BUS_HZ: u32 = 400_000;

mod mqtt;
mod shared;
mod tasks;
mod wifi;

bind_interrupts!(struct Irqs {
    PIO0_IRQ_0 => PioInterruptHandler<PIO0>;
});

static NODE_CONFIG: StaticCell<NodeConfig> = StaticCell::new();
static STORE: StaticCell<Store> = StaticCell::new();
static SENSOR_BUS: StaticCell<SensorBus> = StaticCell::new();
static OUTBOUND: StaticCell<Outbound> = StaticCell::new();
static LINK_STATUS: StaticCell<LinkStatus> = StaticCell::new();
static SESSION_STATUS: StaticCell<SessionStatus> = StaticCell::new();
static CYW43_STATE: StaticCell<cyw43::State> = StaticCell::new();
static NET_RESOURCES: StaticCell<StackResources<3>> = StaticCell::new();
static SESSION_BUFFERS: StaticCell<SessionBuffers> = StaticCell::new();

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Vigia firmware starting...");

    let p = embassy_rp::init(Default::default());
    info!("Peripherals initialized");

    let config: &'static NodeConfig = NODE_CONFIG.init(load_config());

    // Display first, so boot failures can be reported on it
    let mut display_config = I2cConfig::default();
    display_config.frequency = DISPLAY_BUS_HZ;
    let mut oled: Oled = Ssd1306::new(I2c::new_blocking(p.I2C1, p.PIN_15, p.PIN_14, display_config));
    match oled.init() {
        Ok(()) => {
            if let Err(e) = render_splash(&mut oled) {
                warn!("Splash screen failed: {}", e);
            }
        }
        Err(_) => warn!("SSD1306 not responding, continuing without display"),
    }

    let mut sensor_config = I2cConfig::default();
    sensor_config.frequency = SENSOR_BUS_HZ;
    let mut i2c: SensorI2c = I2c::new_blocking(p.I2C0, p.PIN_1, p.PIN_0, sensor_config);

    let mut aht10 = Aht10::new();
    if let Err(e) = aht10.init(&mut i2c, &mut Delay) {
        error!("AHT10 init failed: {}", e);
        halt(&mut oled, &["Erro no Sensor", "AHT10!"]).await;
    }
    let mut bh1750 = Bh1750::new();
    if let Err(e) = bh1750.init(&mut i2c) {
        error!("BH1750 init failed: {}", e);
        halt(&mut oled, &["Erro no Sensor", "BH1750!"]).await;
    }
    let mut mpu6050 = Mpu6050::new();
    if let Err(e) = mpu6050.init(&mut i2c) {
        error!("MPU6050 init failed: {}", e);
        halt(&mut oled, &["Erro no Sensor", "MPU6050!"]).await;
    }
    info!("Sensors initialized");

    let bus: &'static SensorBus = SENSOR_BUS.init(BusArbiter::new(i2c));
    let store: &'static Store =
        STORE.init(SharedStateStore::with_lock_timeout(config.periods.lock_timeout()));
    let outbound: &'static Outbound = OUTBOUND.init(OutboundQueue::new());
    let link_status: &'static LinkStatus = LINK_STATUS.init(LinkStatus::new());
    let session_status: &'static SessionStatus = SESSION_STATUS.init(SessionStatus::new());

    // Wi-Fi radio over PIO SPI
    let pwr = Output::new(p.PIN_23, Level::Low);
    let cs = Output::new(p.PIN_25, Level::High);
    let mut pio = Pio::new(p.PIO0, Irqs);
    let spi = PioSpi::new(
        &mut pio.common,
        pio.sm0,
        DEFAULT_CLOCK_DIVIDER,
        pio.irq0,
        cs,
        p.PIN_24,
        p.PIN_29,
        p.DMA_CH0,
    );

    let state = CYW43_STATE.init(cyw43::State::new());
    let (net_device, mut control, runner) = cyw43::new(state, pwr, spi, CYW43_FIRMWARE).await;
    spawner.spawn(tasks::cyw43_task(runner)).unwrap();

    control.init(CYW43_CLM).await;
    control
        .set_power_management(cyw43::PowerManagementMode::PowerSave)
        .await;
    info!("CYW43 initialized");

    let seed = RoscRng.next_u64();
    let (stack, net_runner) = embassy_net::new(
        net_device,
        embassy_net::Config::dhcpv4(Default::default()),
        NET_RESOURCES.init(StackResources::new()),
        seed,
    );
    spawner.spawn(tasks::net_task(net_runner)).unwrap();

    let periods = &config.periods;
    let thresholds = &config.thresholds;

    spawner
        .spawn(tasks::thermal_task(
            SensorProducer::new(aht10, ThermalPolicy, BUS_TIMEOUT),
            bus,
            store,
            periods.thermal(),
        ))
        .unwrap();
    spawner
        .spawn(tasks::light_task(
            SensorProducer::new(bh1750, LightPolicy::from_thresholds(thresholds), BUS_TIMEOUT),
            bus,
            store,
            periods.light(),
        ))
        .unwrap();
    spawner
        .spawn(tasks::motion_task(
            SensorProducer::new(mpu6050, CollisionLatch::from_thresholds(thresholds), BUS_TIMEOUT),
            bus,
            store,
            periods.motion(),
        ))
        .unwrap();
    spawner
        .spawn(tasks::snapshot_task(
            store,
            outbound,
            config.broker.topic.as_str(),
            periods.snapshot(),
        ))
        .unwrap();
    spawner
        .spawn(tasks::display_task(
            oled,
            store,
            link_status,
            session_status,
            periods.display(),
        ))
        .unwrap();
    spawner
        .spawn(tasks::link_task(CywLink::new(control, stack), link_status, &config.link))
        .unwrap();
    spawner
        .spawn(tasks::publish_task(
            MqttConnector::new(stack, SESSION_BUFFERS.init(SessionBuffers::new())),
            outbound,
            link_status,
            session_status,
            config,
        ))
        .unwrap();

    info!("All tasks spawned, firmware running");

    loop {
        embassy_time::Timer::after_secs(60).await;
        trace!("Main loop heartbeat");
    }
}

/// Parse the embedded node.toml
///
/// Falls back to the built-in defaults if it does not parse; build.rs
/// validates the file, so this only happens with a parser mismatch.
fn load_config() -> NodeConfig {
    match parse_config(EMBEDDED_CONFIG) {
        Ok(config) => {
            info!("Parsed embedded configuration successfully");
            config
        }
        Err(e) => {
            error!("Failed to parse embedded config: {}", e);
            error!("Using built-in defaults");
            NodeConfig::default()
        }
    }
}

/// Report a fatal boot failure on the display and stop
async fn halt(oled: &mut Oled, lines: &[&str]) -> ! {
    if render_fault(oled, lines).is_err() {
        warn!("Fault screen could not be shown");
    }
    error!("Boot halted");
    loop {
        embassy_time::Timer::after_secs(60).await;
    }
}
