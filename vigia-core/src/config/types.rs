//! Configuration type definitions

use core::fmt;

use embassy_time::Duration;
use heapless::String;

/// Maximum SSID length (802.11)
pub const MAX_SSID_LEN: usize = 32;

/// Maximum WPA2 passphrase length
pub const MAX_PASSWORD_LEN: usize = 64;

/// Maximum broker host name length
pub const MAX_HOST_LEN: usize = 64;

/// Maximum MQTT client identifier length
pub const MAX_CLIENT_ID_LEN: usize = 32;

/// Maximum topic length, shared with outgoing messages
pub const MAX_TOPIC_LEN: usize = 128;

/// Wi-Fi link configuration
///
/// `Debug` and `defmt::Format` never print the passphrase.
#[derive(Clone, PartialEq)]
pub struct LinkConfig {
    /// Network name
    pub ssid: String<MAX_SSID_LEN>,
    /// WPA2 passphrase
    pub password: String<MAX_PASSWORD_LEN>,
    /// How long one join attempt may take (association + DHCP)
    pub join_timeout_ms: u32,
    /// Interval between link checks and join retries
    pub retry_interval_ms: u32,
}

impl LinkConfig {
    pub fn join_timeout(&self) -> Duration {
        Duration::from_millis(self.join_timeout_ms as u64)
    }

    pub fn retry_interval(&self) -> Duration {
        Duration::from_millis(self.retry_interval_ms as u64)
    }
}

impl fmt::Debug for LinkConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LinkConfig")
            .field("ssid", &self.ssid)
            .field("password", &format_args!("***"))
            .field("join_timeout_ms", &self.join_timeout_ms)
            .field("retry_interval_ms", &self.retry_interval_ms)
            .finish()
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for LinkConfig {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(
            f,
            "LinkConfig {{ ssid: {=str}, password: ***, join_timeout_ms: {=u32}, retry_interval_ms: {=u32} }}",
            self.ssid.as_str(),
            self.join_timeout_ms,
            self.retry_interval_ms
        )
    }
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            ssid: String::new(),
            password: String::new(),
            join_timeout_ms: 15_000,
            retry_interval_ms: 10_000,
        }
    }
}

/// Broker endpoint and session configuration
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BrokerConfig {
    /// Host name or dotted IPv4 address
    pub host: String<MAX_HOST_LEN>,
    pub port: u16,
    pub client_id: String<MAX_CLIENT_ID_LEN>,
    pub keep_alive_s: u16,
    /// Topic the snapshot publisher posts to
    pub topic: String<MAX_TOPIC_LEN>,
    /// Wait after a failed resolve or connect
    pub retry_delay_ms: u32,
}

impl BrokerConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms as u64)
    }

    /// Idle time before pinging: half the keep-alive, `None` when it is off
    pub fn ping_interval(&self) -> Option<Duration> {
        match self.keep_alive_s {
            0 => None,
            s => Some(Duration::from_millis(s as u64 * 500)),
        }
    }
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            host: bounded("192.168.5.196"),
            port: 1883,
            client_id: bounded("pico_freertos_client"),
            keep_alive_s: 60,
            topic: bounded("pico/dados"),
            retry_delay_ms: 5_000,
        }
    }
}

/// Task periods and bounded waits, all in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TaskPeriods {
    pub thermal_ms: u32,
    pub light_ms: u32,
    pub motion_ms: u32,
    pub snapshot_ms: u32,
    pub display_ms: u32,
    /// Sleep at the end of every publish worker cycle
    pub publish_idle_ms: u32,
    /// Maximum wait for a queued message while connected
    pub dequeue_timeout_ms: u32,
    /// Maximum wait for the bus and the state store
    pub lock_timeout_ms: u32,
}

impl TaskPeriods {
    pub fn thermal(&self) -> Duration {
        Duration::from_millis(self.thermal_ms as u64)
    }

    pub fn light(&self) -> Duration {
        Duration::from_millis(self.light_ms as u64)
    }

    pub fn motion(&self) -> Duration {
        Duration::from_millis(self.motion_ms as u64)
    }

    pub fn snapshot(&self) -> Duration {
        Duration::from_millis(self.snapshot_ms as u64)
    }

    pub fn display(&self) -> Duration {
        Duration::from_millis(self.display_ms as u64)
    }

    pub fn publish_idle(&self) -> Duration {
        Duration::from_millis(self.publish_idle_ms as u64)
    }

    pub fn dequeue_timeout(&self) -> Duration {
        Duration::from_millis(self.dequeue_timeout_ms as u64)
    }

    pub fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms as u64)
    }
}

impl Default for TaskPeriods {
    fn default() -> Self {
        Self {
            thermal_ms: 2_000,
            light_ms: 500,
            motion_ms: 100,
            snapshot_ms: 10_000,
            display_ms: 1_000,
            publish_idle_ms: 200,
            dequeue_timeout_ms: 1_000,
            lock_timeout_ms: 100,
        }
    }
}

/// Field policy thresholds
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Thresholds {
    /// Box counts as opened strictly above this illuminance (lux)
    pub light_lux: f32,
    /// Acceleration magnitude (g) that counts as an impact
    pub collision_g: f32,
    /// Motion cycles the collision flag stays latched after an impact
    pub collision_hold_cycles: u16,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            light_lux: 10.0,
            collision_g: 2.5,
            collision_hold_cycles: 100,
        }
    }
}

/// Complete node configuration
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct NodeConfig {
    pub link: LinkConfig,
    pub broker: BrokerConfig,
    pub periods: TaskPeriods,
    pub thresholds: Thresholds,
}

impl NodeConfig {
    /// Default configuration
    pub fn new() -> Self {
        Self::default()
    }
}

/// Copy a literal into a bounded string, cutting it at capacity
fn bounded<const N: usize>(s: &str) -> String<N> {
    let mut out = String::new();
    for c in s.chars() {
        if out.push(c).is_err() {
            break;
        }
    }
    out
}
