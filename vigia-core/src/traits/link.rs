//! Wi-Fi link trait

use core::net::Ipv4Addr;

use embassy_time::Duration;

/// Errors that can occur while joining a network
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkError {
    /// Association or DHCP did not finish in time
    Timeout,
    /// Access point rejected the credentials
    AuthFailed,
    /// Network not found
    NoNetwork,
    /// Radio driver reported a failure
    Driver,
}

/// Trait for the link-layer collaborator (radio + IP configuration)
#[allow(async_fn_in_trait)]
pub trait LinkDriver {
    /// Join `ssid` and wait for an address, giving up after `timeout`
    async fn join(&mut self, ssid: &str, password: &str, timeout: Duration)
        -> Result<(), LinkError>;

    /// Currently assigned IPv4 address, if any
    fn current_address(&self) -> Option<Ipv4Addr>;
}
