//! CYW43 Wi-Fi link
//!
//! Joins with WPA2 (or an open network when the password is empty) and
//! waits for DHCP before reporting success.

use core::net::Ipv4Addr;

use cyw43::JoinOptions;
use defmt::*;
use embassy_net::Stack;
use embassy_time::{with_timeout, Duration, Instant};

use vigia_core::traits::{LinkDriver, LinkError};

/// cyw43 join status codes
const STATUS_TIMEOUT: u32 = 2;
const STATUS_NO_NETWORKS: u32 = 3;

/// Radio control plus the IP stack it feeds
pub struct CywLink {
    control: cyw43::Control<'static>,
    stack: Stack<'static>,
}

impl CywLink {
    pub fn new(control: cyw43::Control<'static>, stack: Stack<'static>) -> Self {
        Self { control, stack }
    }
}

fn join_error(status: u32) -> LinkError {
    match status {
        STATUS_TIMEOUT => LinkError::Timeout,
        STATUS_NO_NETWORKS => LinkError::NoNetwork,
        // Supplicant failures report their own codes
        _ => LinkError::AuthFailed,
    }
}

impl LinkDriver for CywLink {
    async fn join(
        &mut self,
        ssid: &str,
        password: &str,
        timeout: Duration,
    ) -> Result<(), LinkError> {
        let deadline = Instant::now() + timeout;
        let options = if password.is_empty() {
            JoinOptions::new_open()
        } else {
            JoinOptions::new(password.as_bytes())
        };

        match with_timeout(timeout, self.control.join(ssid, options)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                debug!("Join rejected with status {}", e.status);
                return Err(join_error(e.status));
            }
            Err(_) => return Err(LinkError::Timeout),
        }

        // DHCP gets whatever is left of the join timeout
        let remaining = deadline.saturating_duration_since(Instant::now());
        if with_timeout(remaining, self.stack.wait_config_up())
            .await
            .is_err()
        {
            warn!("Associated but no DHCP lease, leaving");
            self.control.leave().await;
            return Err(LinkError::Timeout);
        }
        Ok(())
    }

    fn current_address(&self) -> Option<Ipv4Addr> {
        if !self.stack.is_link_up() {
            return None;
        }
        self.stack.config_v4().map(|config| config.address.address())
    }
}
