//! Connectivity manager task

use defmt::*;
use embassy_time::Timer;

use vigia_core::config::LinkConfig;
use vigia_core::net::{ConnectivityManager, LinkOutcome, LinkStatus};

use crate::wifi::CywLink;

#[embassy_executor::task]
pub async fn link_task(
    mut link: CywLink,
    status: &'static LinkStatus,
    config: &'static LinkConfig,
) -> ! {
    let mut manager = ConnectivityManager::new(config, status);
    info!("Link task started, joining '{}'", config.ssid.as_str());

    loop {
        match manager.poll(&mut link).await {
            LinkOutcome::StillUp => trace!("Link up"),
            LinkOutcome::Joined(Some(address)) => {
                info!("Wi-Fi up, address {}", Debug2Format(&address))
            }
            LinkOutcome::Joined(None) => info!("Wi-Fi up"),
            LinkOutcome::JoinFailed(e) => warn!(
                "Wi-Fi join failed ({}), retrying in {} ms",
                e, config.retry_interval_ms
            ),
            LinkOutcome::Lost => warn!("Wi-Fi address lost"),
        }
        Timer::after(config.retry_interval()).await;
    }
}
