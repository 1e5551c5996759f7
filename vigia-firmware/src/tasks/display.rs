//! Display refresher task

use defmt::*;
use embassy_time::{Duration, Ticker};

use vigia_core::display::DisplayRefresher;
use vigia_core::net::{LinkStatus, SessionStatus};

use crate::shared::{Oled, Store};

#[embassy_executor::task]
pub async fn display_task(
    mut oled: Oled,
    store: &'static Store,
    link: &'static LinkStatus,
    session: &'static SessionStatus,
    period: Duration,
) -> ! {
    let refresher = DisplayRefresher::new(store, link, session);
    let mut failing = false;

    let mut ticker = Ticker::every(period);
    loop {
        match refresher.refresh(&mut oled).await {
            Ok(_) if failing => {
                info!("Display recovered");
                failing = false;
            }
            Ok(view) => trace!("Display refreshed (stale: {})", view.fetched.stale),
            // Logged once per outage
            Err(e) if !failing => {
                warn!("Display refresh failed: {}", e);
                failing = true;
            }
            Err(_) => {}
        }
        ticker.next().await;
    }
}
