//! Snapshot publisher task

use defmt::*;
use embassy_time::{Duration, Ticker};

use vigia_core::net::Enqueued;
use vigia_core::telemetry::SnapshotPublisher;

use crate::shared::{Outbound, Store};

#[embassy_executor::task]
pub async fn snapshot_task(
    store: &'static Store,
    outbound: &'static Outbound,
    topic: &'static str,
    period: Duration,
) -> ! {
    let publisher = SnapshotPublisher::new(store, outbound, topic);
    info!("Snapshot publisher started: topic '{}', every {} ms", topic, period.as_millis());

    let mut ticker = Ticker::every(period);
    loop {
        ticker.next().await;

        match publisher.publish_once().await {
            Ok(report) => {
                if report.stale {
                    warn!("State store busy, publishing last fetched snapshot");
                }
                match report.enqueued {
                    Enqueued::Accepted => debug!("Snapshot queued ({} waiting)", outbound.len()),
                    Enqueued::Dropped => {
                        warn!("Outbound queue full, snapshot dropped ({} total)", outbound.dropped())
                    }
                }
            }
            Err(e) => error!("Snapshot encoding failed: {}", e),
        }
    }
}
