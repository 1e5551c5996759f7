//! Publish worker task
//!
//! Establishes a broker session whenever the link is up, then drains the
//! outbound queue until the session or the link goes away.

use defmt::*;
use embassy_time::Timer;

use vigia_core::config::NodeConfig;
use vigia_core::net::{PublishWorker, PumpOutcome, SessionFailure, WorkerTiming};

use crate::mqtt::MqttConnector;
use vigia_core::net::{LinkStatus, SessionStatus};

use crate::shared::Outbound;

#[embassy_executor::task]
pub async fn publish_task(
    mut connector: MqttConnector,
    outbound: &'static Outbound,
    link: &'static LinkStatus,
    status: &'static SessionStatus,
    config: &'static NodeConfig,
) -> ! {
    let mut worker = PublishWorker::new(
        outbound,
        link,
        status,
        &config.broker,
        WorkerTiming::from_config(config),
    );
    let idle = config.periods.publish_idle();
    info!(
        "Publish worker started, broker {}:{}",
        config.broker.host.as_str(),
        config.broker.port
    );

    loop {
        match worker.establish(&mut connector).await {
            Ok(mut session) => {
                info!("Connected to broker as '{}'", config.broker.client_id.as_str());
                loop {
                    match worker.pump(&mut session).await {
                        PumpOutcome::Idle => {}
                        PumpOutcome::Pinged => trace!("Keep-alive ping answered"),
                        PumpOutcome::PingFailed(e) => warn!("Keep-alive ping failed: {}", e),
                        PumpOutcome::Published(message) => debug!(
                            "Published {} bytes on '{}'",
                            message.payload.len(),
                            message.topic.as_str()
                        ),
                        PumpOutcome::Failed(message, e) => warn!(
                            "Publish on '{}' failed: {}",
                            message.topic.as_str(),
                            e
                        ),
                        PumpOutcome::SessionLost(Some(_)) => {
                            warn!("Broker session lost, message dropped");
                            break;
                        }
                        PumpOutcome::SessionLost(None) => {
                            warn!("Broker stopped answering keep-alive pings");
                            break;
                        }
                        PumpOutcome::LinkLost => {
                            warn!("Link down, closing broker session");
                            break;
                        }
                        PumpOutcome::NotConnected => break,
                    }
                    Timer::after(idle).await;
                }
            }
            // Waiting for the link task
            Err(SessionFailure::LinkDown) => Timer::after(idle).await,
            Err(e) => {
                warn!("Broker session failed: {}", e);
                Timer::after(idle).await;
            }
        }
    }
}
