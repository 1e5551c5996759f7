//! Telemetry payload and snapshot publisher
//!
//! Payload format, fixed field order, one decimal:
//!
//! ```text
//! {"temperatura": 23.4, "umidade": 55.2, "caixa": "fechada", "colisao": "nao"}
//! ```

use core::fmt::Write;

use embassy_sync::blocking_mutex::raw::RawMutex;
use heapless::String;

use crate::net::{Enqueued, OutboundQueue, OutgoingMessage, MAX_PAYLOAD_LEN};
use crate::state::{SharedStateStore, StateSnapshot};

/// Telemetry errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TelemetryError {
    /// Payload did not fit the message buffer
    Overflow,
}

/// Serialize a snapshot to the telemetry JSON payload
pub fn encode_snapshot(
    snapshot: &StateSnapshot,
) -> Result<String<MAX_PAYLOAD_LEN>, TelemetryError> {
    let mut payload = String::new();
    write!(
        payload,
        "{{\"temperatura\": {:.1}, \"umidade\": {:.1}, \"caixa\": \"{}\", \"colisao\": \"{}\"}}",
        snapshot.temperature_c,
        snapshot.humidity_pct,
        if snapshot.opened { "aberta" } else { "fechada" },
        if snapshot.collision { "SIM" } else { "nao" },
    )
    .map_err(|_| TelemetryError::Overflow)?;
    Ok(payload)
}

/// What one publisher tick did
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PublishReport {
    pub snapshot: StateSnapshot,
    /// Snapshot came from the fallback copy after a store timeout
    pub stale: bool,
    pub enqueued: Enqueued,
}

/// Periodically turns the state into an outgoing message
pub struct SnapshotPublisher<'a, SM: RawMutex, QM: RawMutex, const N: usize> {
    store: &'a SharedStateStore<SM>,
    queue: &'a OutboundQueue<QM, N>,
    topic: &'a str,
}

impl<'a, SM: RawMutex, QM: RawMutex, const N: usize> SnapshotPublisher<'a, SM, QM, N> {
    pub fn new(
        store: &'a SharedStateStore<SM>,
        queue: &'a OutboundQueue<QM, N>,
        topic: &'a str,
    ) -> Self {
        Self {
            store,
            queue,
            topic,
        }
    }

    /// Snapshot, encode and enqueue once
    ///
    /// A full queue drops the message; there is no retry.
    pub async fn publish_once(&self) -> Result<PublishReport, TelemetryError> {
        let fetched = self.store.fetch().await;
        let payload = encode_snapshot(&fetched.snapshot)?;
        let enqueued = self.queue.enqueue(OutgoingMessage::new(self.topic, &payload));
        Ok(PublishReport {
            snapshot: fetched.snapshot,
            stale: fetched.stale,
            enqueued,
        })
    }
}
