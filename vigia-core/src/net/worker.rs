//! Publish worker
//!
//! Drives the broker session: resolve, connect, then drain the outbound
//! queue with at-most-once delivery. Nothing is dequeued unless the session
//! is connected, and a lost link or session always falls back to
//! `Disconnected`.

use core::net::Ipv4Addr;

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_time::{Duration, Instant, Timer};

use super::link::LinkStatus;
use super::message::OutgoingMessage;
use super::queue::{OutboundQueue, QueueError};
use super::session::{ConnectionState, SessionEvent, SessionStatus};
use crate::config::{BrokerConfig, NodeConfig};
use crate::traits::{BrokerConnector, BrokerSession, ConnectError, PublishError, ResolveError};

/// Why a session could not be established
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SessionFailure {
    /// Wi-Fi link is down; nothing was attempted
    LinkDown,
    Resolve(ResolveError),
    Connect(ConnectError),
}

/// Result of one [`PublishWorker::pump`]
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PumpOutcome {
    /// Session not connected; the queue was not touched
    NotConnected,
    /// Link went down; session abandoned
    LinkLost,
    /// Nothing queued within the dequeue timeout
    Idle,
    /// Nothing queued; keep-alive ping answered
    Pinged,
    /// Keep-alive ping failed, session still up
    PingFailed(PublishError),
    /// Message handed to the broker
    Published(OutgoingMessage),
    /// Message lost, session still up
    Failed(OutgoingMessage, PublishError),
    /// Session closed; carries the message lost with it, if one was in flight
    SessionLost(Option<OutgoingMessage>),
}

/// Worker timing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerTiming {
    /// Maximum wait for a queued message
    pub dequeue_timeout: Duration,
    /// Pause after a failed resolve or connect
    pub retry_delay: Duration,
    /// Silence after which an idle session pings the broker; `None` when
    /// keep-alive is disabled
    pub ping_interval: Option<Duration>,
}

impl WorkerTiming {
    pub fn from_config(config: &NodeConfig) -> Self {
        Self {
            dequeue_timeout: config.periods.dequeue_timeout(),
            retry_delay: config.broker.retry_delay(),
            ping_interval: config.broker.ping_interval(),
        }
    }
}

/// Owns the broker session state machine
pub struct PublishWorker<'a, M: RawMutex, const N: usize> {
    queue: &'a OutboundQueue<M, N>,
    link: &'a LinkStatus,
    status: &'a SessionStatus,
    broker: &'a BrokerConfig,
    timing: WorkerTiming,
    state: ConnectionState,
    /// When the session last carried a packet to the broker
    last_sent: Instant,
}

impl<'a, M: RawMutex, const N: usize> PublishWorker<'a, M, N> {
    pub fn new(
        queue: &'a OutboundQueue<M, N>,
        link: &'a LinkStatus,
        status: &'a SessionStatus,
        broker: &'a BrokerConfig,
        timing: WorkerTiming,
    ) -> Self {
        status.set(ConnectionState::Disconnected);
        Self {
            queue,
            link,
            status,
            broker,
            timing,
            state: ConnectionState::Disconnected,
            last_sent: Instant::now(),
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    fn apply(&mut self, event: SessionEvent) {
        self.state = self.state.transition(event);
        self.status.set(self.state);
    }

    /// Resolve and connect, yielding the open session
    ///
    /// On a resolve or connect failure the worker is back in
    /// `Disconnected` and has already waited the retry delay.
    pub async fn establish<'c, C: BrokerConnector>(
        &mut self,
        connector: &'c mut C,
    ) -> Result<C::Session<'c>, SessionFailure> {
        if !self.link.is_up() {
            self.apply(SessionEvent::LinkLost);
            return Err(SessionFailure::LinkDown);
        }

        // Previous session dropped by the caller, or an attempt cancelled
        if self.state != ConnectionState::Disconnected {
            self.apply(SessionEvent::Reset);
        }

        self.apply(SessionEvent::Resolve);
        let address = match self.resolve(connector).await {
            Ok(address) => address,
            Err(e) => {
                self.apply(SessionEvent::ResolveFailed);
                Timer::after(self.timing.retry_delay).await;
                return Err(SessionFailure::Resolve(e));
            }
        };
        self.apply(SessionEvent::Resolved);

        match connector.connect(address, self.broker).await {
            Ok(session) => {
                self.apply(SessionEvent::ConnectAccepted);
                self.last_sent = Instant::now();
                Ok(session)
            }
            Err(e) => {
                self.apply(SessionEvent::ConnectFailed);
                Timer::after(self.timing.retry_delay).await;
                Err(SessionFailure::Connect(e))
            }
        }
    }

    /// Dotted-quad hosts skip the lookup
    async fn resolve<C: BrokerConnector>(
        &self,
        connector: &mut C,
    ) -> Result<Ipv4Addr, ResolveError> {
        match self.broker.host.parse::<Ipv4Addr>() {
            Ok(address) => Ok(address),
            Err(_) => connector.resolve(&self.broker.host).await,
        }
    }

    /// Transmit at most one queued message
    ///
    /// Returns without touching the queue unless connected. When nothing is
    /// queued and the session has been silent for the ping interval, pings
    /// the broker instead so it does not drop the session.
    pub async fn pump<S: BrokerSession>(&mut self, session: &mut S) -> PumpOutcome {
        if !self.state.is_connected() {
            return PumpOutcome::NotConnected;
        }
        if !self.link.is_up() {
            self.apply(SessionEvent::LinkLost);
            return PumpOutcome::LinkLost;
        }

        let message = match self.queue.dequeue(self.timing.dequeue_timeout).await {
            Ok(message) => message,
            Err(QueueError::Empty) => return self.keep_alive(session).await,
        };

        match session
            .publish(&message.topic, message.payload.as_bytes())
            .await
        {
            Ok(()) => {
                self.last_sent = Instant::now();
                PumpOutcome::Published(message)
            }
            Err(PublishError::SessionLost) => {
                self.apply(SessionEvent::SessionLost);
                PumpOutcome::SessionLost(Some(message))
            }
            Err(e) => PumpOutcome::Failed(message, e),
        }
    }

    async fn keep_alive<S: BrokerSession>(&mut self, session: &mut S) -> PumpOutcome {
        let due = match self.timing.ping_interval {
            Some(interval) => self.last_sent.elapsed() >= interval,
            None => false,
        };
        if !due {
            return PumpOutcome::Idle;
        }

        match session.ping().await {
            Ok(()) => {
                self.last_sent = Instant::now();
                PumpOutcome::Pinged
            }
            Err(PublishError::SessionLost) => {
                self.apply(SessionEvent::SessionLost);
                PumpOutcome::SessionLost(None)
            }
            Err(e) => PumpOutcome::PingFailed(e),
        }
    }
}
