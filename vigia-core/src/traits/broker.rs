//! Broker transport traits
//!
//! The publish worker drives the session lifecycle; implementations only
//! provide name resolution, session establishment, QoS 0 publishing and
//! keep-alive pings.
//!
//! A session borrows its connector (socket and packet buffers live in the
//! connector), so only one session exists at a time and dropping it closes
//! the connection.

use core::net::Ipv4Addr;

use crate::config::BrokerConfig;

/// Name resolution errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ResolveError {
    /// Query failed or timed out
    Dns,
    /// Query succeeded but returned no IPv4 address
    NoAddress,
}

/// Session establishment errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConnectError {
    /// TCP connection could not be opened
    Socket,
    /// Broker did not answer in time
    Timeout,
    /// Broker refused the connection with the given reason code
    Refused(u8),
    /// Malformed or unexpected packet
    Protocol,
}

/// Publish errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PublishError {
    /// Message could not be encoded or exceeds the packet buffer
    Encoding,
    /// Write failed but the session may still be usable
    Transport,
    /// Connection closed; the session must be re-established
    SessionLost,
}

/// Opens broker sessions
#[allow(async_fn_in_trait)]
pub trait BrokerConnector {
    /// Live session, borrowing the connector's buffers
    type Session<'a>: BrokerSession
    where
        Self: 'a;

    /// Resolve the broker host name
    async fn resolve(&mut self, host: &str) -> Result<Ipv4Addr, ResolveError>;

    /// Open a session with the client identity and keep-alive from `broker`
    async fn connect(
        &mut self,
        address: Ipv4Addr,
        broker: &BrokerConfig,
    ) -> Result<Self::Session<'_>, ConnectError>;
}

/// An established broker session
#[allow(async_fn_in_trait)]
pub trait BrokerSession {
    /// Publish `payload` on `topic` at most once (QoS 0, no retain)
    async fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), PublishError>;

    /// Send a keep-alive ping and wait for the broker's answer
    async fn ping(&mut self) -> Result<(), PublishError>;
}
