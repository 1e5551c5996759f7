//! Broker session state machine
//!
//! Owned by the publish worker; the display reads it through
//! [`SessionStatus`].

use core::sync::atomic::{AtomicU8, Ordering};

/// Broker session states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConnectionState {
    Disconnected,
    /// Looking up the broker host
    Resolving,
    /// Opening the session
    Connecting,
    /// Session open, draining the queue
    Connected,
}

/// Session events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SessionEvent {
    /// Start resolving the broker host
    Resolve,
    /// Host resolved
    Resolved,
    /// Resolution failed
    ResolveFailed,
    /// Broker accepted the session
    ConnectAccepted,
    /// Connection failed or broker refused
    ConnectFailed,
    /// Open session closed under us
    SessionLost,
    /// Wi-Fi link went down
    LinkLost,
    /// Owner abandoned the session
    Reset,
}

impl ConnectionState {
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionState::Connected)
    }

    /// Process an event and return the next state
    pub fn transition(self, event: SessionEvent) -> Self {
        use ConnectionState::*;
        use SessionEvent::*;

        match (self, event) {
            (Disconnected, Resolve) => Resolving,

            (Resolving, Resolved) => Connecting,
            (Resolving, ResolveFailed) => Disconnected,

            (Connecting, ConnectAccepted) => Connected,
            (Connecting, ConnectFailed) => Disconnected,

            (Connected, SessionLost) => Disconnected,

            (_, LinkLost | Reset) => Disconnected,

            (state, _) => state,
        }
    }

    fn to_raw(self) -> u8 {
        match self {
            ConnectionState::Disconnected => 0,
            ConnectionState::Resolving => 1,
            ConnectionState::Connecting => 2,
            ConnectionState::Connected => 3,
        }
    }

    fn from_raw(raw: u8) -> Self {
        match raw {
            1 => ConnectionState::Resolving,
            2 => ConnectionState::Connecting,
            3 => ConnectionState::Connected,
            _ => ConnectionState::Disconnected,
        }
    }
}

/// Lock-free read-only view of the session state
pub struct SessionStatus {
    state: AtomicU8,
}

impl SessionStatus {
    pub const fn new() -> Self {
        Self {
            state: AtomicU8::new(0),
        }
    }

    pub fn get(&self) -> ConnectionState {
        ConnectionState::from_raw(self.state.load(Ordering::Acquire))
    }

    pub fn is_connected(&self) -> bool {
        self.get().is_connected()
    }

    pub(crate) fn set(&self, state: ConnectionState) {
        self.state.store(state.to_raw(), Ordering::Release);
    }
}

impl Default for SessionStatus {
    fn default() -> Self {
        Self::new()
    }
}
