//! Wi-Fi link state machine
//!
//! The connectivity manager owns the link state. Other tasks read it
//! through [`LinkStatus`] without blocking.

use core::net::Ipv4Addr;
use core::sync::atomic::{AtomicU8, Ordering};

use crate::config::LinkConfig;
use crate::traits::{LinkDriver, LinkError};

/// Link-layer states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkState {
    /// Not associated
    Down,
    /// Join in progress
    Associating,
    /// Associated with an address
    Up,
}

/// Link events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkEvent {
    /// Start a join attempt
    Associate,
    /// Join succeeded
    Associated,
    /// Join failed or timed out
    AssociationFailed,
    /// Address no longer assigned
    AddressLost,
}

impl LinkState {
    pub fn is_up(&self) -> bool {
        matches!(self, LinkState::Up)
    }

    /// Process an event and return the next state
    pub fn transition(self, event: LinkEvent) -> Self {
        use LinkEvent::*;
        use LinkState::*;

        match (self, event) {
            (Down, Associate) => Associating,
            (Associating, Associated) => Up,
            (Associating, AssociationFailed) => Down,
            (Up, AddressLost) => Down,
            // Everything else is ignored
            (state, _) => state,
        }
    }

    fn to_raw(self) -> u8 {
        match self {
            LinkState::Down => 0,
            LinkState::Associating => 1,
            LinkState::Up => 2,
        }
    }

    fn from_raw(raw: u8) -> Self {
        match raw {
            1 => LinkState::Associating,
            2 => LinkState::Up,
            _ => LinkState::Down,
        }
    }
}

/// Lock-free read-only view of the link state
pub struct LinkStatus {
    state: AtomicU8,
}

impl LinkStatus {
    pub const fn new() -> Self {
        Self {
            state: AtomicU8::new(0),
        }
    }

    pub fn get(&self) -> LinkState {
        LinkState::from_raw(self.state.load(Ordering::Acquire))
    }

    pub fn is_up(&self) -> bool {
        self.get().is_up()
    }

    pub(crate) fn set(&self, state: LinkState) {
        self.state.store(state.to_raw(), Ordering::Release);
    }
}

impl Default for LinkStatus {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of one [`ConnectivityManager::poll`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkOutcome {
    /// Link was up and still has an address
    StillUp,
    /// Join succeeded
    Joined(Option<Ipv4Addr>),
    /// Join failed; retry on the next poll
    JoinFailed(LinkError),
    /// Address lost; the link is down again
    Lost,
}

/// Maintains Wi-Fi association
///
/// Call [`poll`](Self::poll) every retry interval.
pub struct ConnectivityManager<'a> {
    config: &'a LinkConfig,
    status: &'a LinkStatus,
    state: LinkState,
}

impl<'a> ConnectivityManager<'a> {
    pub fn new(config: &'a LinkConfig, status: &'a LinkStatus) -> Self {
        status.set(LinkState::Down);
        Self {
            config,
            status,
            state: LinkState::Down,
        }
    }

    pub fn state(&self) -> LinkState {
        self.state
    }

    fn apply(&mut self, event: LinkEvent) {
        self.state = self.state.transition(event);
        self.status.set(self.state);
    }

    /// Check the link, joining if it is down
    pub async fn poll<L: LinkDriver>(&mut self, link: &mut L) -> LinkOutcome {
        if self.state.is_up() {
            if link.current_address().is_some() {
                return LinkOutcome::StillUp;
            }
            self.apply(LinkEvent::AddressLost);
            return LinkOutcome::Lost;
        }

        self.apply(LinkEvent::Associate);
        match link
            .join(
                &self.config.ssid,
                &self.config.password,
                self.config.join_timeout(),
            )
            .await
        {
            Ok(()) => {
                self.apply(LinkEvent::Associated);
                LinkOutcome::Joined(link.current_address())
            }
            Err(e) => {
                self.apply(LinkEvent::AssociationFailed);
                LinkOutcome::JoinFailed(e)
            }
        }
    }
}
