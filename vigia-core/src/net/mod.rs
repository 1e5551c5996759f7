//! Network side of the node
//!
//! - [`OutboundQueue`]: bounded hand-off from the snapshot publisher
//! - [`ConnectivityManager`]: Wi-Fi association and retry
//! - [`PublishWorker`]: broker session state machine and queue draining

mod link;
mod message;
mod queue;
mod session;
mod worker;

pub use link::*;
pub use message::*;
pub use queue::*;
pub use session::*;
pub use worker::*;
