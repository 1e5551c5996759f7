//! Embassy async tasks
//!
//! Each task is a loop of one unit of work and a bounded sleep. Tasks share
//! the state store, the sensor bus and the status cells by `'static`
//! reference; nothing else is shared.

pub mod display;
pub mod link;
pub mod net;
pub mod producers;
pub mod publish;
pub mod snapshot;

pub use display::display_task;
pub use link::link_task;
pub use net::{cyw43_task, net_task};
pub use producers::{light_task, motion_task, thermal_task};
pub use publish::publish_task;
pub use snapshot::snapshot_task;
