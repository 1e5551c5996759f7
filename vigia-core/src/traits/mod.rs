//! Collaborator traits
//!
//! These traits define the interface between the application logic
//! and hardware-specific implementations.

pub mod broker;
pub mod display;
pub mod link;
pub mod sensor;

pub use broker::{BrokerConnector, BrokerSession, ConnectError, PublishError, ResolveError};
pub use display::{DisplayError, TextDisplay};
pub use link::{LinkDriver, LinkError};
pub use sensor::{Acceleration, Sensor, SensorError, ThermalReading};
