//! Board-agnostic core logic for the Vigia sensor telemetry node
//!
//! This crate contains all application logic that does not depend on
//! specific hardware implementations:
//!
//! - Collaborator traits (sensors, display, Wi-Fi link, broker transport)
//! - Bus arbitration for the shared sensor I2C bus
//! - Shared state store and snapshots
//! - Sensor producer cycles and field policies (light threshold, collision latch)
//! - Outbound message queue
//! - Link and broker session state machines, publish worker
//! - Telemetry payload encoding and display layout
//! - Configuration types and parser
//!
//! Everything here is generic over the embassy-sync raw mutex, so the same
//! code runs under `CriticalSectionRawMutex` on the Pico W and under
//! `NoopRawMutex` in host tests.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod bus;
pub mod config;
pub mod display;
pub mod net;
pub mod sensors;
pub mod state;
pub mod telemetry;
pub mod traits;
