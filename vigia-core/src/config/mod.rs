//! Node configuration
//!
//! Static configuration for the node: Wi-Fi credentials, broker endpoint,
//! task periods and field policy thresholds. Embedded in the firmware image
//! as TOML and parsed once at boot.

mod parser;
mod types;

pub use parser::*;
pub use types::*;
