//! Sensor producers
//!
//! A producer pairs a [`Sensor`](crate::traits::Sensor) with a
//! [`FieldPolicy`] that turns raw readings into state fields.

mod policy;
mod producer;

pub use policy::*;
pub use producer::*;
