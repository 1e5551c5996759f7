//! Shared sensor state
//!
//! Producers write derived fields into one [`SharedStateStore`]; the
//! snapshot publisher and the display read consistent [`StateSnapshot`]s.

mod field;
mod store;

pub use field::*;
pub use store::*;
