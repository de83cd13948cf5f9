//! Shared types, constants and helpers used across docbridge.

mod constants;
mod event_bus;
mod sort_order;
mod util;

pub use constants::*;
pub use event_bus::*;
pub use sort_order::*;
pub use util::*;
