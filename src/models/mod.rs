//! Domain models shared across the whole relay.

pub mod event;
pub mod stats;
pub mod trade;

pub use event::TradeEvent;
pub use stats::{Stats, Window};
pub use trade::{Direction, Level, Trade};
