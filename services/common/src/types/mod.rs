//! Canonical type definitions

pub mod events;
pub mod market;
pub mod types;

pub use events::{BookSnapshot, MarketEvent, Offer, TradePrint};
pub use market::{Market, MarketId, Side};
pub use types::{Amount, Ts};
