//! Market-data events consumed by the matching core
//!
//! Book snapshots carry separate ask/bid ladders with positive volume
//! magnitudes. Trade prints carry a signed volume: negative means a sell
//! print. Offers are ephemeral, reconstructed from each event.

use crate::types::market::MarketId;
use crate::types::types::Ts;
use serde::{Deserialize, Serialize};

/// One price/volume entry of an observed or synthesized counter-side ladder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Offer {
    /// Price count at the owning market's price basis
    pub price_count: i64,
    /// Volume count at the owning market's volume basis (magnitude)
    pub volume_count: i64,
    /// Observation timestamp
    pub ts: Ts,
}

impl Offer {
    /// Create an offer
    #[must_use]
    pub const fn new(price_count: i64, volume_count: i64, ts: Ts) -> Self {
        Self { price_count, volume_count, ts }
    }

    /// An offer with no remaining volume takes no further part in matching
    #[must_use]
    pub const fn is_exhausted(&self) -> bool {
        self.volume_count == 0
    }
}

/// Full observed book for one market at one instant
///
/// `asks` ascending by price, `bids` descending, as delivered by the feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookSnapshot {
    /// Market the snapshot belongs to
    pub market: MarketId,
    /// Snapshot timestamp
    pub ts: Ts,
    /// Sell-side ladder, best (lowest) price first
    pub asks: Vec<Offer>,
    /// Buy-side ladder, best (highest) price first
    pub bids: Vec<Offer>,
}

impl BookSnapshot {
    /// Create a snapshot from pre-sorted ladders
    #[must_use]
    pub const fn new(market: MarketId, ts: Ts, asks: Vec<Offer>, bids: Vec<Offer>) -> Self {
        Self { market, ts, asks, bids }
    }

    /// Best ask, if any
    #[must_use]
    pub fn best_ask(&self) -> Option<&Offer> {
        self.asks.first()
    }

    /// Best bid, if any
    #[must_use]
    pub fn best_bid(&self) -> Option<&Offer> {
        self.bids.first()
    }
}

/// A single observed trade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradePrint {
    /// Market the trade occurred on
    pub market: MarketId,
    /// Trade timestamp
    pub ts: Ts,
    /// Trade price count
    pub price_count: i64,
    /// Signed trade volume count; negative = sell print
    pub volume_count: i64,
}

impl TradePrint {
    /// Create a trade print
    #[must_use]
    pub const fn new(market: MarketId, ts: Ts, price_count: i64, volume_count: i64) -> Self {
        Self { market, ts, price_count, volume_count }
    }

    /// Whether this print was a sell (volume-negative)
    #[must_use]
    pub const fn is_sell(&self) -> bool {
        self.volume_count < 0
    }
}

/// Any market-data event the matching core consumes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MarketEvent {
    /// Order-book snapshot
    Book(BookSnapshot),
    /// Trade print
    Trade(TradePrint),
}

impl MarketEvent {
    /// Market the event belongs to
    #[must_use]
    pub const fn market(&self) -> MarketId {
        match self {
            Self::Book(book) => book.market,
            Self::Trade(trade) => trade.market,
        }
    }

    /// Event timestamp
    #[must_use]
    pub const fn ts(&self) -> Ts {
        match self {
            Self::Book(book) => book.ts,
            Self::Trade(trade) => trade.ts,
        }
    }
}
