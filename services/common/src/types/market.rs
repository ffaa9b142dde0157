//! Market identity and per-market count scaling

use crate::types::types::Amount;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a tradable instrument (one venue listing)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MarketId(pub u32);

impl MarketId {
    /// Create a new market id
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }
}

impl fmt::Display for MarketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MKT_{}", self.0)
    }
}

/// Side of the order book
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum Side {
    /// Buy side (bid)
    Bid,
    /// Sell side (ask/offer)
    Ask,
}

/// A tradable market: venue listing plus the bases used to interpret all
/// price and volume counts for that market
///
/// Immutable once registered. Synthetic markets are excluded from matching.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Market {
    /// Market identifier
    pub id: MarketId,
    /// Venue code (e.g. exchange short name)
    pub venue: String,
    /// Listing symbol at the venue
    pub symbol: String,
    /// Scale factor for price counts
    pub price_basis: i64,
    /// Scale factor for volume counts
    pub volume_basis: i64,
    /// Synthetic markets never reach the matching core
    pub synthetic: bool,
}

impl Market {
    /// Create a real (non-synthetic) market
    #[must_use]
    pub fn new(
        id: MarketId,
        venue: impl Into<String>,
        symbol: impl Into<String>,
        price_basis: i64,
        volume_basis: i64,
    ) -> Self {
        Self {
            id,
            venue: venue.into(),
            symbol: symbol.into(),
            price_basis,
            volume_basis,
            synthetic: false,
        }
    }

    /// Mark the market as synthetic
    #[must_use]
    pub fn synthetic(mut self) -> Self {
        self.synthetic = true;
        self
    }

    /// Interpret a raw count as a price amount of this market
    #[must_use]
    pub const fn price(&self, count: i64) -> Amount {
        Amount::new(count, self.price_basis)
    }

    /// Interpret a raw count as a volume amount of this market
    #[must_use]
    pub const fn volume(&self, count: i64) -> Amount {
        Amount::new(count, self.volume_basis)
    }
}

impl fmt::Display for Market {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.venue, self.symbol)
    }
}
