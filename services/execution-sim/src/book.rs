//! Per-market resting order books
//!
//! Each market owns one [`MarketBook`] with a locked BTreeMap per side.
//! Keys encode price-time priority: buy prices are stored negated so that
//! natural ascending key order walks both sides best-first; ties break on
//! the placement sequence. Market (no-limit) orders sort ahead of every
//! priced order on their side.
//!
//! Lock discipline: a side lock is always acquired before any order core
//! lock taken inside it, never the reverse.

use crate::order::{OrderSide, SpecificOrder};
use parking_lot::{Mutex, RwLock};
use rustc_hash::FxHashMap;
use services_common::MarketId;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::warn;

/// Key for order sorting (price-time priority)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderKey {
    /// Priority price (negated for buy orders to sort descending)
    pub price: i64,
    /// Placement sequence for time priority
    pub seq: u64,
}

impl Ord for OrderKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.price
            .cmp(&other.price)
            .then_with(|| self.seq.cmp(&other.seq))
    }
}

impl PartialOrd for OrderKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Compute the book key for an order
#[must_use]
pub fn key_for(order: &SpecificOrder) -> OrderKey {
    let price = match order.limit_price_count {
        // Market orders lead the queue on both sides.
        None => i64::MIN,
        Some(limit) => match order.side {
            OrderSide::Buy => -limit,
            OrderSide::Sell => limit,
        },
    };
    OrderKey { price, seq: order.sequence }
}

/// One side of a market's resting orders, walked best-first
pub type SideBook = BTreeMap<OrderKey, Arc<SpecificOrder>>;

/// Resting orders of a single market
#[derive(Debug)]
pub struct MarketBook {
    /// Market this book belongs to
    pub market: MarketId,
    bids: Mutex<SideBook>,
    asks: Mutex<SideBook>,
}

impl MarketBook {
    fn new(market: MarketId) -> Self {
        Self {
            market,
            bids: Mutex::new(BTreeMap::new()),
            asks: Mutex::new(BTreeMap::new()),
        }
    }

    /// The lock guarding one side's resting orders
    #[must_use]
    pub fn side(&self, side: OrderSide) -> &Mutex<SideBook> {
        match side {
            OrderSide::Buy => &self.bids,
            OrderSide::Sell => &self.asks,
        }
    }

    /// Whether both sides are empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bids.lock().is_empty() && self.asks.lock().is_empty()
    }

    /// Number of resting orders on one side
    #[must_use]
    pub fn len(&self, side: OrderSide) -> usize {
        self.side(side).lock().len()
    }
}

/// Registry of market books, created lazily on first order and retained for
/// the process lifetime
#[derive(Debug, Default)]
pub struct OrderBook {
    books: RwLock<FxHashMap<MarketId, Arc<MarketBook>>>,
}

impl OrderBook {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Book for a market, created on first use
    #[must_use]
    pub fn market_book(&self, market: MarketId) -> Arc<MarketBook> {
        if let Some(book) = self.books.read().get(&market) {
            return Arc::clone(book);
        }
        let mut books = self.books.write();
        Arc::clone(
            books
                .entry(market)
                .or_insert_with(|| Arc::new(MarketBook::new(market))),
        )
    }

    /// Book for a market, if one exists
    #[must_use]
    pub fn get(&self, market: MarketId) -> Option<Arc<MarketBook>> {
        self.books.read().get(&market).map(Arc::clone)
    }

    /// Insert an order into its market/side book
    ///
    /// An occupied key slot is an anomaly (sequences are unique); the insert
    /// is retried on the next sequence slot rather than dropping the order.
    pub fn submit(&self, order: &Arc<SpecificOrder>) {
        let book = self.market_book(order.market);
        let mut side = book.side(order.side).lock();
        let mut key = key_for(order);
        while side.contains_key(&key) {
            warn!(
                order_id = %order.id,
                market = %order.market,
                seq = key.seq,
                "book slot occupied, retrying insertion at next sequence"
            );
            key.seq += 1;
        }
        side.insert(key, Arc::clone(order));
    }

    /// Remove an order by identity; returns whether it was present
    pub fn remove(&self, order: &SpecificOrder) -> bool {
        let Some(book) = self.get(order.market) else {
            return false;
        };
        let mut side = book.side(order.side).lock();
        remove_resting(&mut side, order)
    }

    /// Snapshot one side's resting orders in priority order
    #[must_use]
    pub fn orders_for(&self, market: MarketId, side: OrderSide) -> Vec<Arc<SpecificOrder>> {
        match self.get(market) {
            Some(book) => book.side(side).lock().values().map(Arc::clone).collect(),
            None => Vec::new(),
        }
    }
}

/// Remove an order by identity from an already-locked side
///
/// Tries the computed key first; insertion retries can shift a key, so a
/// miss falls back to an id scan.
pub(crate) fn remove_resting(side: &mut SideBook, order: &SpecificOrder) -> bool {
    let key = key_for(order);
    if side.get(&key).is_some_and(|resting| resting.id == order.id) {
        side.remove(&key);
        return true;
    }
    let found = side
        .iter()
        .find(|(_, resting)| resting.id == order.id)
        .map(|(key, _)| *key);
    match found {
        Some(key) => side.remove(&key).is_some(),
        None => false,
    }
}
