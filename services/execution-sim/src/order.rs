//! Order and fill definitions
//!
//! A [`SpecificOrder`] splits into immutable terms, fixed at submission, and
//! a mutable core (state, remaining volume, fill history) behind the order's
//! own lock. Volume counts are signed by side: positive for buys, negative
//! for sells; helpers expose magnitudes.

use parking_lot::{Mutex, MutexGuard};
use serde::{Deserialize, Serialize};
use services_common::{Amount, MarketId, Ts};
use std::fmt;
use uuid::Uuid;

/// Unique order identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderId(pub Uuid);

impl OrderId {
    /// Generate a fresh order id
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for OrderId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique fill identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FillId(pub Uuid);

impl FillId {
    /// Generate a fresh fill id
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for FillId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for FillId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Order side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderSide {
    /// Buy order (rests on the bid side)
    Buy,
    /// Sell order (rests on the ask side)
    Sell,
}

impl OrderSide {
    /// Sign applied to volume counts on this side
    #[must_use]
    pub const fn sign(&self) -> i64 {
        match self {
            Self::Buy => 1,
            Self::Sell => -1,
        }
    }
}

/// How the order fills
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FillKind {
    /// Take whatever the counter side offers
    Market,
    /// Fill only at the limit price or better
    Limit,
}

/// Order lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderState {
    /// Created, not yet placed into the book
    New,
    /// Resting in the book, no fills yet
    Placed,
    /// Resting in the book with partial executions
    PartFilled,
    /// Handed to an external venue, not matched locally
    Routed,
    /// Cancel requested, removal in progress
    Cancelling,
    /// Completely executed
    Filled,
    /// Cancelled before completion
    Cancelled,
    /// Refused at submission or during cancellation
    Rejected,
}

impl OrderState {
    /// Open states may still transition
    #[must_use]
    pub const fn is_open(&self) -> bool {
        matches!(
            self,
            Self::New | Self::Placed | Self::PartFilled | Self::Routed | Self::Cancelling
        )
    }

    /// Terminal states never transition again
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Filled | Self::Cancelled | Self::Rejected)
    }
}

/// Outcome of a cancel request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelOutcome {
    /// Order removed from the book and cancelled
    Cancelled,
    /// Order was concurrently executed to completion; nothing left to cancel
    AlreadyResolved,
    /// Order was open but absent from the book — inconsistency, reported not hidden
    NotFound,
}

/// Request to create an order
///
/// Volume is a positive magnitude; the side supplies the sign.
#[derive(Debug, Clone)]
pub struct OrderRequest {
    /// Market to trade
    pub market: MarketId,
    /// Buy or sell
    pub side: OrderSide,
    /// Market or limit execution
    pub kind: FillKind,
    /// Limit price count (required for limit orders)
    pub limit_price_count: Option<i64>,
    /// Stop price count (not supported; rejected at submission)
    pub stop_price_count: Option<i64>,
    /// Requested volume magnitude
    pub volume_count: i64,
    /// Owning portfolio
    pub portfolio: String,
}

impl OrderRequest {
    /// Limit order request
    #[must_use]
    pub fn limit(
        market: MarketId,
        side: OrderSide,
        limit_price_count: i64,
        volume_count: i64,
        portfolio: impl Into<String>,
    ) -> Self {
        Self {
            market,
            side,
            kind: FillKind::Limit,
            limit_price_count: Some(limit_price_count),
            stop_price_count: None,
            volume_count,
            portfolio: portfolio.into(),
        }
    }

    /// Market order request
    #[must_use]
    pub fn market(
        market: MarketId,
        side: OrderSide,
        volume_count: i64,
        portfolio: impl Into<String>,
    ) -> Self {
        Self {
            market,
            side,
            kind: FillKind::Market,
            limit_price_count: None,
            stop_price_count: None,
            volume_count,
            portfolio: portfolio.into(),
        }
    }
}

/// Mutable order state, guarded by the order's own lock
#[derive(Debug)]
pub(crate) struct OrderCore {
    pub(crate) state: OrderState,
    pub(crate) remaining_volume_count: i64,
    pub(crate) fills: Vec<Fill>,
}

/// A resting client order
#[derive(Debug)]
pub struct SpecificOrder {
    /// Order identifier
    pub id: OrderId,
    /// Market the order trades
    pub market: MarketId,
    /// Buy or sell
    pub side: OrderSide,
    /// Market or limit execution
    pub kind: FillKind,
    /// Limit price count, if any
    pub limit_price_count: Option<i64>,
    /// Stop price count, if any (never accepted into the book)
    pub stop_price_count: Option<i64>,
    /// Signed requested volume count
    pub volume_count: i64,
    /// Creation timestamp
    pub created_at: Ts,
    /// Placement timestamp; equals creation for directly submitted orders
    pub entry_time: Ts,
    /// Placement sequence, the time-priority tie-break
    pub sequence: u64,
    /// Owning portfolio
    pub portfolio: String,
    core: Mutex<OrderCore>,
}

impl SpecificOrder {
    /// Build an order from a request at placement time
    #[must_use]
    pub fn new(request: &OrderRequest, sequence: u64, entry_time: Ts) -> Self {
        let signed_volume = request.side.sign() * request.volume_count.abs();
        Self {
            id: OrderId::new(),
            market: request.market,
            side: request.side,
            kind: request.kind,
            limit_price_count: request.limit_price_count,
            stop_price_count: request.stop_price_count,
            volume_count: signed_volume,
            created_at: entry_time,
            entry_time,
            sequence,
            portfolio: request.portfolio.clone(),
            core: Mutex::new(OrderCore {
                state: OrderState::New,
                remaining_volume_count: signed_volume,
                fills: Vec::new(),
            }),
        }
    }

    /// Rebuild an order from a persisted record
    #[must_use]
    pub fn from_record(record: OrderRecord) -> Self {
        Self {
            id: record.id,
            market: record.market,
            side: record.side,
            kind: record.kind,
            limit_price_count: record.limit_price_count,
            stop_price_count: record.stop_price_count,
            volume_count: record.volume_count,
            created_at: record.created_at,
            entry_time: record.entry_time,
            sequence: record.sequence,
            portfolio: record.portfolio,
            core: Mutex::new(OrderCore {
                state: record.state,
                remaining_volume_count: record.remaining_volume_count,
                fills: record.fills,
            }),
        }
    }

    pub(crate) fn core(&self) -> MutexGuard<'_, OrderCore> {
        self.core.lock()
    }

    /// Current lifecycle state
    #[must_use]
    pub fn state(&self) -> OrderState {
        self.core.lock().state
    }

    /// Signed remaining volume count
    #[must_use]
    pub fn remaining_volume_count(&self) -> i64 {
        self.core.lock().remaining_volume_count
    }

    /// Executed (filled) signed volume count
    #[must_use]
    pub fn executed_volume_count(&self) -> i64 {
        let core = self.core.lock();
        self.volume_count - core.remaining_volume_count
    }

    /// Snapshot of the fill history
    #[must_use]
    pub fn fills(&self) -> Vec<Fill> {
        self.core.lock().fills.clone()
    }

    /// Whether the order is still open
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.state().is_open()
    }

    /// Whether this is a buy order
    #[must_use]
    pub const fn is_bid(&self) -> bool {
        matches!(self.side, OrderSide::Buy)
    }

    /// Volume-weighted average fill price count
    #[must_use]
    pub fn average_fill_price_count(&self) -> Option<i64> {
        let core = self.core.lock();
        if core.fills.is_empty() {
            return None;
        }
        let total_value: i128 = core
            .fills
            .iter()
            .map(|f| i128::from(f.price_count) * i128::from(f.volume_count.abs()))
            .sum();
        let total_volume: i128 = core.fills.iter().map(|f| i128::from(f.volume_count.abs())).sum();
        if total_volume > 0 {
            i64::try_from(total_value / total_volume).ok()
        } else {
            None
        }
    }

    /// Serializable snapshot for the persistence collaborator
    #[must_use]
    pub fn to_record(&self) -> OrderRecord {
        let core = self.core.lock();
        OrderRecord {
            id: self.id,
            market: self.market,
            side: self.side,
            kind: self.kind,
            limit_price_count: self.limit_price_count,
            stop_price_count: self.stop_price_count,
            volume_count: self.volume_count,
            remaining_volume_count: core.remaining_volume_count,
            state: core.state,
            created_at: self.created_at,
            entry_time: self.entry_time,
            sequence: self.sequence,
            portfolio: self.portfolio.clone(),
            fills: core.fills.clone(),
        }
    }
}

/// Persisted snapshot of an order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRecord {
    /// Order identifier
    pub id: OrderId,
    /// Market the order trades
    pub market: MarketId,
    /// Buy or sell
    pub side: OrderSide,
    /// Market or limit execution
    pub kind: FillKind,
    /// Limit price count, if any
    pub limit_price_count: Option<i64>,
    /// Stop price count, if any
    pub stop_price_count: Option<i64>,
    /// Signed requested volume count
    pub volume_count: i64,
    /// Signed remaining volume count
    pub remaining_volume_count: i64,
    /// Lifecycle state at snapshot time
    pub state: OrderState,
    /// Creation timestamp
    pub created_at: Ts,
    /// Placement timestamp
    pub entry_time: Ts,
    /// Placement sequence
    pub sequence: u64,
    /// Owning portfolio
    pub portfolio: String,
    /// Fill history at snapshot time
    pub fills: Vec<Fill>,
}

/// Some completion of an order
///
/// The fill volume may be less than the order's requested volume. Immutable
/// once created except for commission attachment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fill {
    /// Fill identifier
    pub id: FillId,
    /// Parent order
    pub order_id: OrderId,
    /// Market the fill executed on
    pub market: MarketId,
    /// Execution timestamp (the observed data time)
    pub ts: Ts,
    /// Execution price count
    pub price_count: i64,
    /// Signed fill volume count (same sign as the order side)
    pub volume_count: i64,
    /// Commission attached during post-processing
    pub commission: Option<Amount>,
}

impl Fill {
    /// Create a fill without commission
    #[must_use]
    pub fn new(order_id: OrderId, market: MarketId, ts: Ts, price_count: i64, volume_count: i64) -> Self {
        Self {
            id: FillId::new(),
            order_id,
            market,
            ts,
            price_count,
            volume_count,
            commission: None,
        }
    }

    /// Fill volume magnitude
    #[must_use]
    pub const fn volume_abs(&self) -> i64 {
        self.volume_count.abs()
    }
}

/// Published notification of an order state change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderUpdate {
    /// Order identifier
    pub order_id: OrderId,
    /// Market the order trades
    pub market: MarketId,
    /// State after the change
    pub state: OrderState,
    /// Signed remaining volume count after the change
    pub remaining_volume_count: i64,
    /// Human-readable reason for rejections and failed cancels
    pub reason: Option<String>,
    /// Update timestamp
    pub ts: Ts,
}
