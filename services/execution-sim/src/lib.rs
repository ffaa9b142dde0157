//! Paper-trading execution simulator
//!
//! Simulates the filling of client orders by matching them against observed
//! market data — order-book snapshots and trade prints — instead of routing
//! them to a venue.
//!
//! Features:
//! - Per-market, per-side resting order books with price-time priority
//! - One side-parametrized matching pass with slippage-bounded execution
//! - Order lifecycle state machine (placement, partial fill, cancel, reject)
//! - Fill post-processing: commission, fill history, persistence, publish
//! - Crash recovery from the persistence collaborator
//!
//! Collaborators (persistence, commission, event distribution) are consumed
//! through narrow traits; in-process defaults ship for tests and embedding.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use services_common::constants::trading::{
    DEFAULT_COMMISSION_BP, DEFAULT_EVENT_CHANNEL_CAPACITY, DEFAULT_SLIPPAGE_BP,
};
use services_common::{Market, MarketEvent, MarketId, Ts};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

pub mod book;
pub mod error;
pub mod fees;
pub mod lifecycle;
pub mod matching;
pub mod order;
mod posttrade;
pub mod recovery;
pub mod store;

pub use error::{SimError, SimResult};

use book::OrderBook;
use fees::{BasisPointCommission, CommissionModel};
use lifecycle::OrderLifecycleManager;
use order::{
    CancelOutcome, Fill, OrderId, OrderRequest, OrderSide, OrderState, OrderUpdate, SpecificOrder,
};
use posttrade::FillProcessor;
use recovery::{RecoveryManager, RecoveryStats};
use store::{InMemoryOrderStore, OrderStore};

/// Simulator configuration
#[derive(Debug, Clone)]
pub struct SimulatorConfig {
    /// Execution slippage in basis points applied to observed counter prices
    pub slippage_bp: i64,
    /// Commission rate in basis points used by the default fee model
    pub commission_bp: i64,
    /// Whether matching starts enabled
    pub trading_enabled: bool,
    /// Capacity of the broadcast event channel
    pub event_channel_capacity: usize,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            slippage_bp: DEFAULT_SLIPPAGE_BP,
            commission_bp: DEFAULT_COMMISSION_BP,
            trading_enabled: true,
            event_channel_capacity: DEFAULT_EVENT_CHANNEL_CAPACITY,
        }
    }
}

/// Event published to the distribution collaborator
#[derive(Debug, Clone)]
pub enum EngineEvent {
    /// A fill was produced and enriched
    Fill(Fill),
    /// An order changed state
    Order(OrderUpdate),
}

/// Engine counters
#[derive(Debug, Default)]
pub struct SimMetrics {
    /// Orders accepted into the book
    pub orders_placed: AtomicU64,
    /// Orders rejected at submission
    pub orders_rejected: AtomicU64,
    /// Orders cancelled
    pub orders_cancelled: AtomicU64,
    /// Fills produced
    pub fills_generated: AtomicU64,
    /// Total absolute volume filled
    pub volume_filled: AtomicU64,
    /// Market events consumed
    pub events_processed: AtomicU64,
    /// Matching passes aborted by an error
    pub match_pass_failures: AtomicU64,
    /// Overfill invariant violations observed
    pub overfills: AtomicU64,
}

/// Point-in-time copy of the engine counters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimMetricsSnapshot {
    /// Orders accepted into the book
    pub orders_placed: u64,
    /// Orders rejected at submission
    pub orders_rejected: u64,
    /// Orders cancelled
    pub orders_cancelled: u64,
    /// Fills produced
    pub fills_generated: u64,
    /// Total absolute volume filled
    pub volume_filled: u64,
    /// Market events consumed
    pub events_processed: u64,
    /// Matching passes aborted by an error
    pub match_pass_failures: u64,
    /// Overfill invariant violations observed
    pub overfills: u64,
}

/// The execution simulator
///
/// Owns the market registry, the order registry and the resting books;
/// everything else is a collaborator.
pub struct ExecutionSimulator {
    config: SimulatorConfig,
    trading_enabled: AtomicBool,
    markets: RwLock<FxHashMap<MarketId, Arc<Market>>>,
    orders: RwLock<FxHashMap<OrderId, Arc<SpecificOrder>>>,
    book: OrderBook,
    lifecycle: Arc<OrderLifecycleManager>,
    sequence: AtomicU64,
    store: Arc<dyn OrderStore>,
    processor: FillProcessor,
    metrics: Arc<SimMetrics>,
}

impl ExecutionSimulator {
    /// Create a simulator with the in-memory store and basis-point fees
    #[must_use]
    pub fn new(config: SimulatorConfig) -> Self {
        let commission = Arc::new(BasisPointCommission::new(config.commission_bp));
        Self::with_collaborators(config, Arc::new(InMemoryOrderStore::new()), commission)
    }

    /// Create a simulator over explicit collaborators
    #[must_use]
    pub fn with_collaborators(
        config: SimulatorConfig,
        store: Arc<dyn OrderStore>,
        commission: Arc<dyn CommissionModel>,
    ) -> Self {
        let (events, _) = broadcast::channel(config.event_channel_capacity);
        let lifecycle = Arc::new(OrderLifecycleManager::new());
        let metrics = Arc::new(SimMetrics::default());
        let processor = FillProcessor::new(
            commission,
            Arc::clone(&store),
            events,
            Arc::clone(&lifecycle),
            Arc::clone(&metrics),
        );

        Self {
            trading_enabled: AtomicBool::new(config.trading_enabled),
            config,
            markets: RwLock::new(FxHashMap::default()),
            orders: RwLock::new(FxHashMap::default()),
            book: OrderBook::new(),
            lifecycle,
            sequence: AtomicU64::new(1),
            store,
            processor,
            metrics,
        }
    }

    /// Register a market; immutable once registered
    pub fn register_market(&self, market: Market) -> Arc<Market> {
        let market = Arc::new(market);
        self.markets.write().insert(market.id, Arc::clone(&market));
        info!(market = %market.id, venue = %market.venue, symbol = %market.symbol, "market registered");
        market
    }

    /// Look up a registered market
    #[must_use]
    pub fn market(&self, id: MarketId) -> Option<Arc<Market>> {
        self.markets.read().get(&id).map(Arc::clone)
    }

    /// Look up a known order
    #[must_use]
    pub fn order(&self, id: OrderId) -> Option<Arc<SpecificOrder>> {
        self.orders.read().get(&id).map(Arc::clone)
    }

    /// Open orders owned by a portfolio
    #[must_use]
    pub fn open_orders(&self, portfolio: &str) -> Vec<Arc<SpecificOrder>> {
        self.orders
            .read()
            .values()
            .filter(|order| order.portfolio == portfolio && order.is_open())
            .map(Arc::clone)
            .collect()
    }

    /// Subscribe to fill and order-update events
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.processor.subscribe()
    }

    /// Globally enable or disable matching
    pub fn set_trading_enabled(&self, enabled: bool) {
        self.trading_enabled.store(enabled, Ordering::Relaxed);
    }

    /// Current engine counters
    #[must_use]
    pub fn metrics(&self) -> SimMetricsSnapshot {
        SimMetricsSnapshot {
            orders_placed: self.metrics.orders_placed.load(Ordering::Relaxed),
            orders_rejected: self.metrics.orders_rejected.load(Ordering::Relaxed),
            orders_cancelled: self.metrics.orders_cancelled.load(Ordering::Relaxed),
            fills_generated: self.metrics.fills_generated.load(Ordering::Relaxed),
            volume_filled: self.metrics.volume_filled.load(Ordering::Relaxed),
            events_processed: self.metrics.events_processed.load(Ordering::Relaxed),
            match_pass_failures: self.metrics.match_pass_failures.load(Ordering::Relaxed),
            overfills: self.metrics.overfills.load(Ordering::Relaxed),
        }
    }

    /// Submit an order
    ///
    /// Returns the live order with its immediate state: `Placed` for
    /// accepted orders, `Rejected` (with a published reason) for orders
    /// using unsupported features such as stop prices. Malformed requests
    /// error without creating an order.
    pub async fn submit_order(&self, request: OrderRequest) -> SimResult<Arc<SpecificOrder>> {
        let market = self
            .market(request.market)
            .ok_or(SimError::UnknownMarket { market: request.market })?;
        let sequence = self.sequence.fetch_add(1, Ordering::SeqCst);
        let entry_time = Ts::now();

        if let Err(err) = self.lifecycle.validate_request(&request) {
            if let SimError::UnsupportedOrder { ref reason } = err {
                let reason = reason.clone();
                let order = Arc::new(SpecificOrder::new(&request, sequence, entry_time));
                order.core().state = OrderState::Rejected;
                self.orders.write().insert(order.id, Arc::clone(&order));
                self.store.save_order(&order.to_record()).await?;
                self.metrics.orders_rejected.fetch_add(1, Ordering::Relaxed);
                warn!(order_id = %order.id, market = %market.id, reason = %reason, "order rejected");
                self.processor.publish_update(OrderUpdate {
                    order_id: order.id,
                    market: order.market,
                    state: OrderState::Rejected,
                    remaining_volume_count: order.remaining_volume_count(),
                    reason: Some(reason),
                    ts: entry_time,
                });
                return Ok(order);
            }
            return Err(err);
        }

        let order = Arc::new(SpecificOrder::new(&request, sequence, entry_time));
        {
            let mut core = order.core();
            self.lifecycle.validate_transition(core.state, OrderState::Placed)?;
            core.state = OrderState::Placed;
        }
        self.orders.write().insert(order.id, Arc::clone(&order));
        self.book.submit(&order);
        self.store.save_order(&order.to_record()).await?;
        self.metrics.orders_placed.fetch_add(1, Ordering::Relaxed);
        debug!(order_id = %order.id, market = %market.id, "order placed");
        self.processor.publish_update(OrderUpdate {
            order_id: order.id,
            market: order.market,
            state: OrderState::Placed,
            remaining_volume_count: order.remaining_volume_count(),
            reason: None,
            ts: entry_time,
        });
        Ok(order)
    }

    /// Cancel an order
    ///
    /// `Cancelled` when the order was removed from the book; an error when
    /// the order is not open; `AlreadyResolved` when a concurrent pass
    /// executed it to completion before the cancel got there.
    pub async fn cancel_order(&self, order_id: OrderId) -> SimResult<CancelOutcome> {
        let order = self
            .order(order_id)
            .ok_or(SimError::OrderNotFound { order_id })?;

        let outcome = self.cancel_resting(&order)?;
        self.store.update_order(&order.to_record()).await?;

        let reason = match outcome {
            CancelOutcome::Cancelled => {
                self.metrics.orders_cancelled.fetch_add(1, Ordering::Relaxed);
                None
            }
            CancelOutcome::AlreadyResolved => Some("already resolved".to_string()),
            CancelOutcome::NotFound => Some("not found in book".to_string()),
        };
        self.processor.publish_update(OrderUpdate {
            order_id,
            market: order.market,
            state: order.state(),
            remaining_volume_count: order.remaining_volume_count(),
            reason,
            ts: Ts::now(),
        });
        Ok(outcome)
    }

    /// Cancel every open order owned by a portfolio
    pub async fn cancel_all(&self, portfolio: &str) -> Vec<(OrderId, SimResult<CancelOutcome>)> {
        let targets = self.open_orders(portfolio);
        let mut results = Vec::with_capacity(targets.len());
        for order in targets {
            results.push((order.id, self.cancel_order(order.id).await));
        }
        results
    }

    /// Hand an open order to an external venue
    ///
    /// The order leaves the local book and is no longer matched here; it
    /// remains open and cancellable.
    pub async fn route_order(&self, order_id: OrderId) -> SimResult<()> {
        let order = self
            .order(order_id)
            .ok_or(SimError::OrderNotFound { order_id })?;

        {
            let market_book = self.book.market_book(order.market);
            let mut side = market_book.side(order.side).lock();
            let mut core = order.core();
            self.lifecycle.validate_transition(core.state, OrderState::Routed)?;
            book::remove_resting(&mut side, &order);
            core.state = OrderState::Routed;
        }

        self.store.update_order(&order.to_record()).await?;
        info!(order_id = %order.id, "order routed to external venue");
        self.processor.publish_update(OrderUpdate {
            order_id,
            market: order.market,
            state: OrderState::Routed,
            remaining_volume_count: order.remaining_volume_count(),
            reason: None,
            ts: Ts::now(),
        });
        Ok(())
    }

    /// Consume one market-data event
    ///
    /// Runs the matching pass for both sides of the event's market, then the
    /// post-processing pipeline for every fill produced, and returns the
    /// enriched fills. Synthetic markets, unregistered markets and disabled
    /// trading are no-ops.
    pub async fn on_market_event(&self, event: MarketEvent) -> SimResult<Vec<Fill>> {
        self.metrics.events_processed.fetch_add(1, Ordering::Relaxed);

        let Some(market) = self.market(event.market()) else {
            debug!(market = %event.market(), "event for unregistered market ignored");
            return Ok(Vec::new());
        };
        if market.synthetic || !self.trading_enabled.load(Ordering::Relaxed) {
            return Ok(Vec::new());
        }
        let Some(market_book) = self.book.get(market.id) else {
            return Ok(Vec::new());
        };
        if market_book.is_empty() {
            return Ok(Vec::new());
        }

        let mut fills = Vec::new();
        for side in [OrderSide::Buy, OrderSide::Sell] {
            let mut ladder = matching::ladder_for(&event, side);
            if ladder.is_empty() {
                continue;
            }
            match matching::match_side(
                &market_book,
                side,
                &mut ladder,
                event.ts(),
                self.config.slippage_bp,
            ) {
                Ok(side_fills) => fills.extend(side_fills),
                Err(err) => {
                    self.metrics.match_pass_failures.fetch_add(1, Ordering::Relaxed);
                    error!(
                        market = %market.id,
                        ?side,
                        error = %err,
                        "matching pass failed; event dropped for this side"
                    );
                }
            }
        }

        let mut processed = Vec::with_capacity(fills.len());
        for fill in fills {
            let order = self.order(fill.order_id);
            match order {
                Some(order) => match self.processor.process(&market, &order, fill.clone()).await {
                    Ok(enriched) => processed.push(enriched),
                    Err(err) => {
                        error!(
                            fill_id = %fill.id,
                            order_id = %fill.order_id,
                            error = %err,
                            "fill post-processing failed"
                        );
                        processed.push(fill);
                    }
                },
                None => error!(order_id = %fill.order_id, "fill produced for unknown order"),
            }
        }
        Ok(processed)
    }

    /// Rebuild in-flight orders from the store after a restart
    pub async fn recover(&self) -> SimResult<RecoveryStats> {
        let manager = RecoveryManager::new(Arc::clone(&self.store));
        let (recovered, stats) = manager.recover().await?;
        for order in recovered {
            self.sequence.fetch_max(order.sequence + 1, Ordering::SeqCst);
            self.orders.write().insert(order.id, Arc::clone(&order));
            self.book.submit(&order);
        }
        Ok(stats)
    }

    /// Resting orders of one market side, in matching priority order
    #[must_use]
    pub fn resting_orders(&self, market: MarketId, side: OrderSide) -> Vec<Arc<SpecificOrder>> {
        self.book.orders_for(market, side)
    }

    fn cancel_resting(&self, order: &Arc<SpecificOrder>) -> SimResult<CancelOutcome> {
        let market_book = self.book.market_book(order.market);
        let mut side = market_book.side(order.side).lock();
        let mut core = order.core();

        match core.state {
            OrderState::New => {
                self.lifecycle.validate_transition(core.state, OrderState::Cancelled)?;
                core.state = OrderState::Cancelled;
                Ok(CancelOutcome::Cancelled)
            }
            // Routed orders do not rest locally; cancel them directly.
            OrderState::Routed => {
                self.lifecycle.validate_transition(core.state, OrderState::Cancelling)?;
                core.state = OrderState::Cancelling;
                self.lifecycle.validate_transition(core.state, OrderState::Cancelled)?;
                core.state = OrderState::Cancelled;
                Ok(CancelOutcome::Cancelled)
            }
            state if state.is_terminal() => Err(SimError::NotOpen { order_id: order.id, state }),
            state => {
                if book::remove_resting(&mut side, order) {
                    // Recovered orders may already sit in Cancelling.
                    if state != OrderState::Cancelling {
                        self.lifecycle.validate_transition(state, OrderState::Cancelling)?;
                        core.state = OrderState::Cancelling;
                    }
                    self.lifecycle.validate_transition(core.state, OrderState::Cancelled)?;
                    core.state = OrderState::Cancelled;
                    Ok(CancelOutcome::Cancelled)
                } else if core.remaining_volume_count == 0 {
                    // The fill pipeline owns the terminal transition.
                    Ok(CancelOutcome::AlreadyResolved)
                } else {
                    error!(order_id = %order.id, state = ?state, "open order missing from book");
                    Ok(CancelOutcome::NotFound)
                }
            }
        }
    }
}
