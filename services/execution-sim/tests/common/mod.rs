//! Common test utilities and fixtures

#![allow(dead_code)]

use execution_sim::fees::BasisPointCommission;
use execution_sim::order::{OrderRequest, OrderSide};
use execution_sim::store::InMemoryOrderStore;
use execution_sim::{ExecutionSimulator, SimulatorConfig};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Exp, Normal, Poisson};
use services_common::{BookSnapshot, Market, MarketEvent, MarketId, Offer, TradePrint, Ts};
use std::sync::Arc;

/// Market id used throughout the suite
pub const TEST_MARKET: MarketId = MarketId(1);

/// A plain market with unit price and volume bases
pub fn unit_market() -> Market {
    Market::new(TEST_MARKET, "OKCOIN", "BTC_USD", 1, 1)
}

/// A simulator with zero slippage and free commission over an inspectable store
pub fn frictionless_sim() -> (Arc<ExecutionSimulator>, Arc<InMemoryOrderStore>) {
    let store = Arc::new(InMemoryOrderStore::new());
    let config = SimulatorConfig {
        slippage_bp: 0,
        commission_bp: 0,
        ..SimulatorConfig::default()
    };
    let sim = ExecutionSimulator::with_collaborators(
        config,
        store.clone(),
        Arc::new(BasisPointCommission::free()),
    );
    sim.register_market(unit_market());
    (Arc::new(sim), store)
}

/// A buy limit request on the test market
pub fn buy_limit(price: i64, volume: i64) -> OrderRequest {
    OrderRequest::limit(TEST_MARKET, OrderSide::Buy, price, volume, "portfolio-1")
}

/// A sell limit request on the test market
pub fn sell_limit(price: i64, volume: i64) -> OrderRequest {
    OrderRequest::limit(TEST_MARKET, OrderSide::Sell, price, volume, "portfolio-1")
}

/// Event timestamp `offset` nanoseconds from now — observed data must not
/// predate order placement or the eligibility check skips it
pub fn event_ts(offset: u64) -> Ts {
    Ts::from_nanos(Ts::now().as_nanos() + offset)
}

/// A book snapshot event from (price, volume) ladders
pub fn book_event(at: u64, asks: &[(i64, i64)], bids: &[(i64, i64)]) -> MarketEvent {
    let ts = event_ts(at);
    let offers = |levels: &[(i64, i64)]| {
        levels
            .iter()
            .map(|&(price, volume)| Offer::new(price, volume, ts))
            .collect()
    };
    MarketEvent::Book(BookSnapshot::new(TEST_MARKET, ts, offers(asks), offers(bids)))
}

/// A trade print event (negative volume = sell print)
pub fn trade_event(at: u64, price: i64, volume: i64) -> MarketEvent {
    MarketEvent::Trade(TradePrint::new(TEST_MARKET, event_ts(at), price, volume))
}

/// Stochastic trade generator: Poisson-ish arrivals, multiplicative Gaussian
/// price walk, Poisson volumes — the shape of a mock exchange ticker
pub struct PoissonTicker {
    market: MarketId,
    price: f64,
    clock_ns: u64,
    rng: StdRng,
    arrivals: Exp<f64>,
    price_steps: Normal<f64>,
    volumes: Poisson<f64>,
}

impl PoissonTicker {
    /// Deterministic ticker from a seed, starting at a price count
    pub fn new(market: MarketId, seed: u64, start_price_count: i64) -> Self {
        Self {
            market,
            price: start_price_count as f64,
            clock_ns: Ts::now().as_nanos(),
            rng: StdRng::seed_from_u64(seed),
            // Mean of half a second between trades.
            arrivals: Exp::new(2.0).expect("valid rate"),
            price_steps: Normal::new(0.0, 0.01).expect("valid stddev"),
            volumes: Poisson::new(40.0).expect("valid mean"),
        }
    }

    /// Next synthetic trade print
    pub fn next_trade(&mut self) -> TradePrint {
        let wait_secs: f64 = self.arrivals.sample(&mut self.rng);
        self.clock_ns += (wait_secs * 1e9) as u64 + 1;

        let delta: f64 = self.price_steps.sample(&mut self.rng);
        let multiple = if delta < 0.0 { 1.0 / (1.0 - delta) } else { 1.0 + delta };
        self.price = (self.price * multiple).max(1.0);

        let volume = (self.volumes.sample(&mut self.rng) as i64).max(1);
        let signed = if self.rng.gen_bool(0.5) { volume } else { -volume };
        TradePrint::new(
            self.market,
            Ts::from_nanos(self.clock_ns),
            self.price.round() as i64,
            signed,
        )
    }

    /// Next synthetic book snapshot, a tight ladder around the walk price
    pub fn next_book(&mut self) -> BookSnapshot {
        let trade = self.next_trade();
        let mid = trade.price_count.max(3);
        let ts = trade.ts;
        let mut depth = || (self.volumes.sample(&mut self.rng) as i64).max(1);
        let asks: Vec<Offer> = (1..=3).map(|i| Offer::new(mid + i, depth(), ts)).collect();
        let bids: Vec<Offer> = (1..=3).map(|i| Offer::new(mid - i, depth(), ts)).collect();
        BookSnapshot::new(self.market, ts, asks, bids)
    }
}
