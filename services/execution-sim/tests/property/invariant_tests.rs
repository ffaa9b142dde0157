//! Property tests for the engine's conservation and priority invariants
//!
//! Random order sets run against random event sequences; whatever happens,
//! no order may overfill, no resting order may sit at zero remaining volume,
//! and no limit order may execute at a worse price than its limit.

use crate::common::{frictionless_sim, TEST_MARKET};
use execution_sim::order::{OrderRequest, OrderSide};
use proptest::prelude::*;
use services_common::{BookSnapshot, MarketEvent, Offer, TradePrint, Ts};

#[derive(Debug, Clone)]
enum EventSpec {
    Book { asks: Vec<(i64, i64)>, bids: Vec<(i64, i64)> },
    Trade { price: i64, volume: i64 },
}

fn order_strategy() -> impl Strategy<Value = (bool, i64, i64)> {
    (any::<bool>(), 50i64..150, 1i64..50)
}

fn event_strategy() -> impl Strategy<Value = EventSpec> {
    let level = || (50i64..150, 1i64..40);
    let book = (
        prop::collection::vec(level(), 0..4),
        prop::collection::vec(level(), 0..4),
    )
        .prop_map(|(mut asks, mut bids)| {
            asks.sort_unstable();
            bids.sort_unstable_by(|a, b| b.cmp(a));
            EventSpec::Book { asks, bids }
        });
    let trade = (50i64..150, (1i64..40).prop_flat_map(|v| prop_oneof![Just(v), Just(-v)]))
        .prop_map(|(price, volume)| EventSpec::Trade { price, volume });
    prop_oneof![book, trade]
}

fn build_event(spec: &EventSpec, at: u64) -> MarketEvent {
    let ts = Ts::from_nanos(Ts::now().as_nanos() + at);
    match spec {
        EventSpec::Book { asks, bids } => {
            let offers = |levels: &[(i64, i64)]| {
                levels
                    .iter()
                    .map(|&(price, volume)| Offer::new(price, volume, ts))
                    .collect()
            };
            MarketEvent::Book(BookSnapshot::new(TEST_MARKET, ts, offers(asks), offers(bids)))
        }
        EventSpec::Trade { price, volume } => {
            MarketEvent::Trade(TradePrint::new(TEST_MARKET, ts, *price, *volume))
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn orders_never_overfill(
        orders in prop::collection::vec(order_strategy(), 1..10),
        events in prop::collection::vec(event_strategy(), 1..16),
    ) {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .expect("runtime");
        rt.block_on(async move {
            let (sim, store) = frictionless_sim();

            let mut live = Vec::new();
            for (is_buy, price, volume) in orders {
                let side = if is_buy { OrderSide::Buy } else { OrderSide::Sell };
                let request = OrderRequest::limit(TEST_MARKET, side, price, volume, "prop");
                live.push(sim.submit_order(request).await.expect("submit"));
            }

            for (i, spec) in events.iter().enumerate() {
                sim.on_market_event(build_event(spec, i as u64 + 1)).await.expect("event");
            }

            for order in &live {
                let fills = order.fills();
                let filled: i64 = fills.iter().map(|f| f.volume_count.abs()).sum();
                let requested = order.volume_count.abs();

                // Conservation: fills never exceed the request, remaining
                // accounts for exactly the unfilled part.
                prop_assert!(filled <= requested, "overfill: {filled} > {requested}");
                prop_assert_eq!(order.remaining_volume_count().abs(), requested - filled);

                // Every fill respects the limit (zero slippage here) and the
                // side's sign convention.
                let limit = order.limit_price_count.expect("limit order");
                for fill in &fills {
                    match order.side {
                        OrderSide::Buy => {
                            prop_assert!(fill.price_count <= limit);
                            prop_assert!(fill.volume_count > 0);
                        }
                        OrderSide::Sell => {
                            prop_assert!(fill.price_count >= limit);
                            prop_assert!(fill.volume_count < 0);
                        }
                    }
                }
            }

            // Book consistency: nothing rests at zero remaining volume.
            for side in [OrderSide::Buy, OrderSide::Sell] {
                for resting in sim.resting_orders(TEST_MARKET, side) {
                    prop_assert!(resting.remaining_volume_count() != 0);
                }
            }

            // The engine itself observed no overfill anomaly.
            prop_assert_eq!(sim.metrics().overfills, 0);

            // Persisted fills agree with in-memory history.
            let persisted: i64 = store.fills().iter().map(|f| f.volume_count.abs()).sum();
            let in_memory: i64 = live.iter().flat_map(|o| o.fills()).map(|f| f.volume_count.abs()).sum();
            prop_assert_eq!(persisted, in_memory);

            Ok(())
        })?;
    }
}
