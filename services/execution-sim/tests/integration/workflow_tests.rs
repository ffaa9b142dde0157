//! Integration tests: complete order workflows against simulated market data

use crate::common::{
    book_event, buy_limit, frictionless_sim, sell_limit, trade_event, PoissonTicker, TEST_MARKET,
};
use crate::init_test_logging;
use execution_sim::order::{CancelOutcome, OrderRequest, OrderSide, OrderState};
use execution_sim::EngineEvent;
use pretty_assertions::assert_eq;
use services_common::MarketEvent;

#[tokio::test]
async fn test_limit_order_lifecycle_end_to_end() {
    init_test_logging();
    let (sim, store) = frictionless_sim();
    let mut events = sim.subscribe();

    // Place, partially fill twice, then complete.
    let order = sim.submit_order(buy_limit(100, 10)).await.unwrap();
    sim.on_market_event(book_event(10, &[(98, 4), (99, 3), (101, 5)], &[]))
        .await
        .unwrap();
    assert_eq!(order.state(), OrderState::PartFilled);
    assert_eq!(order.remaining_volume_count(), 3);

    sim.on_market_event(trade_event(20, 100, -3)).await.unwrap();
    assert_eq!(order.state(), OrderState::Filled);
    assert_eq!(order.remaining_volume_count(), 0);

    // History: three fills, volume conserved, average price consistent.
    let fills = order.fills();
    assert_eq!(fills.len(), 3);
    assert_eq!(fills.iter().map(|f| f.volume_count).sum::<i64>(), 10);
    // (98*4 + 99*3 + 100*3) / 10 = 989 / 10 = 98 in integer counts.
    assert_eq!(order.average_fill_price_count(), Some(98));

    // Store agrees with memory.
    let record = store.order(order.id).unwrap();
    assert_eq!(record.state, OrderState::Filled);
    assert_eq!(record.fills.len(), 3);
    assert_eq!(store.fills().len(), 3);

    // Event stream: placement, then alternating fills and updates.
    let mut fill_events = 0;
    let mut update_events = 0;
    while let Ok(event) = events.try_recv() {
        match event {
            EngineEvent::Fill(_) => fill_events += 1,
            EngineEvent::Order(_) => update_events += 1,
        }
    }
    assert_eq!(fill_events, 3);
    // One Placed update plus one update per fill.
    assert_eq!(update_events, 4);
}

#[tokio::test]
async fn test_two_sided_book_event_fills_both_sides() {
    let (sim, _store) = frictionless_sim();

    let buy = sim.submit_order(buy_limit(100, 5)).await.unwrap();
    let sell = sim.submit_order(sell_limit(103, 5)).await.unwrap();

    let fills = sim
        .on_market_event(book_event(10, &[(99, 5)], &[(104, 5)]))
        .await
        .unwrap();

    assert_eq!(fills.len(), 2);
    assert_eq!(buy.state(), OrderState::Filled);
    assert_eq!(sell.state(), OrderState::Filled);
    assert_eq!(
        fills.iter().map(|f| f.volume_count).sum::<i64>(),
        0,
        "buy and sell volumes mirror each other"
    );
}

#[tokio::test]
async fn test_cancel_then_fill_race_is_clean() {
    let (sim, _store) = frictionless_sim();

    let order = sim.submit_order(buy_limit(100, 10)).await.unwrap();
    let outcome = sim.cancel_order(order.id).await.unwrap();
    assert_eq!(outcome, CancelOutcome::Cancelled);

    // Data arriving after the cancel finds nothing to fill.
    let fills = sim.on_market_event(book_event(10, &[(99, 5)], &[])).await.unwrap();
    assert!(fills.is_empty());
    assert_eq!(order.state(), OrderState::Cancelled);
    assert_eq!(order.remaining_volume_count(), 10);
}

#[tokio::test]
async fn test_churn_against_stochastic_ticker_conserves_volume() {
    init_test_logging();
    let (sim, store) = frictionless_sim();

    let mut orders = Vec::new();
    for i in 0..10i64 {
        let side = if i % 2 == 0 { OrderSide::Buy } else { OrderSide::Sell };
        // Limits straddling the ticker's starting price of 100.
        let price = 90 + 2 * i;
        let request = OrderRequest::limit(TEST_MARKET, side, price, 20 + i, "portfolio-1");
        orders.push(sim.submit_order(request).await.unwrap());
    }

    let mut ticker = PoissonTicker::new(TEST_MARKET, 42, 100);
    for i in 0..200 {
        let event = if i % 4 == 0 {
            MarketEvent::Book(ticker.next_book())
        } else {
            MarketEvent::Trade(ticker.next_trade())
        };
        sim.on_market_event(event).await.unwrap();
    }

    let mut total_filled = 0u64;
    for order in &orders {
        let filled: i64 = order.fills().iter().map(|f| f.volume_count.abs()).sum();
        let requested = order.volume_count.abs();
        assert!(filled <= requested);
        assert_eq!(order.remaining_volume_count().abs(), requested - filled);
        match order.state() {
            OrderState::Filled => assert_eq!(filled, requested),
            OrderState::Placed => assert_eq!(filled, 0),
            OrderState::PartFilled => assert!(filled > 0 && filled < requested),
            other => panic!("unexpected state {other:?}"),
        }
        total_filled += filled as u64;
    }

    let metrics = sim.metrics();
    assert_eq!(metrics.volume_filled, total_filled);
    assert_eq!(metrics.overfills, 0);
    assert_eq!(metrics.fills_generated as usize, store.fills().len());
    assert_eq!(metrics.events_processed, 200);
}
