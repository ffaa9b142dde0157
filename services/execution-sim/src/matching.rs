//! Price-time-priority matching against observed market data
//!
//! One side-parametrized pass replaces duplicated buy/sell branches: the
//! order side picks the counter ladder (buys consume asks, sells consume
//! bids), the limit comparator and the fill sign. Every pass works on its
//! own ladder derived from the event, so no lock beyond `side book → order
//! core` is ever taken, and concurrent passes over the two sides of one
//! market cannot interfere.

use crate::book::{MarketBook, OrderKey};
use crate::error::SimResult;
use crate::order::{Fill, OrderSide};
use services_common::constants::fixed_point::{BASIS_POINTS, HALF_BASIS_POINTS};
use services_common::{MarketEvent, Offer, Side, Ts};
use tracing::trace;

/// Counter-book side an order side consumes
#[must_use]
pub const fn counter_side(side: OrderSide) -> Side {
    match side {
        OrderSide::Buy => Side::Ask,
        OrderSide::Sell => Side::Bid,
    }
}

/// Build the working counter-offer ladder for one side's pass
///
/// Book snapshots hand over their ask/bid ladders as delivered (already in
/// the counter side's priority order). A trade print synthesizes a single
/// offer: a volume-negative (sell) print joins the ask ladder and is matched
/// against resting buys, otherwise it joins the bid ladder.
pub fn ladder_for(event: &MarketEvent, side: OrderSide) -> Vec<Offer> {
    let counter = counter_side(side);
    match event {
        MarketEvent::Book(book) => match counter {
            Side::Ask => book.asks.clone(),
            Side::Bid => book.bids.clone(),
        },
        MarketEvent::Trade(trade) => {
            let print_side = if trade.is_sell() { Side::Ask } else { Side::Bid };
            if print_side == counter {
                vec![Offer::new(trade.price_count, trade.volume_count.abs(), trade.ts)]
            } else {
                Vec::new()
            }
        }
    }
}

/// Whether an offer price breaks an order's limit
#[must_use]
pub const fn limit_violated(side: OrderSide, limit: i64, offer_price: i64) -> bool {
    match side {
        OrderSide::Buy => offer_price > limit,
        OrderSide::Sell => offer_price < limit,
    }
}

/// Slippage adjustment in price counts, rounded half-up
#[must_use]
const fn slippage_count(offer_price: i64, slippage_bp: i64) -> i64 {
    let scaled = offer_price as i128 * slippage_bp as i128 + HALF_BASIS_POINTS as i128;
    (scaled / BASIS_POINTS as i128) as i64
}

/// Execution price with the slippage bound applied
///
/// Buys pay up to `offer + slip` but never beyond their limit; sells receive
/// down to `offer - slip` but never below theirs. Market orders take the
/// slippage-adjusted offer price directly.
#[must_use]
pub fn execution_price(
    side: OrderSide,
    limit: Option<i64>,
    offer_price: i64,
    slippage_bp: i64,
) -> i64 {
    let slip = slippage_count(offer_price, slippage_bp);
    match side {
        OrderSide::Buy => {
            let adjusted = offer_price + slip;
            limit.map_or(adjusted, |l| l.min(adjusted))
        }
        OrderSide::Sell => {
            let adjusted = offer_price - slip;
            limit.map_or(adjusted, |l| l.max(adjusted))
        }
    }
}

/// Run one side's matching pass against its working ladder
///
/// Holds the side lock for the whole pass; takes each order's core lock
/// while reading or mutating its remaining volume. Orders executed to zero
/// (and any stale zero-remaining residents) are removed from the book before
/// the lock is released. Mutations already applied stand even if the pass
/// errors out.
pub fn match_side(
    book: &MarketBook,
    side: OrderSide,
    ladder: &mut Vec<Offer>,
    event_ts: Ts,
    slippage_bp: i64,
) -> SimResult<Vec<Fill>> {
    let mut side_book = book.side(side).lock();
    let mut fills = Vec::new();
    let mut depleted: Vec<OrderKey> = Vec::new();

    'orders: for (key, order) in side_book.iter() {
        let mut core = order.core();
        if core.remaining_volume_count == 0 {
            depleted.push(*key);
            continue;
        }
        // Only match data observed at or after placement.
        if order.entry_time > event_ts {
            continue;
        }

        for offer in ladder.iter_mut() {
            if offer.is_exhausted() {
                continue;
            }
            if let Some(limit) = order.limit_price_count {
                if limit_violated(side, limit, offer.price_count) {
                    // The resting list is price-sorted: once one limit is
                    // broken, no later order can match either.
                    break 'orders;
                }
            }

            let take = offer.volume_count.abs().min(core.remaining_volume_count.abs());
            let fill_volume = take * order.side.sign();
            let price = execution_price(side, order.limit_price_count, offer.price_count, slippage_bp);
            fills.push(Fill::new(order.id, order.market, offer.ts, price, fill_volume));
            trace!(
                order_id = %order.id,
                market = %order.market,
                price,
                volume = fill_volume,
                "matched resting order against offer"
            );

            offer.volume_count -= take * offer.volume_count.signum();
            core.remaining_volume_count -= fill_volume;
            if core.remaining_volume_count == 0 {
                depleted.push(*key);
                break;
            }
        }

        drop(core);
        // Later orders in the same pass see the consumed ladder.
        ladder.retain(|offer| !offer.is_exhausted());
    }

    for key in depleted {
        side_book.remove(&key);
    }
    Ok(fills)
}
