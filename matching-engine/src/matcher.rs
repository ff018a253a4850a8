//! Matching algorithm: drives an incoming order against the opposing side
//!
//! Price levels are consumed best-first; within a level the FIFO head
//! matches first. The walk terminates as soon as a level fails price
//! acceptance, since no worse-ranked level can satisfy the limit.

use common::decimal::{canonical, Price};
use common::error::Result;
use common::model::order::{Order, OrderType, Side};
use common::model::trade::Trade;
use common::time::now_nanos;

use crate::order_book::OrderBook;

/// Match `taker` against the opposite side of `book`.
///
/// Emits trades in match order and mutates resting state: filled
/// makers leave their level and the locator map, drained levels leave
/// the price map and side index. The taker's remaining quantity and
/// status are updated in place; residual handling is the caller's job.
pub(crate) fn match_incoming(book: &mut OrderBook, taker: &mut Order) -> Result<Vec<Trade>> {
    let mut trades = Vec::new();
    let opposite = taker.side.opposite();
    let fee_rate = book.fee_rate;

    loop {
        if taker.remaining_quantity.is_zero() {
            break;
        }
        let best = match book.side_index(opposite).best() {
            Some(price) => price,
            None => break,
        };
        if !price_accepts(taker, best) {
            break;
        }

        let key = canonical(&best);
        let Some(level) = book.levels.get_mut(&key) else {
            return Err(book.poison(format!("side index price {key} has no level")));
        };

        // Walk the FIFO from the head
        while !taker.remaining_quantity.is_zero() {
            // Entries no longer open (e.g. cancelled while still
            // sequenced) are reaped before matching the head
            while let Some(stale) = level
                .oldest()
                .filter(|order| !order.is_active())
                .map(|order| order.id.clone())
            {
                level.remove(&stale);
                book.locations.remove(&stale);
            }

            let ts = now_nanos();
            let (fill, trade) = match level.oldest() {
                Some(maker) => {
                    let fill = taker.remaining_quantity.min(maker.remaining_quantity);
                    (
                        fill,
                        Trade::new(level.price(), fill, maker, taker, fee_rate, ts),
                    )
                }
                None => break,
            };

            trades.push(trade);
            taker.fill(fill, ts);
            if let Some(filled) = level.fill_head(fill, ts) {
                book.locations.remove(&filled.id);
            }
        }

        book.drop_empty_level(&key);
    }

    Ok(trades)
}

/// Price acceptance: market orders match unconditionally; a limit buy
/// matches resting prices at or below its limit, a limit sell at or
/// above.
fn price_accepts(taker: &Order, resting: Price) -> bool {
    match (taker.order_type, taker.price) {
        (OrderType::Market, _) => true,
        (OrderType::Limit, Some(limit)) => match taker.side {
            Side::Buy => limit >= resting,
            Side::Sell => limit <= resting,
        },
        (OrderType::Limit, None) => false,
    }
}
