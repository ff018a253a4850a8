//! Order book implementation for price-time priority matching

use std::collections::HashMap;

use common::decimal::{canonical, Price, Quantity};
use common::error::{Error, Result};
use common::model::order::{Order, OrderType, Side, Status};
use common::model::trade::Trade;
use common::time::now_nanos;
use rust_decimal::Decimal;
use tracing::error;

use crate::matcher;
use crate::price_level::PriceLevel;
use crate::side_index::SideIndex;

/// Where a live order rests, for O(1) cancel
#[derive(Debug, Clone)]
pub(crate) struct OrderLocation {
    pub(crate) side: Side,
    pub(crate) price: Price,
    pub(crate) price_key: String,
}

/// Result of a submit operation
#[derive(Debug)]
pub struct SubmitResult {
    /// Final snapshot of the incoming order
    pub order: Order,
    /// Trades produced by this submit, in match order
    pub trades: Vec<Trade>,
}

/// Order book for a single market.
///
/// The book owns its price levels through the price map; the side
/// indices hold only price keys. Every live order appears in exactly
/// one level's FIFO and in the locator map.
pub struct OrderBook {
    /// Market symbol
    symbol: String,
    /// Fee rate charged to the taker, injected configuration
    pub(crate) fee_rate: Decimal,
    /// Buy side price index (descending)
    pub(crate) bids: SideIndex,
    /// Sell side price index (ascending)
    pub(crate) asks: SideIndex,
    /// Canonical price string to level, both sides
    pub(crate) levels: HashMap<String, PriceLevel>,
    /// Live order id to its resting location
    pub(crate) locations: HashMap<String, OrderLocation>,
    /// Timestamp of the last submit, nanoseconds
    last_match_at: i64,
    /// Set on the first invariant violation; all further mutation fails
    poisoned: bool,
}

impl OrderBook {
    /// Create a new empty order book for the given market
    pub fn new(symbol: String, fee_rate: Decimal) -> Self {
        Self {
            symbol,
            fee_rate,
            bids: SideIndex::new(Side::Buy),
            asks: SideIndex::new(Side::Sell),
            levels: HashMap::new(),
            locations: HashMap::new(),
            last_match_at: now_nanos(),
            poisoned: false,
        }
    }

    /// Market symbol
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Submit an incoming order.
    ///
    /// Matches against the opposite side, then rests any limit
    /// residual. Returns the trades produced (possibly empty) and the
    /// final snapshot of the incoming order. Market orders never rest;
    /// their residual is left unfilled.
    pub fn submit(&mut self, order: Order) -> Result<SubmitResult> {
        self.check_poisoned()?;
        if self.locations.contains_key(&order.id) {
            return Err(Error::DuplicateOrder(order.id));
        }

        let mut taker = order;
        let trades = matcher::match_incoming(self, &mut taker)?;

        if !taker.remaining_quantity.is_zero() {
            match taker.order_type {
                OrderType::Limit => self.insert_resting(taker.clone())?,
                OrderType::Market => {
                    // never rests; the engine discards the residual
                    taker.status = Status::PartiallyFilled;
                    taker.touch(now_nanos());
                }
            }
        }

        self.last_match_at = now_nanos();
        Ok(SubmitResult {
            order: taker,
            trades,
        })
    }

    /// Cancel a resting order by id.
    ///
    /// Removes the order from its level, drops the level when emptied
    /// and returns the cancelled snapshot.
    pub fn cancel(&mut self, order_id: &str) -> Result<Order> {
        self.check_poisoned()?;
        let location = match self.locations.get(order_id) {
            Some(location) => location.clone(),
            None => return Err(Error::OrderNotFound(order_id.to_string())),
        };

        let status = self
            .levels
            .get(&location.price_key)
            .and_then(|level| level.get(order_id))
            .map(|order| order.status);
        let status = match status {
            Some(status) => status,
            None => {
                return Err(self.poison(format!(
                    "live order {} missing from price level {}",
                    order_id, location.price_key
                )))
            }
        };
        if !matches!(status, Status::Pending | Status::PartiallyFilled) {
            return Err(Error::NotCancellable {
                id: order_id.to_string(),
                status,
            });
        }

        let removed = self
            .levels
            .get_mut(&location.price_key)
            .and_then(|level| level.remove(order_id));
        let mut removed = match removed {
            Some(order) => order,
            None => {
                return Err(self.poison(format!(
                    "order {} vanished from price level {} during cancel",
                    order_id, location.price_key
                )))
            }
        };

        let now_empty = self
            .levels
            .get(&location.price_key)
            .map_or(false, |level| level.is_empty());
        if now_empty {
            self.levels.remove(&location.price_key);
            self.side_index_mut(location.side).remove(&location.price);
        }

        removed.cancel(now_nanos());
        self.locations.remove(order_id);
        Ok(removed)
    }

    /// Rest a residual limit order, used only by submit.
    ///
    /// Finds or creates the level for the order's price on its side
    /// and registers the order in the locator map.
    pub(crate) fn insert_resting(&mut self, order: Order) -> Result<()> {
        let price = order
            .price
            .ok_or_else(|| Error::InvalidOrder(format!("resting order {} has no price", order.id)))?;
        if self.locations.contains_key(&order.id) {
            return Err(Error::DuplicateOrder(order.id));
        }

        let key = canonical(&price);
        let location = OrderLocation {
            side: order.side,
            price,
            price_key: key.clone(),
        };
        let id = order.id.clone();

        match self.levels.get_mut(&key) {
            Some(level) => {
                if level.side() != order.side {
                    return Err(self.poison(format!(
                        "price level {key} is on the opposite side of order {id}"
                    )));
                }
                level.append(order);
            }
            None => {
                let mut level = PriceLevel::new(order.side, price);
                let side = order.side;
                level.append(order);
                if !self.side_index_mut(side).insert(price) {
                    return Err(
                        self.poison(format!("side index already holds unmapped price {key}"))
                    );
                }
                self.levels.insert(key, level);
            }
        }

        self.locations.insert(id, location);
        Ok(())
    }

    /// Get the best bid price
    pub fn best_bid(&self) -> Option<Price> {
        self.bids.best()
    }

    /// Get the best ask price
    pub fn best_ask(&self) -> Option<Price> {
        self.asks.best()
    }

    /// Get the current spread
    pub fn spread(&self) -> Option<Price> {
        match (self.best_ask(), self.best_bid()) {
            (Some(ask), Some(bid)) => Some(ask - bid),
            _ => None,
        }
    }

    /// Price levels with aggregate quantities, best first (for market data)
    pub fn depth(&self, limit: usize) -> (Vec<(Price, Quantity)>, Vec<(Price, Quantity)>) {
        let ladder = |index: &SideIndex| -> Vec<(Price, Quantity)> {
            index
                .iter_best_first()
                .take(limit)
                .filter_map(|price| {
                    self.levels
                        .get(&canonical(&price))
                        .map(|level| (price, level.total_qty()))
                })
                .collect()
        };
        (ladder(&self.bids), ladder(&self.asks))
    }

    /// Look up a resting order by id
    pub fn order(&self, order_id: &str) -> Option<&Order> {
        let location = self.locations.get(order_id)?;
        self.levels
            .get(&location.price_key)
            .and_then(|level| level.get(order_id))
    }

    /// Number of live resting orders
    pub fn len(&self) -> usize {
        self.locations.len()
    }

    /// Check if the book holds no resting orders
    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    /// Timestamp of the last submit, nanoseconds
    pub fn last_match_at(&self) -> i64 {
        self.last_match_at
    }

    /// Check whether an invariant violation has poisoned this book
    pub fn is_poisoned(&self) -> bool {
        self.poisoned
    }

    pub(crate) fn side_index(&self, side: Side) -> &SideIndex {
        match side {
            Side::Buy => &self.bids,
            Side::Sell => &self.asks,
        }
    }

    pub(crate) fn side_index_mut(&mut self, side: Side) -> &mut SideIndex {
        match side {
            Side::Buy => &mut self.bids,
            Side::Sell => &mut self.asks,
        }
    }

    /// Drop the level behind `key` from the price map and its side
    /// index once its FIFO is empty
    pub(crate) fn drop_empty_level(&mut self, key: &str) {
        let drained = match self.levels.get(key) {
            Some(level) if level.is_empty() => Some((level.side(), level.price())),
            _ => None,
        };
        if let Some((side, price)) = drained {
            self.levels.remove(key);
            self.side_index_mut(side).remove(&price);
        }
    }

    /// Mark the book poisoned and surface the diagnostic.
    ///
    /// Callers must not continue mutating a poisoned book.
    pub(crate) fn poison(&mut self, message: String) -> Error {
        error!(symbol = %self.symbol, %message, "order book invariant violated");
        self.poisoned = true;
        Error::InvariantViolation(message)
    }

    fn check_poisoned(&self) -> Result<()> {
        if self.poisoned {
            return Err(Error::InvariantViolation(format!(
                "order book {} is poisoned",
                self.symbol
            )));
        }
        Ok(())
    }
}
