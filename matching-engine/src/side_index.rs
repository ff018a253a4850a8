//! Ordered index of price levels for one side of the book

use std::collections::BTreeSet;

use common::decimal::Price;
use common::model::order::Side;

/// Price-ordered index for one side.
///
/// Bids order descending, asks ascending; in both cases the best price
/// is the first element under the side's ordering. The index stores
/// only price keys; the levels themselves are owned by the book's
/// price map.
pub struct SideIndex {
    side: Side,
    prices: BTreeSet<Price>,
}

impl SideIndex {
    /// Create an empty index for the given side
    pub fn new(side: Side) -> Self {
        Self {
            side,
            prices: BTreeSet::new(),
        }
    }

    /// The side this index orders for
    pub fn side(&self) -> Side {
        self.side
    }

    /// Insert a price; returns false if it is already present
    pub fn insert(&mut self, price: Price) -> bool {
        self.prices.insert(price)
    }

    /// Remove a price; returns false if it was not present
    pub fn remove(&mut self, price: &Price) -> bool {
        self.prices.remove(price)
    }

    /// Check whether a price is indexed
    pub fn contains(&self, price: &Price) -> bool {
        self.prices.contains(price)
    }

    /// The best price: highest bid or lowest ask
    pub fn best(&self) -> Option<Price> {
        match self.side {
            Side::Buy => self.prices.last().copied(),
            Side::Sell => self.prices.first().copied(),
        }
    }

    /// Iterate prices starting at the best; callers may break early
    pub fn iter_best_first(&self) -> Box<dyn Iterator<Item = Price> + '_> {
        match self.side {
            Side::Buy => Box::new(self.prices.iter().rev().copied()),
            Side::Sell => Box::new(self.prices.iter().copied()),
        }
    }

    /// Number of indexed prices
    pub fn len(&self) -> usize {
        self.prices.len()
    }

    /// Check if the index holds no prices
    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }
}
