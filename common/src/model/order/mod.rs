//! Order models and related types

use serde::{Deserialize, Serialize};

use crate::decimal::{Price, Quantity};
use crate::time::now_nanos;

/// Order side (buy or sell)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// The side an incoming order matches against
    pub fn opposite(self) -> Side {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

/// Order type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderType {
    /// Market order to be executed immediately at whatever the book offers
    Market,
    /// Limit order to be executed at the specified price or better
    Limit,
}

/// Order status
///
/// Transitions form a DAG: `Pending` to `PartiallyFilled`, `Filled` or
/// `Cancelled`; `PartiallyFilled` to `Filled` or `Cancelled`. `Filled`
/// and `Cancelled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    /// Order has been received but nothing has matched yet
    Pending,
    /// Order has matched for part of its quantity
    PartiallyFilled,
    /// Order has been filled completely
    Filled,
    /// Order has been cancelled
    Cancelled,
}

/// Order model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    /// Unique order id, chosen by the caller
    pub id: String,
    /// User id of the submitter
    pub user_id: String,
    /// Market symbol (e.g., "BTC/USDT")
    pub symbol: String,
    /// Order side (buy or sell)
    pub side: Side,
    /// Order type
    pub order_type: OrderType,
    /// Price (for limit orders)
    pub price: Option<Price>,
    /// Original quantity
    pub quantity: Quantity,
    /// Remaining quantity
    pub remaining_quantity: Quantity,
    /// Current status
    pub status: Status,
    /// Creation timestamp, integer nanoseconds
    pub created_at: i64,
    /// Last update timestamp, never decreases
    pub updated_at: i64,
}

impl Order {
    /// Create a new limit order.
    ///
    /// The price is normalized so that numerically equal prices share
    /// one canonical decimal form.
    pub fn new_limit(
        id: String,
        user_id: String,
        symbol: String,
        side: Side,
        price: Price,
        quantity: Quantity,
    ) -> Self {
        let now = now_nanos();
        Self {
            id,
            user_id,
            symbol,
            side,
            order_type: OrderType::Limit,
            price: Some(price.normalize()),
            quantity,
            remaining_quantity: quantity,
            status: Status::Pending,
            created_at: now,
            updated_at: now,
        }
    }

    /// Create a new market order
    pub fn new_market(
        id: String,
        user_id: String,
        symbol: String,
        side: Side,
        quantity: Quantity,
    ) -> Self {
        let now = now_nanos();
        Self {
            id,
            user_id,
            symbol,
            side,
            order_type: OrderType::Market,
            price: None,
            quantity,
            remaining_quantity: quantity,
            status: Status::Pending,
            created_at: now,
            updated_at: now,
        }
    }

    /// Check if the order is fully filled
    pub fn is_filled(&self) -> bool {
        self.remaining_quantity.is_zero() || self.status == Status::Filled
    }

    /// Check if the order is active (can be matched or cancelled)
    pub fn is_active(&self) -> bool {
        matches!(self.status, Status::Pending | Status::PartiallyFilled)
    }

    /// Apply a fill of `quantity` at time `ts`.
    ///
    /// Decrements the remaining quantity and transitions the status to
    /// `Filled` when it reaches zero, `PartiallyFilled` otherwise.
    pub fn fill(&mut self, quantity: Quantity, ts: i64) {
        self.remaining_quantity -= quantity;
        self.status = if self.remaining_quantity.is_zero() {
            Status::Filled
        } else {
            Status::PartiallyFilled
        };
        self.touch(ts);
    }

    /// Transition to `Cancelled` at time `ts`
    pub fn cancel(&mut self, ts: i64) {
        self.status = Status::Cancelled;
        self.touch(ts);
    }

    /// Advance the update timestamp, keeping it non-decreasing
    pub fn touch(&mut self, ts: i64) {
        self.updated_at = self.updated_at.max(ts);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decimal::dec;

    fn order(quantity: Quantity) -> Order {
        Order::new_limit(
            "o-1".to_string(),
            "u-1".to_string(),
            "BTC/USDT".to_string(),
            Side::Buy,
            dec!(100),
            quantity,
        )
    }

    #[test]
    fn fill_transitions_to_partially_filled_then_filled() {
        let mut o = order(dec!(2));
        o.fill(dec!(1), o.created_at + 1);
        assert_eq!(o.status, Status::PartiallyFilled);
        assert_eq!(o.remaining_quantity, dec!(1));

        o.fill(dec!(1), o.created_at + 2);
        assert_eq!(o.status, Status::Filled);
        assert!(o.remaining_quantity.is_zero());
        assert!(o.is_filled());
    }

    #[test]
    fn timestamps_never_decrease() {
        let mut o = order(dec!(1));
        let created = o.created_at;
        o.touch(created - 1_000);
        assert_eq!(o.updated_at, created);
    }

    #[test]
    fn limit_price_is_normalized() {
        let o = Order::new_limit(
            "o-2".to_string(),
            "u-1".to_string(),
            "BTC/USDT".to_string(),
            Side::Sell,
            dec!(100.00),
            dec!(1),
        );
        assert_eq!(o.price.map(|p| p.to_string()).as_deref(), Some("100"));
    }
}
