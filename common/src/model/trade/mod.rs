//! Trade models and related types

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::decimal::{Amount, Price, Quantity};
use crate::model::order::Order;

/// Trade model representing a matched order pair
///
/// Exactly one resting (maker) and one incoming (taker) order per
/// trade. The execution price is always the maker's resting price;
/// price improvement accrues to the taker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trade {
    /// Unique trade id
    pub id: Uuid,
    /// Market symbol (e.g., "BTC/USDT")
    pub symbol: String,
    /// Price at which the trade executed (the maker's price)
    pub price: Price,
    /// Quantity traded
    pub quantity: Quantity,
    /// Total amount (price * quantity)
    pub amount: Amount,
    /// Maker order id (was resting on the book)
    pub maker_order_id: String,
    /// Taker order id (initiated the match)
    pub taker_order_id: String,
    /// Maker user id
    pub maker_user_id: String,
    /// Taker user id
    pub taker_user_id: String,
    /// Fee charged to the taker
    pub fee: Amount,
    /// Timestamp when the trade occurred, integer nanoseconds
    pub executed_at: i64,
}

impl Trade {
    /// Create a new trade from a match between `maker` and `taker`.
    ///
    /// `fee = quantity * price * fee_rate`, charged to the taker. The
    /// maker pays no fee.
    pub fn new(
        price: Price,
        quantity: Quantity,
        maker: &Order,
        taker: &Order,
        fee_rate: Decimal,
        executed_at: i64,
    ) -> Self {
        let amount = price * quantity;
        Self {
            id: Uuid::new_v4(),
            symbol: taker.symbol.clone(),
            price,
            quantity,
            amount,
            maker_order_id: maker.id.clone(),
            taker_order_id: taker.id.clone(),
            maker_user_id: maker.user_id.clone(),
            taker_user_id: taker.user_id.clone(),
            fee: amount * fee_rate,
            executed_at,
        }
    }
}
