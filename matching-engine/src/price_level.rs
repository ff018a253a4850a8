//! A single price level: the time-ordered resting orders at one price

use std::collections::{HashMap, VecDeque};

use common::decimal::{Price, Quantity};
use common::model::order::{Order, Side};

/// All resting orders at one exact price, on one side.
///
/// The sequence is FIFO (head = oldest arrival) and the aggregate
/// quantity is maintained incrementally: after every operation,
/// `total_qty` equals the sum of the members' remaining quantities.
pub struct PriceLevel {
    /// Side of the book this level belongs to
    side: Side,
    /// Price, immutable for the level's lifetime
    price: Price,
    /// Total remaining quantity at this price (depth data)
    total_qty: Quantity,
    /// Orders at this price, oldest first
    orders: VecDeque<Order>,
    /// Index from order id to position in the sequence
    positions: HashMap<String, usize>,
}

impl PriceLevel {
    /// Create an empty level for the given side and price
    pub fn new(side: Side, price: Price) -> Self {
        Self {
            side,
            price,
            total_qty: Quantity::ZERO,
            orders: VecDeque::new(),
            positions: HashMap::new(),
        }
    }

    /// The level's price
    pub fn price(&self) -> Price {
        self.price
    }

    /// The side this level belongs to
    pub fn side(&self) -> Side {
        self.side
    }

    /// Total remaining quantity across all member orders
    pub fn total_qty(&self) -> Quantity {
        self.total_qty
    }

    /// Number of resting orders at this price
    pub fn len(&self) -> usize {
        self.orders.len()
    }

    /// Check if the level holds no orders
    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    /// The oldest resting order, next in line to match
    pub fn oldest(&self) -> Option<&Order> {
        self.orders.front()
    }

    /// Look up a member order by id
    pub fn get(&self, order_id: &str) -> Option<&Order> {
        self.positions
            .get(order_id)
            .and_then(|&index| self.orders.get(index))
    }

    /// Append an order at the tail of the FIFO.
    ///
    /// The caller must have ruled out a duplicate id via the book's
    /// order map.
    pub fn append(&mut self, order: Order) {
        debug_assert!(
            !self.positions.contains_key(&order.id),
            "order {} already present at price {}",
            order.id,
            self.price
        );
        self.total_qty += order.remaining_quantity;
        self.positions.insert(order.id.clone(), self.orders.len());
        self.orders.push_back(order);
    }

    /// Remove an order by id, returning it.
    ///
    /// Returns `None` if the id is not a member of this level.
    pub fn remove(&mut self, order_id: &str) -> Option<Order> {
        let index = self.positions.remove(order_id)?;
        let removed = self.orders.remove(index)?;
        self.total_qty -= removed.remaining_quantity;
        // Update positions for all orders after the removed one
        self.reindex_from(index);
        Some(removed)
    }

    /// Fill the head order for `quantity` at time `ts`.
    ///
    /// Subtracts the quantity from the head's remaining and from the
    /// aggregate. When the head is drained it is popped and returned;
    /// otherwise it stays at the front as partially filled.
    pub fn fill_head(&mut self, quantity: Quantity, ts: i64) -> Option<Order> {
        let head = self.orders.front_mut()?;
        head.fill(quantity, ts);
        self.total_qty -= quantity;
        if head.is_filled() {
            let filled = self.orders.pop_front();
            if let Some(order) = &filled {
                self.positions.remove(&order.id);
            }
            self.reindex_from(0);
            filled
        } else {
            None
        }
    }

    fn reindex_from(&mut self, start: usize) {
        for (index, order) in self.orders.iter().enumerate().skip(start) {
            self.positions.insert(order.id.clone(), index);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::time::now_nanos;
    use rust_decimal_macros::dec;

    fn sell(id: &str, qty: Quantity) -> Order {
        Order::new_limit(
            id.to_string(),
            format!("user-{id}"),
            "BTC/USDT".to_string(),
            Side::Sell,
            dec!(100),
            qty,
        )
    }

    #[test]
    fn append_keeps_fifo_and_aggregate() {
        let mut level = PriceLevel::new(Side::Sell, dec!(100));
        level.append(sell("s1", dec!(1)));
        level.append(sell("s2", dec!(2)));
        level.append(sell("s3", dec!(3)));

        assert_eq!(level.len(), 3);
        assert_eq!(level.total_qty(), dec!(6));
        assert_eq!(level.oldest().map(|o| o.id.as_str()), Some("s1"));
    }

    #[test]
    fn remove_from_middle_preserves_order_and_positions() {
        let mut level = PriceLevel::new(Side::Sell, dec!(100));
        level.append(sell("s1", dec!(1)));
        level.append(sell("s2", dec!(2)));
        level.append(sell("s3", dec!(3)));

        let removed = level.remove("s2").expect("member");
        assert_eq!(removed.id, "s2");
        assert_eq!(level.total_qty(), dec!(4));

        // s3 must still be reachable by id after the shift
        assert_eq!(level.get("s3").map(|o| o.id.as_str()), Some("s3"));
        assert_eq!(level.oldest().map(|o| o.id.as_str()), Some("s1"));
        assert!(level.remove("s2").is_none());
    }

    #[test]
    fn fill_head_partial_keeps_head_in_place() {
        let mut level = PriceLevel::new(Side::Sell, dec!(100));
        level.append(sell("s1", dec!(2)));

        assert!(level.fill_head(dec!(0.5), now_nanos()).is_none());
        assert_eq!(level.total_qty(), dec!(1.5));
        let head = level.oldest().expect("head");
        assert_eq!(head.remaining_quantity, dec!(1.5));
    }

    #[test]
    fn fill_head_drains_and_pops() {
        let mut level = PriceLevel::new(Side::Sell, dec!(100));
        level.append(sell("s1", dec!(1)));
        level.append(sell("s2", dec!(2)));

        let filled = level.fill_head(dec!(1), now_nanos()).expect("drained");
        assert_eq!(filled.id, "s1");
        assert!(filled.is_filled());
        assert_eq!(level.len(), 1);
        assert_eq!(level.total_qty(), dec!(2));
        assert_eq!(level.oldest().map(|o| o.id.as_str()), Some("s2"));
        assert_eq!(level.get("s2").map(|o| o.id.as_str()), Some("s2"));
    }
}
