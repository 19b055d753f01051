use serde::{Deserialize, Serialize};
use std::time::SystemTime;

pub type OrderId = u64;
pub type Price = u64;
pub type Quantity = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Buy,  //Bid,
    Sell, //Ask,
}

impl Side {
    /// The side an order of this side matches against.
    pub fn opposite(self) -> Side {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderType {
    /// Rests in the book until matched or explicitly cancelled.
    GoodTillCancel,
    /// Rests in the book until the daily expiry boundary, then is cancelled.
    GoodForDay,
    /// Executes at the best available prices; never rests.
    Market,
    /// Executes what it can immediately at the limit or better; the
    /// remainder is discarded.
    FillAndKill,
    /// Executes fully and immediately at the limit or better, or is
    /// rejected with no state change.
    FillOrKill,
}

/// A single order submitted to the engine.
///
/// `price` is `None` for market orders and required for every other type.
/// Quantity is tracked as initial vs filled; the engine owns the order once
/// admitted and drives `fill` during matching.
#[derive(Debug, Clone)]
pub struct Order {
    pub id: OrderId,
    pub side: Side,
    pub order_type: OrderType,
    pub price: Option<Price>,
    pub timestamp: SystemTime,
    initial_quantity: Quantity,
    filled_quantity: Quantity,
}

impl Order {
    pub fn new(
        id: OrderId,
        side: Side,
        order_type: OrderType,
        price: Option<Price>,
        quantity: Quantity,
    ) -> Self {
        Order {
            id,
            side,
            order_type,
            price,
            timestamp: SystemTime::now(),
            initial_quantity: quantity,
            filled_quantity: 0,
        }
    }

    pub fn initial_quantity(&self) -> Quantity {
        self.initial_quantity
    }

    pub fn filled_quantity(&self) -> Quantity {
        self.filled_quantity
    }

    pub fn remaining_quantity(&self) -> Quantity {
        self.initial_quantity - self.filled_quantity
    }

    pub fn is_filled(&self) -> bool {
        self.remaining_quantity() == 0
    }

    /// Fills up to `quantity`, capped at the remaining quantity so the
    /// filled total can never exceed the initial quantity.
    pub fn fill(&mut self, quantity: Quantity) {
        self.filled_quantity += quantity.min(self.remaining_quantity());
    }

    /// Converts the order into a resting GoodTillCancel order at `price`.
    /// Only the modify path uses this.
    pub fn to_good_till_cancel(&mut self, price: Price) {
        self.order_type = OrderType::GoodTillCancel;
        self.price = Some(price);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fill_tracks_remaining() {
        let mut order = Order::new(1, Side::Buy, OrderType::GoodTillCancel, Some(100), 10);
        assert_eq!(order.remaining_quantity(), 10);
        assert!(!order.is_filled());

        order.fill(6);
        assert_eq!(order.filled_quantity(), 6);
        assert_eq!(order.remaining_quantity(), 4);

        order.fill(4);
        assert!(order.is_filled());
    }

    #[test]
    fn fill_saturates_at_remaining() {
        let mut order = Order::new(1, Side::Sell, OrderType::GoodTillCancel, Some(100), 5);
        order.fill(50);
        assert_eq!(order.filled_quantity(), 5);
        assert_eq!(order.remaining_quantity(), 0);
    }

    #[test]
    fn to_good_till_cancel_rewrites_type_and_price() {
        let mut order = Order::new(7, Side::Buy, OrderType::Market, None, 5);
        order.to_good_till_cancel(101);
        assert_eq!(order.order_type, OrderType::GoodTillCancel);
        assert_eq!(order.price, Some(101));
    }
}
