use crate::errors::RejectReason;
use crate::orders::{Order, OrderId, OrderType, Price, Quantity, Side};
use crate::trade::{Trade, TradeLeg};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, trace};

/// An [`OrderBook`] stores **resting** buy and sell orders in two separate
/// [`BTreeMap`]s:
/// - `bids` (buy orders), best price = highest key
/// - `asks` (sell orders), best price = lowest key
///
/// Each price level is a FIFO queue maintaining **price-time** priority.
/// The queue is a doubly-linked list threaded through the order directory:
/// every resting order's directory entry records its neighbours, so
/// cancellation unlinks in O(1) after the id lookup, with no scanning.
#[derive(Debug, Default)]
pub struct OrderBook {
    /// Buy side, keyed by price; matching iterates **in reverse** to hit the
    /// highest bid first.
    bids: BTreeMap<Price, PriceLevel>,

    /// Sell side, keyed by price; matching iterates **forwards** to hit the
    /// lowest ask first.
    asks: BTreeMap<Price, PriceLevel>,

    /// Directory of every resting order, keyed by order id. The entry holds
    /// the order itself and its position handle inside its price level.
    orders: HashMap<OrderId, OrderEntry>,
}

/// One price level on one side: queue endpoints plus running aggregates.
///
/// `total_quantity` and `order_count` always agree with the queue contents;
/// they are updated on add, match, and remove, never recomputed. Keeping
/// them per side resolves the ambiguity of a single price-keyed aggregate
/// map when both sides briefly hold the same price mid-drain.
#[derive(Debug, Default)]
struct PriceLevel {
    head: Option<OrderId>,
    tail: Option<OrderId>,
    total_quantity: Quantity,
    order_count: usize,
}

/// Directory entry: the resting order and its stable position handle.
#[derive(Debug)]
struct OrderEntry {
    order: Order,
    /// Resting price (the order's limit, resolved at insertion).
    price: Price,
    prev: Option<OrderId>,
    next: Option<OrderId>,
}

/// Aggregate view of one price level, as exposed by [`OrderBook::snapshot`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LevelInfo {
    pub price: Price,
    pub total_quantity: Quantity,
    pub order_count: usize,
}

/// Point-in-time summary of both sides, best price first on each.
#[derive(Debug, Clone, Serialize)]
pub struct BookSnapshot {
    pub bids: Vec<LevelInfo>,
    pub asks: Vec<LevelInfo>,
}

impl OrderBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of resting orders across both sides.
    pub fn size(&self) -> usize {
        self.orders.len()
    }

    pub fn best_bid(&self) -> Option<Price> {
        self.bids.keys().next_back().copied()
    }

    pub fn best_ask(&self) -> Option<Price> {
        self.asks.keys().next().copied()
    }

    /// Admits an order and returns the trades it produced, in execution
    /// order.
    ///
    /// Market orders sweep the opposite side and never rest; fill-and-kill
    /// and fill-or-kill orders are checked against the book before
    /// insertion and rejected without side effects when their policy cannot
    /// be honoured. Everything else rests and the crossed book is drained.
    pub fn add_order(&mut self, order: Order) -> Result<Vec<Trade>, RejectReason> {
        if self.orders.contains_key(&order.id) {
            return Err(RejectReason::DuplicateId(order.id));
        }
        if order.initial_quantity() == 0 {
            return Err(RejectReason::ZeroQuantity(order.id));
        }

        if order.order_type == OrderType::Market {
            return self.match_market(order);
        }

        let Some(price) = order.price else {
            return Err(RejectReason::MissingPrice(order.id));
        };

        match order.order_type {
            OrderType::FillAndKill if !self.can_match(order.side, price) => {
                return Err(RejectReason::NoCross(order.id));
            }
            OrderType::FillOrKill
                if !self.can_fully_fill(order.side, price, order.initial_quantity()) =>
            {
                return Err(RejectReason::InsufficientLiquidity(order.id));
            }
            _ => {}
        }

        debug!(
            id = order.id,
            side = ?order.side,
            order_type = ?order.order_type,
            price,
            quantity = order.remaining_quantity(),
            "admitting resting order"
        );
        let taker_side = order.side;
        self.insert_resting(order, price);
        Ok(self.match_crossed(taker_side))
    }

    /// Removes a resting order. Unknown ids are a no-op returning `false`.
    pub fn cancel_order(&mut self, id: OrderId) -> bool {
        match self.remove_resting(id) {
            Some(order) => {
                debug!(id, side = ?order.side, remaining = order.remaining_quantity(), "order cancelled");
                true
            }
            None => false,
        }
    }

    /// Replaces a resting order: cancels the current order with the same id
    /// and re-admits the replacement as GoodTillCancel at its stated price.
    ///
    /// The re-admission runs the full [`OrderBook::add_order`] pipeline, so
    /// the replacement loses its time priority. `original_type` is part of
    /// the wire contract but deliberately unused; the replacement always
    /// rests as GoodTillCancel.
    pub fn modify_order(
        &mut self,
        mut order: Order,
        _original_type: OrderType,
    ) -> Result<Vec<Trade>, RejectReason> {
        if !self.orders.contains_key(&order.id) {
            return Err(RejectReason::UnknownOrder(order.id));
        }
        let Some(price) = order.price else {
            return Err(RejectReason::MissingPrice(order.id));
        };
        self.remove_resting(order.id);
        order.to_good_till_cancel(price);
        self.add_order(order)
    }

    /// Price-ordered per-level aggregates for both sides, best first.
    pub fn snapshot(&self) -> BookSnapshot {
        let summarize = |(price, level): (&Price, &PriceLevel)| LevelInfo {
            price: *price,
            total_quantity: level.total_quantity,
            order_count: level.order_count,
        };
        BookSnapshot {
            bids: self.bids.iter().rev().map(summarize).collect(),
            asks: self.asks.iter().map(summarize).collect(),
        }
    }

    /// Ids of all resting GoodForDay orders, for the expiry pruner.
    pub fn good_for_day_ids(&self) -> Vec<OrderId> {
        self.orders
            .values()
            .filter(|entry| entry.order.order_type == OrderType::GoodForDay)
            .map(|entry| entry.order.id)
            .collect()
    }

    /// Whether a limit at `price` would cross the current best opposite
    /// price. Used by the fill-and-kill pre-check.
    fn can_match(&self, side: Side, price: Price) -> bool {
        match side {
            Side::Buy => self.best_ask().is_some_and(|ask| price >= ask),
            Side::Sell => self.best_bid().is_some_and(|bid| price <= bid),
        }
    }

    /// Whether the opposite side holds at least `quantity` within the limit
    /// price. Walks level aggregates rather than individual orders.
    fn can_fully_fill(&self, side: Side, price: Price, quantity: Quantity) -> bool {
        let mut needed = quantity;
        match side {
            Side::Buy => {
                for level in self.asks.range(..=price).map(|(_, level)| level) {
                    if level.total_quantity >= needed {
                        return true;
                    }
                    needed -= level.total_quantity;
                }
            }
            Side::Sell => {
                for level in self.bids.range(price..).rev().map(|(_, level)| level) {
                    if level.total_quantity >= needed {
                        return true;
                    }
                    needed -= level.total_quantity;
                }
            }
        }
        false
    }

    /// Sweeps a market order against the opposite side, best price first.
    /// The order never enters the book; any unfilled remainder is dropped.
    fn match_market(&mut self, mut order: Order) -> Result<Vec<Trade>, RejectReason> {
        let opposite = order.side.opposite();
        if self.side_levels(opposite).is_empty() {
            return Err(RejectReason::NoLiquidity(order.id));
        }

        let mut trades = Vec::new();
        while order.remaining_quantity() > 0 {
            let Some((price, maker_id)) = self.front_of(opposite) else {
                break;
            };
            let (traded, maker_filled) = {
                let maker = self
                    .orders
                    .get_mut(&maker_id)
                    .expect("level head is in the directory");
                let traded = order.remaining_quantity().min(maker.order.remaining_quantity());
                maker.order.fill(traded);
                (traded, maker.order.is_filled())
            };
            order.fill(traded);

            // Both legs carry the execution price; a market order has no
            // meaningful price of its own.
            trades.push(Trade::new(
                TradeLeg { order_id: order.id, price, quantity: traded },
                TradeLeg { order_id: maker_id, price, quantity: traded },
            ));

            self.apply_match(opposite, price, traded);
            if maker_filled {
                self.remove_resting(maker_id);
            }
        }

        trace!(
            id = order.id,
            trades = trades.len(),
            discarded = order.remaining_quantity(),
            "market order swept"
        );
        Ok(trades)
    }

    /// Drains the book while the best bid meets or exceeds the best ask,
    /// then discards any fill-and-kill remainder left at a head.
    ///
    /// The taker leg of each trade is attributed to `taker_side`: the book
    /// was uncrossed before this admission, so while it stays crossed the
    /// head of that side is the order admitted by the current call.
    fn match_crossed(&mut self, taker_side: Side) -> Vec<Trade> {
        let mut trades = Vec::new();
        loop {
            let (Some((bid_price, bid_id)), Some((ask_price, ask_id))) =
                (self.front_of(Side::Buy), self.front_of(Side::Sell))
            else {
                break;
            };
            if bid_price < ask_price {
                break;
            }

            let bid_remaining = self.orders[&bid_id].order.remaining_quantity();
            let ask_remaining = self.orders[&ask_id].order.remaining_quantity();
            let traded = bid_remaining.min(ask_remaining);
            debug_assert!(traded > 0, "resting orders always have quantity left");

            let bid_filled = {
                let entry = self
                    .orders
                    .get_mut(&bid_id)
                    .expect("bid head is in the directory");
                entry.order.fill(traded);
                entry.order.is_filled()
            };
            let ask_filled = {
                let entry = self
                    .orders
                    .get_mut(&ask_id)
                    .expect("ask head is in the directory");
                entry.order.fill(traded);
                entry.order.is_filled()
            };

            let bid_leg = TradeLeg { order_id: bid_id, price: bid_price, quantity: traded };
            let ask_leg = TradeLeg { order_id: ask_id, price: ask_price, quantity: traded };
            trades.push(match taker_side {
                Side::Buy => Trade::new(bid_leg, ask_leg),
                Side::Sell => Trade::new(ask_leg, bid_leg),
            });

            self.apply_match(Side::Buy, bid_price, traded);
            self.apply_match(Side::Sell, ask_price, traded);
            if bid_filled {
                self.remove_resting(bid_id);
            }
            if ask_filled {
                self.remove_resting(ask_id);
            }
        }

        self.discard_unfilled_fill_and_kill(Side::Buy);
        self.discard_unfilled_fill_and_kill(Side::Sell);
        trades
    }

    /// A fill-and-kill order still resting after the drain keeps what it
    /// matched and gives up the rest.
    fn discard_unfilled_fill_and_kill(&mut self, side: Side) {
        let Some((_, head_id)) = self.front_of(side) else {
            return;
        };
        let order = &self.orders[&head_id].order;
        if order.order_type == OrderType::FillAndKill && !order.is_filled() {
            debug!(
                id = head_id,
                discarded = order.remaining_quantity(),
                "discarding fill-and-kill remainder"
            );
            self.remove_resting(head_id);
        }
    }

    /// Best price and head order id on `side`, if the side is non-empty.
    fn front_of(&self, side: Side) -> Option<(Price, OrderId)> {
        let (price, level) = match side {
            Side::Buy => self.bids.iter().next_back()?,
            Side::Sell => self.asks.iter().next()?,
        };
        Some((*price, level.head.expect("price levels are never empty")))
    }

    /// Appends the order to the tail of its price level and records the
    /// directory entry. Applies the add-side aggregate update.
    fn insert_resting(&mut self, order: Order, price: Price) {
        let id = order.id;
        let remaining = order.remaining_quantity();
        let level = self.side_levels_mut(order.side).entry(price).or_default();
        let prev = level.tail;
        level.tail = Some(id);
        if level.head.is_none() {
            level.head = Some(id);
        }
        level.total_quantity += remaining;
        level.order_count += 1;

        self.orders.insert(id, OrderEntry { order, price, prev, next: None });
        if let Some(prev_id) = prev {
            self.orders
                .get_mut(&prev_id)
                .expect("level tail is in the directory")
                .next = Some(id);
        }
    }

    /// Unlinks a resting order through its handle and applies the
    /// remove-side aggregate update, erasing the level if it empties.
    /// Returns the removed order, or `None` for unknown ids.
    fn remove_resting(&mut self, id: OrderId) -> Option<Order> {
        let OrderEntry { order, price, prev, next } = self.orders.remove(&id)?;

        if let Some(prev_id) = prev {
            if let Some(prev_entry) = self.orders.get_mut(&prev_id) {
                prev_entry.next = next;
            }
        }
        if let Some(next_id) = next {
            if let Some(next_entry) = self.orders.get_mut(&next_id) {
                next_entry.prev = prev;
            }
        }

        let levels = self.side_levels_mut(order.side);
        let mut level_emptied = false;
        if let Some(level) = levels.get_mut(&price) {
            if level.head == Some(id) {
                level.head = next;
            }
            if level.tail == Some(id) {
                level.tail = prev;
            }
            level.total_quantity -= order.remaining_quantity();
            level.order_count -= 1;
            level_emptied = level.order_count == 0;
        }
        if level_emptied {
            levels.remove(&price);
        }
        Some(order)
    }

    /// Match-side aggregate update: the traded quantity leaves the level
    /// total while the order stays queued; removal is handled separately.
    fn apply_match(&mut self, side: Side, price: Price, traded: Quantity) {
        if let Some(level) = self.side_levels_mut(side).get_mut(&price) {
            level.total_quantity -= traded;
        }
    }

    fn side_levels(&self, side: Side) -> &BTreeMap<Price, PriceLevel> {
        match side {
            Side::Buy => &self.bids,
            Side::Sell => &self.asks,
        }
    }

    fn side_levels_mut(&mut self, side: Side) -> &mut BTreeMap<Price, PriceLevel> {
        match side {
            Side::Buy => &mut self.bids,
            Side::Sell => &mut self.asks,
        }
    }
}
