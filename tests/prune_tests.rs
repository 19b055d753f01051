use lob_engine::engine::Engine;
use lob_engine::orders::{Order, OrderId, OrderType, Price, Quantity, Side};

fn gtc(id: OrderId, side: Side, price: Price, quantity: Quantity) -> Order {
    Order::new(id, side, OrderType::GoodTillCancel, Some(price), quantity)
}

fn gfd(id: OrderId, side: Side, price: Price, quantity: Quantity) -> Order {
    Order::new(id, side, OrderType::GoodForDay, Some(price), quantity)
}

#[test]
fn prune_cancels_only_good_for_day_orders() {
    let engine = Engine::new(false);
    engine.add_order(gtc(1, Side::Buy, 99, 5));
    engine.add_order(gfd(2, Side::Buy, 98, 5));
    engine.add_order(gfd(3, Side::Sell, 110, 5));
    engine.add_order(gtc(4, Side::Sell, 111, 5));
    assert_eq!(engine.size(), 4);

    engine.prune_good_for_day();

    assert_eq!(engine.size(), 2);
    let snap = engine.snapshot();
    assert_eq!(snap.bids.len(), 1);
    assert_eq!(snap.bids[0].price, 99);
    assert_eq!(snap.asks.len(), 1);
    assert_eq!(snap.asks[0].price, 111);
}

#[test]
fn prune_handles_mixed_levels() {
    let engine = Engine::new(false);
    engine.add_order(gtc(1, Side::Buy, 100, 10));
    engine.add_order(gfd(2, Side::Buy, 100, 20));
    engine.add_order(gtc(3, Side::Buy, 100, 30));

    engine.prune_good_for_day();

    let snap = engine.snapshot();
    assert_eq!(snap.bids.len(), 1);
    assert_eq!(snap.bids[0].total_quantity, 40);
    assert_eq!(snap.bids[0].order_count, 2);
}

#[test]
fn prune_is_idempotent() {
    let engine = Engine::new(false);
    engine.add_order(gtc(1, Side::Buy, 100, 5));
    engine.add_order(gfd(2, Side::Buy, 99, 5));

    engine.prune_good_for_day();
    engine.prune_good_for_day();

    assert_eq!(engine.size(), 1);
    assert_eq!(engine.snapshot().bids[0].price, 100);
}

#[test]
fn prune_on_empty_book_is_a_no_op() {
    let engine = Engine::new(false);
    engine.prune_good_for_day();
    assert_eq!(engine.size(), 0);
}

#[test]
fn partially_filled_good_for_day_is_still_pruned() {
    let engine = Engine::new(false);
    engine.add_order(gtc(1, Side::Sell, 100, 30));
    engine.add_order(gfd(2, Side::Buy, 100, 50));
    assert_eq!(engine.snapshot().bids[0].total_quantity, 20);

    engine.prune_good_for_day();
    assert!(engine.snapshot().bids.is_empty());
    assert_eq!(engine.size(), 0);
}

#[test]
fn engine_with_pruner_shuts_down_cleanly() {
    let engine = Engine::new(true);
    engine.add_order(gfd(1, Side::Buy, 100, 5));
    assert_eq!(engine.size(), 1);
    // Drop signals the worker and joins it; this must not hang.
    drop(engine);
}
