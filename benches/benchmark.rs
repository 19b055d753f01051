use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use lob_engine::orderbook::OrderBook;
use lob_engine::orders::{Order, OrderType, Side};

fn setup_order_book(depth: u64, orders_per_level: u64) -> OrderBook {
    let mut ob = OrderBook::new();
    for price in 1..=depth {
        for i in 0..orders_per_level {
            // Sell side rests above the bids so setup never crosses.
            ob.add_order(Order::new(
                price * 1_000 + i,
                Side::Sell,
                OrderType::GoodTillCancel,
                Some(1_000 + price),
                1,
            ))
            .unwrap();
            ob.add_order(Order::new(
                (depth + price) * 1_000 + i,
                Side::Buy,
                OrderType::GoodTillCancel,
                Some(price),
                1,
            ))
            .unwrap();
        }
    }
    ob
}

fn bench_match_order(c: &mut Criterion) {
    let depth = 100;
    let orders_per_level = 10;

    c.bench_function("market buy sweeps half the asks", |b| {
        b.iter_batched(
            || setup_order_book(depth, orders_per_level),
            |mut ob| {
                let market_buy = Order::new(
                    0,
                    Side::Buy,
                    OrderType::Market,
                    None,
                    depth * orders_per_level / 2,
                );
                ob.add_order(market_buy).unwrap()
            },
            BatchSize::SmallInput,
        )
    });

    c.bench_function("crossing limit sell drains the bids", |b| {
        b.iter_batched(
            || setup_order_book(depth, orders_per_level),
            |mut ob| {
                let limit_sell = Order::new(
                    1,
                    Side::Sell,
                    OrderType::GoodTillCancel,
                    Some(1),
                    depth * orders_per_level,
                );
                ob.add_order(limit_sell).unwrap()
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_add_cancel(c: &mut Criterion) {
    let mut ob = setup_order_book(100, 10);
    let mut next_id = 10_000_000u64;
    c.bench_function("add then cancel a resting bid", |b| {
        b.iter(|| {
            next_id += 1;
            ob.add_order(Order::new(
                next_id,
                Side::Buy,
                OrderType::GoodTillCancel,
                Some(50),
                1,
            ))
            .unwrap();
            ob.cancel_order(next_id);
        })
    });
}

criterion_group!(benches, bench_match_order, bench_add_cancel);
criterion_main!(benches);
