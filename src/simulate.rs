//! Simulation harness for noisy order flow against the engine.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Exp1, Normal};
use tracing::info;
use uuid::Uuid;

use crate::engine::Engine;
use crate::orders::{Order, OrderId, OrderType, Side};

#[derive(Clone)]
pub struct SimConfig {
    pub orders: u64,      // how many submissions to attempt
    pub noise_sigma: f64, // N(0, σ) drift applied to mid each tick
    pub mean_qty: f64,    // average order size (unit-exp * mean_qty)
    pub seed: Option<u64>, // fix the rng for a reproducible run
}

/// Totals accumulated over one simulation run.
#[derive(Debug, Clone, Copy)]
pub struct SimSummary {
    pub submitted: u64,
    pub trades: u64,
    pub volume: u64,
    pub resting: usize,
}

/// Noisy order-flow loop: quotes around a drifting mid with a mix of order
/// types, occasionally cancelling something it still has outstanding.
pub fn run_simulation(engine: &Engine, cfg: SimConfig) -> SimSummary {
    let mut rng: StdRng = match cfg.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let drift = Normal::new(0.0, cfg.noise_sigma).expect("noise_sigma >= 0");
    let size = Exp1;

    let mut mid: f64 = 100.0;
    let spread = 1.0_f64;
    let mut outstanding: Vec<OrderId> = Vec::new();
    let mut submitted = 0u64;
    let mut trade_count = 0u64;
    let mut volume = 0u64;

    for _ in 0..cfg.orders {
        // mid drift
        mid += drift.sample(&mut rng);

        // sometimes pull an outstanding quote instead of placing a new one
        if !outstanding.is_empty() && rng.random_bool(0.1) {
            let idx = rng.random_range(0..outstanding.len());
            let id = outstanding.swap_remove(idx);
            engine.cancel_order(id);
            continue;
        }

        // or reprice one toward the current mid
        if !outstanding.is_empty() && rng.random_bool(0.05) {
            let idx = rng.random_range(0..outstanding.len());
            let id = outstanding[idx];
            let side = if rng.random_bool(0.5) { Side::Buy } else { Side::Sell };
            let price = mid.max(2.0).round() as u64;
            let quantity = (cfg.mean_qty.max(1.0)).round() as u64;
            let trades = engine.modify_order(
                Order::new(id, side, OrderType::GoodTillCancel, Some(price), quantity),
                OrderType::GoodTillCancel,
            );
            trade_count += trades.len() as u64;
            volume += trades.iter().map(|t| t.taker.quantity).sum::<u64>();
            continue;
        }

        // size ~ Exp1 * mean_qty  (and round to >= 1)
        let unit: f64 = size.sample(&mut rng);
        let quantity = (unit * cfg.mean_qty).max(1.0).round() as u64;

        // quote around mid
        let (side, raw_price) = if rng.random_bool(0.5) {
            (Side::Buy, mid - spread)
        } else {
            (Side::Sell, mid + spread)
        };
        // sanitize price for the engine
        let price = raw_price.max(1.0).round() as u64;

        let order_type = match rng.random_range(0..10) {
            0 => OrderType::Market,
            1 => OrderType::FillAndKill,
            2 => OrderType::FillOrKill,
            3 => OrderType::GoodForDay,
            _ => OrderType::GoodTillCancel,
        };
        let id = Uuid::new_v4().as_u128() as u64;
        let limit = (order_type != OrderType::Market).then_some(price);

        let trades = engine.add_order(Order::new(id, side, order_type, limit, quantity));
        submitted += 1;
        trade_count += trades.len() as u64;
        volume += trades.iter().map(|t| t.taker.quantity).sum::<u64>();
        if matches!(
            order_type,
            OrderType::GoodTillCancel | OrderType::GoodForDay
        ) {
            outstanding.push(id);
        }

        info!(
            ?side,
            ?order_type,
            price,
            quantity,
            fills = trades.len(),
            mid = format_args!("{:.2}", mid),
            "sim tick"
        );
    }

    let summary = SimSummary {
        submitted,
        trades: trade_count,
        volume,
        resting: engine.size(),
    };
    info!(
        submitted = summary.submitted,
        trades = summary.trades,
        volume = summary.volume,
        resting = summary.resting,
        "simulation done"
    );
    summary
}
