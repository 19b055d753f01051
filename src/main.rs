use anyhow::Result;
use clap::{Parser, Subcommand};
use lob_engine::engine::Engine;
use lob_engine::orders::{Order, OrderType, Side};
use lob_engine::simulate::{self, SimConfig};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "lob-engine")]
#[command(version = "0.1", about = "A demo of a limit-order-book matching engine")]
struct Cli {
    /// Log verbosity (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a small scripted session and print the trades and the book
    Demo,
    /// Drive the engine with random order flow
    Simulate {
        /// Number of order submissions
        #[arg(long, default_value_t = 1000)]
        orders: u64,
        /// Fix the RNG seed for a reproducible run
        #[arg(long)]
        seed: Option<u64>,
        /// Start the good-for-day expiry pruner thread
        #[arg(long)]
        pruner: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    // Setup tracing
    let level: Level = cli.log_level.parse()?;
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Demo => run_demo()?,
        Commands::Simulate {
            orders,
            seed,
            pruner,
        } => {
            let engine = Engine::new(pruner);
            let summary = simulate::run_simulation(
                &engine,
                SimConfig {
                    orders,
                    noise_sigma: 0.5,
                    mean_qty: 4.0,
                    seed,
                },
            );
            println!(
                "submitted={} trades={} volume={} resting={}",
                summary.submitted, summary.trades, summary.volume, summary.resting
            );
            println!("{}", serde_json::to_string_pretty(&engine.snapshot())?);
        }
    };
    Ok(())
}

/// Seed a resting sell, cross it with a buy, and show the results.
fn run_demo() -> Result<()> {
    let engine = Engine::new(false);

    engine.add_order(Order::new(1, Side::Sell, OrderType::GoodTillCancel, Some(100), 5));
    let trades = engine.add_order(Order::new(2, Side::Buy, OrderType::GoodTillCancel, Some(100), 3));

    for trade in &trades {
        println!(
            "TRADE EXECUTED:\n  BuyOrderID: {} @ Price: {} for Qty: {}\n  SellOrderID: {} @ Price: {} for Qty: {}",
            trade.taker.order_id,
            trade.taker.price,
            trade.taker.quantity,
            trade.maker.order_id,
            trade.maker.price,
            trade.maker.quantity
        );
    }
    println!("{}", serde_json::to_string_pretty(&engine.snapshot())?);
    Ok(())
}
