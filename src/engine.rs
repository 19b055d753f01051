use crate::orderbook::{BookSnapshot, OrderBook};
use crate::orders::{Order, OrderId, OrderType};
use crate::pruner;
use crate::trade::Trade;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::JoinHandle;
use tracing::{debug, info, warn};

/// Thread-safe facade over the [`OrderBook`].
///
/// Every externally visible mutation serializes on a single mutex, so
/// operations are linearizable and the trades returned by one `add_order`
/// are in execution order. The public API has no error channel: rejected
/// admissions return an empty trade list (with the reason logged) and
/// cancels of unknown ids are no-ops, matching the engine's single
/// in-process trust boundary.
///
/// Share an engine across threads with `Arc<Engine>`; independent instances
/// are fully isolated from each other.
pub struct Engine {
    shared: Arc<EngineShared>,
    prune_handle: Option<JoinHandle<()>>,
}

/// State shared between the facade and the pruner thread.
pub(crate) struct EngineShared {
    pub(crate) book: Mutex<OrderBook>,
    pub(crate) shutdown: AtomicBool,
    /// Pairing mutex for `prune_signal`; guards nothing by itself.
    pub(crate) prune_lock: Mutex<()>,
    pub(crate) prune_signal: Condvar,
}

impl Engine {
    /// Creates an engine, optionally starting the good-for-day expiry
    /// pruner thread. Tests pass `false` for deterministic behavior and
    /// drive expiry through [`Engine::prune_good_for_day`].
    pub fn new(start_pruner: bool) -> Self {
        let shared = Arc::new(EngineShared {
            book: Mutex::new(OrderBook::new()),
            shutdown: AtomicBool::new(false),
            prune_lock: Mutex::new(()),
            prune_signal: Condvar::new(),
        });
        let prune_handle = start_pruner.then(|| {
            let shared = Arc::clone(&shared);
            std::thread::spawn(move || pruner::run(shared))
        });
        Engine {
            shared,
            prune_handle,
        }
    }

    /// Admits an order and returns any resulting trades. Rejections
    /// (duplicate id, unmatchable fill-and-kill, unfillable fill-or-kill,
    /// market order against an empty side, invalid quantity/price) return
    /// an empty list and leave the book untouched.
    pub fn add_order(&self, order: Order) -> Vec<Trade> {
        let result = self.shared.book.lock().unwrap().add_order(order);
        match result {
            Ok(trades) => trades,
            Err(reason) => {
                warn!(%reason, "order rejected");
                Vec::new()
            }
        }
    }

    /// Cancels a resting order; unknown ids are ignored.
    pub fn cancel_order(&self, id: OrderId) {
        if !self.shared.book.lock().unwrap().cancel_order(id) {
            debug!(id, "cancel of unknown order ignored");
        }
    }

    /// Atomically replaces the resting order with the same id, re-admitting
    /// the replacement as GoodTillCancel (time priority is lost). The
    /// `original_type` argument is accepted for interface compatibility and
    /// ignored. Unknown ids return an empty trade list.
    pub fn modify_order(&self, order: Order, original_type: OrderType) -> Vec<Trade> {
        let result = self
            .shared
            .book
            .lock()
            .unwrap()
            .modify_order(order, original_type);
        match result {
            Ok(trades) => trades,
            Err(reason) => {
                warn!(%reason, "modify rejected");
                Vec::new()
            }
        }
    }

    /// Number of resting orders.
    pub fn size(&self) -> usize {
        self.shared.book.lock().unwrap().size()
    }

    /// Price-ordered per-level summaries for both sides.
    pub fn snapshot(&self) -> BookSnapshot {
        self.shared.book.lock().unwrap().snapshot()
    }

    /// Cancels every resting GoodForDay order through the normal cancel
    /// path. The id list is collected under the lock and the lock released
    /// between cancels; each cancel re-validates its id, so an id that
    /// vanished in the meantime is a safe no-op.
    pub fn prune_good_for_day(&self) {
        let expired = self.shared.book.lock().unwrap().good_for_day_ids();
        if expired.is_empty() {
            return;
        }
        info!(count = expired.len(), "pruning good-for-day orders");
        for id in expired {
            self.cancel_order(id);
        }
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        // The flag is set under the condvar's pairing mutex so the notify
        // cannot fall into the window between the worker's predicate check
        // and its wait.
        {
            let _guard = self.shared.prune_lock.lock().unwrap();
            self.shared.shutdown.store(true, Ordering::Release);
        }
        self.shared.prune_signal.notify_all();
        if let Some(handle) = self.prune_handle.take() {
            handle.join().ok();
        }
    }
}
