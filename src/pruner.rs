//! Good-for-day expiry pruner.
//!
//! A single background worker that sleeps until the next daily cutoff,
//! then cancels every resting GoodForDay order. Engine teardown wakes the
//! worker through the shared condvar and it exits promptly, skipping any
//! pending prune.

use crate::engine::EngineShared;
use chrono::{Duration, Local, NaiveDateTime, NaiveTime};
use std::sync::Arc;
use std::sync::atomic::Ordering;
use tracing::info;

/// Local wall-clock hour at which GoodForDay orders expire.
const PRUNE_HOUR: u32 = 16;

/// The next cutoff strictly after `now`: today's 16:00 if that is still
/// ahead, otherwise tomorrow's.
fn next_prune_time(now: NaiveDateTime) -> NaiveDateTime {
    let cutoff = NaiveTime::from_hms_opt(PRUNE_HOUR, 0, 0).expect("constant time is valid");
    let today = now.date().and_time(cutoff);
    if now < today {
        today
    } else {
        today + Duration::days(1)
    }
}

/// Worker loop. Waits on the shared condvar with the cutoff as deadline;
/// wakes on timeout (prune) or shutdown (exit). The order ids to expire are
/// collected under the book lock, but each cancellation re-acquires the
/// lock individually so the critical section never spans the whole sweep.
pub(crate) fn run(shared: Arc<EngineShared>) {
    info!("expiry pruner started");
    loop {
        let now = Local::now().naive_local();
        let deadline = next_prune_time(now);
        let wait = (deadline - now).to_std().unwrap_or_default();

        let timed_out = {
            let guard = shared.prune_lock.lock().unwrap();
            let (_guard, timeout) = shared
                .prune_signal
                .wait_timeout_while(guard, wait, |_| !shared.shutdown.load(Ordering::Acquire))
                .unwrap();
            timeout.timed_out()
        };

        if shared.shutdown.load(Ordering::Acquire) {
            info!("expiry pruner shutting down");
            return;
        }
        if !timed_out {
            // Spurious wakeup; recompute the deadline and keep waiting.
            continue;
        }

        let expired = shared.book.lock().unwrap().good_for_day_ids();
        info!(count = expired.len(), "daily cutoff reached, expiring good-for-day orders");
        for id in expired {
            shared.book.lock().unwrap().cancel_order(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Timelike};

    fn at(hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 8)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    #[test]
    fn morning_prunes_same_day() {
        let next = next_prune_time(at(9, 30));
        assert_eq!(next, at(16, 0));
    }

    #[test]
    fn cutoff_itself_rolls_to_tomorrow() {
        let next = next_prune_time(at(16, 0));
        assert_eq!(next, at(16, 0) + Duration::days(1));
    }

    #[test]
    fn evening_prunes_tomorrow() {
        let now = at(21, 45);
        let next = next_prune_time(now);
        assert_eq!(next.time().hour(), PRUNE_HOUR);
        assert!(next > now);
        assert!(next - now <= Duration::days(1));
    }
}
