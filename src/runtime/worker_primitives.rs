use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

/// Handler threads per stage pump, at most.
pub const PUMP_MAX_CONCURRENCY: usize = 4;

#[derive(Debug, Clone)]
pub enum WorkerEvent {
    Started { worker_id: String },
    Error { worker_id: String, message: String },
    Stopped { worker_id: String },
}

/// Sleeps in short steps so a stop request interrupts the wait. Returns
/// false when the stop flag was raised before the full duration elapsed.
pub fn sleep_with_stop(stop: &AtomicBool, total: Duration) -> bool {
    let mut remaining = total;
    while remaining > Duration::from_millis(0) {
        if stop.load(Ordering::Relaxed) {
            return false;
        }
        let step = remaining.min(Duration::from_millis(100));
        thread::sleep(step);
        remaining = remaining.saturating_sub(step);
    }
    !stop.load(Ordering::Relaxed)
}
