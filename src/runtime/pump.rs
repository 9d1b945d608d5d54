use super::worker_primitives::{sleep_with_stop, WorkerEvent};
use super::RunContext;
use crate::store::Stage;
use crate::watch::notifier::{scan_new_records, seed_known};
use std::collections::{BTreeSet, VecDeque};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone, Copy)]
pub struct PumpConfig {
    pub stage: Stage,
    /// Handler threads running at once; zero runs handlers inline on the
    /// watcher thread (used for the cheap Rejected audit write).
    pub max_concurrency: usize,
    /// Treat files already present at startup as known instead of reporting
    /// them. Inbox sets this only when the backlog sweep is skipped.
    pub seed_existing: bool,
}

pub type RecordHandler = Arc<dyn Fn(PathBuf) + Send + Sync>;

/// One stage watcher: polls the stage directory, dispatches each newly seen
/// record to the handler, and drains in-flight handlers before exiting on
/// stop. Unrelated records flow in parallel; serialization per record name is
/// the idempotency guard's job inside the handler.
pub fn run_stage_pump(
    ctx: Arc<RunContext>,
    config: PumpConfig,
    stop: Arc<AtomicBool>,
    events: Sender<WorkerEvent>,
    handler: RecordHandler,
) {
    let dir = ctx.paths.stage_dir(config.stage);
    let worker_id = format!("pump.{}", config.stage);

    let mut known = if config.seed_existing {
        match seed_known(&dir) {
            Ok(known) => known,
            Err(err) => {
                let _ = events.send(WorkerEvent::Error {
                    worker_id: worker_id.clone(),
                    message: err.to_string(),
                });
                BTreeSet::new()
            }
        }
    } else {
        BTreeSet::new()
    };

    let _ = events.send(WorkerEvent::Started {
        worker_id: worker_id.clone(),
    });

    let (done_tx, done_rx) = mpsc::channel::<()>();
    let mut in_flight = 0usize;
    let mut pending: VecDeque<PathBuf> = VecDeque::new();

    loop {
        let stopping = stop.load(Ordering::Relaxed);

        if !stopping {
            match scan_new_records(&dir, &mut known) {
                Ok(fresh) => pending.extend(fresh),
                Err(err) => {
                    let _ = events.send(WorkerEvent::Error {
                        worker_id: worker_id.clone(),
                        message: err.to_string(),
                    });
                }
            }
        }

        while !stopping {
            if config.max_concurrency > 0 && in_flight >= config.max_concurrency {
                break;
            }
            let Some(path) = pending.pop_front() else {
                break;
            };
            if config.max_concurrency == 0 {
                (handler.as_ref())(path);
                continue;
            }
            let tx = done_tx.clone();
            let task = Arc::clone(&handler);
            thread::spawn(move || {
                (task.as_ref())(path);
                let _ = tx.send(());
            });
            in_flight += 1;
        }

        while done_rx.try_recv().is_ok() {
            in_flight = in_flight.saturating_sub(1);
        }

        if stopping {
            if in_flight == 0 {
                break;
            }
            match done_rx.recv_timeout(Duration::from_millis(100)) {
                Ok(()) => in_flight = in_flight.saturating_sub(1),
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => break,
            }
            continue;
        }

        sleep_with_stop(&stop, ctx.settings.poll_interval());
    }

    let _ = events.send(WorkerEvent::Stopped { worker_id });
}
