use super::context::{EventLog, RunContext};
use super::pump::{run_stage_pump, PumpConfig, RecordHandler};
use super::worker_primitives::{WorkerEvent, PUMP_MAX_CONCURRENCY};
use super::RuntimeError;
use crate::actions::MessageExecutor;
use crate::config;
use crate::dispatch;
use crate::store::{bootstrap_store_root, Stage, StorePaths};
use crate::watch::InFlightSet;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    pub dry_run: bool,
    pub log_to_file: bool,
    pub skip_backlog: bool,
}

/// Runs the orchestrator until interrupted: backlog sweep, then one pump per
/// watched stage. Ctrl-C raises the stop flag; pumps finish their in-flight
/// handlers before the supervisor joins them and returns.
pub fn run_orchestrator(store_root: &Path, options: RunOptions) -> Result<(), RuntimeError> {
    let stop = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&stop);
    ctrlc::set_handler(move || flag.store(true, Ordering::Relaxed))?;
    run_orchestrator_with_stop(store_root, options, stop)
}

pub fn run_orchestrator_with_stop(
    store_root: &Path,
    options: RunOptions,
    stop: Arc<AtomicBool>,
) -> Result<(), RuntimeError> {
    if !store_root.exists() {
        return Err(RuntimeError::StoreRootMissing {
            path: store_root.display().to_string(),
        });
    }
    if !store_root.is_dir() {
        return Err(RuntimeError::NotADirectory {
            path: store_root.display().to_string(),
        });
    }

    let paths = StorePaths::new(store_root);
    let settings = config::load_settings(&paths)?;
    bootstrap_store_root(&paths)?;

    let log = if options.log_to_file {
        EventLog::with_file(paths.daily_log_path())
    } else {
        EventLog::to_stdout()
    };
    let ctx = Arc::new(RunContext {
        paths,
        settings,
        log,
        dry_run: options.dry_run,
    });
    ctx.log.info(
        "run.started",
        &format!(
            "store={} dry_run={} skip_backlog={}",
            ctx.paths.root.display(),
            options.dry_run,
            options.skip_backlog
        ),
    );

    let inbox_guard = InFlightSet::new();
    let approved_guard = InFlightSet::new();
    let executor = MessageExecutor::from_settings(&ctx.settings);

    // Startup recovery runs through the same handler as live events, in
    // filename order, before any watcher starts.
    if !options.skip_backlog {
        dispatch::sweep_inbox_backlog(&ctx, &inbox_guard, &stop)?;
    }

    let (events_tx, events_rx) = mpsc::channel::<WorkerEvent>();
    let mut handles = Vec::new();

    {
        let handler_ctx = Arc::clone(&ctx);
        let handler_stop = Arc::clone(&stop);
        let guard = inbox_guard.clone();
        let handler: RecordHandler = Arc::new(move |path| {
            dispatch::handle_inbox_record(&handler_ctx, &guard, &path, &handler_stop);
        });
        let pump_ctx = Arc::clone(&ctx);
        let pump_stop = Arc::clone(&stop);
        let tx = events_tx.clone();
        let seed_existing = options.skip_backlog;
        handles.push(thread::spawn(move || {
            run_stage_pump(
                pump_ctx,
                PumpConfig {
                    stage: Stage::Inbox,
                    max_concurrency: PUMP_MAX_CONCURRENCY,
                    seed_existing,
                },
                pump_stop,
                tx,
                handler,
            )
        }));
    }

    {
        let handler_ctx = Arc::clone(&ctx);
        let handler_stop = Arc::clone(&stop);
        let guard = approved_guard.clone();
        let handler_executor = executor.clone();
        let handler: RecordHandler = Arc::new(move |path| {
            dispatch::handle_approved_record(
                &handler_ctx,
                &guard,
                &handler_executor,
                &path,
                &handler_stop,
            );
        });
        let pump_ctx = Arc::clone(&ctx);
        let pump_stop = Arc::clone(&stop);
        let tx = events_tx.clone();
        handles.push(thread::spawn(move || {
            run_stage_pump(
                pump_ctx,
                PumpConfig {
                    stage: Stage::Approved,
                    max_concurrency: PUMP_MAX_CONCURRENCY,
                    seed_existing: true,
                },
                pump_stop,
                tx,
                handler,
            )
        }));
    }

    {
        let handler_ctx = Arc::clone(&ctx);
        let handler: RecordHandler = Arc::new(move |path| {
            dispatch::handle_rejected_record(&handler_ctx, &path);
        });
        let pump_ctx = Arc::clone(&ctx);
        let pump_stop = Arc::clone(&stop);
        let tx = events_tx.clone();
        handles.push(thread::spawn(move || {
            run_stage_pump(
                pump_ctx,
                PumpConfig {
                    stage: Stage::Rejected,
                    max_concurrency: 0,
                    seed_existing: true,
                },
                pump_stop,
                tx,
                handler,
            )
        }));
    }
    drop(events_tx);

    loop {
        match events_rx.recv_timeout(Duration::from_millis(200)) {
            Ok(WorkerEvent::Started { worker_id }) => {
                ctx.log.info("worker.started", &worker_id);
            }
            Ok(WorkerEvent::Error { worker_id, message }) => {
                ctx.log
                    .warn("worker.error", &format!("{worker_id}: {message}"));
            }
            Ok(WorkerEvent::Stopped { worker_id }) => {
                ctx.log.info("worker.stopped", &worker_id);
            }
            Err(RecvTimeoutError::Timeout) => {}
            // All pump senders dropped: every watcher has exited.
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    for handle in handles {
        let _ = handle.join();
    }
    ctx.log.info("run.stopped", "graceful shutdown");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn pre_stopped() -> Arc<AtomicBool> {
        Arc::new(AtomicBool::new(true))
    }

    #[test]
    fn missing_store_root_is_fatal() {
        let dir = tempdir().expect("temp dir");
        let err = run_orchestrator_with_stop(
            &dir.path().join("gone"),
            RunOptions::default(),
            pre_stopped(),
        )
        .expect_err("must fail");
        assert!(matches!(err, RuntimeError::StoreRootMissing { .. }));
    }

    #[test]
    fn file_store_root_is_fatal() {
        let dir = tempdir().expect("temp dir");
        let file = dir.path().join("vault");
        fs::write(&file, "").expect("write");
        let err = run_orchestrator_with_stop(&file, RunOptions::default(), pre_stopped())
            .expect_err("must fail");
        assert!(matches!(err, RuntimeError::NotADirectory { .. }));
    }

    #[test]
    fn malformed_settings_are_fatal() {
        let dir = tempdir().expect("temp dir");
        fs::write(dir.path().join("config.yaml"), "poll_interval_ms: {broken\n").expect("write");
        let err = run_orchestrator_with_stop(dir.path(), RunOptions::default(), pre_stopped())
            .expect_err("must fail");
        assert!(matches!(err, RuntimeError::Config(_)));
    }

    #[test]
    fn startup_bootstraps_stage_directories_and_shuts_down_cleanly() {
        let dir = tempdir().expect("temp dir");
        run_orchestrator_with_stop(dir.path(), RunOptions::default(), pre_stopped())
            .expect("clean run");

        let paths = StorePaths::new(dir.path());
        for required in paths.required_directories() {
            assert!(required.is_dir(), "missing {}", required.display());
        }
    }
}
