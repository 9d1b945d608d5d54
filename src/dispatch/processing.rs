use crate::agent::{self, AgentError};
use crate::runtime::{sleep_with_stop, RunContext};
use crate::store::{self, Stage, StoreError};
use crate::watch::notifier::list_records;
use crate::watch::InFlightSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;

/// Handles one new Inbox record: claim, settle, move to Active, invoke the
/// agent, route on outcome. Every failure is contained to this record; the
/// claim ticket releases on all exit paths.
pub fn handle_inbox_record(ctx: &RunContext, guard: &InFlightSet, path: &Path, stop: &AtomicBool) {
    let Some(name) = path
        .file_name()
        .and_then(|name| name.to_str())
        .map(str::to_string)
    else {
        return;
    };
    let Some(_ticket) = guard.try_claim(&name) else {
        ctx.log.info("processing.duplicate_dropped", &name);
        return;
    };

    ctx.log.info("processing.detected", &name);

    // Let whoever created the file finish flushing it.
    if !sleep_with_stop(stop, ctx.settings.settle_delay()) {
        ctx.log
            .info("processing.interrupted", &format!("{name} left in Inbox"));
        return;
    }
    if !path.exists() {
        ctx.log.warn("processing.vanished", &name);
        return;
    }

    let active_path = match store::move_record(&ctx.paths, path, Stage::Active) {
        Ok(dest) => dest,
        Err(StoreError::SourceMissing { .. }) => {
            ctx.log.warn("processing.vanished", &name);
            return;
        }
        Err(err) => {
            ctx.log
                .error("processing.move_failed", &format!("{name}: {err}"));
            return;
        }
    };

    let result = if ctx.dry_run {
        ctx.log
            .info("processing.agent_skipped", &format!("{name}: dry run"));
        Ok(())
    } else {
        invoke_agent(ctx, &name)
    };

    match result {
        Ok(()) => {
            // The agent relocates the record itself when it finishes; a
            // record still in Active is partial progress left for review.
            if active_path.exists() {
                ctx.log.info("processing.remains_active", &name);
            } else {
                ctx.log.info("processing.relocated_by_agent", &name);
            }
        }
        Err(err) => {
            ctx.log
                .error("processing.agent_failed", &format!("{name}: {err}"));
            if active_path.exists() {
                match store::move_to_audit_batch(&ctx.paths, &active_path) {
                    Ok(dest) => ctx
                        .log
                        .info("processing.routed_to_audit", &dest.display().to_string()),
                    Err(err) => ctx
                        .log
                        .error("processing.audit_move_failed", &format!("{name}: {err}")),
                }
            }
        }
    }
}

fn invoke_agent(ctx: &RunContext, name: &str) -> Result<(), AgentError> {
    let invocation = agent::invocation_for_task(&ctx.settings, &ctx.paths.root, name);
    ctx.log
        .info("processing.agent_started", &format!("{name} via {}", invocation.program));
    let outcome = agent::run_agent(&invocation)?;
    if !outcome.stdout.is_empty() {
        ctx.log
            .info("processing.agent_output", tail(&outcome.stdout, 2000));
    }
    if !outcome.stderr.is_empty() {
        ctx.log
            .warn("processing.agent_stderr", tail(&outcome.stderr, 1000));
    }
    ctx.log.info(
        "processing.agent_completed",
        &format!("{name} in {}ms", outcome.duration.as_millis()),
    );
    Ok(())
}

/// Startup recovery: records already sitting in Inbox are handled in
/// ascending filename order through the same path as live notifications.
/// Returns the swept records in the order they were handled.
pub fn sweep_inbox_backlog(
    ctx: &RunContext,
    guard: &InFlightSet,
    stop: &AtomicBool,
) -> Result<Vec<PathBuf>, StoreError> {
    let backlog = list_records(&ctx.paths.stage_dir(Stage::Inbox))?;
    if backlog.is_empty() {
        ctx.log.info("backlog.empty", "no records waiting in Inbox");
        return Ok(backlog);
    }

    ctx.log
        .info("backlog.start", &format!("{} record(s) in Inbox", backlog.len()));
    for path in &backlog {
        handle_inbox_record(ctx, guard, path, stop);
    }
    ctx.log.info("backlog.done", &format!("{} record(s)", backlog.len()));
    Ok(backlog)
}

fn tail(text: &str, max: usize) -> &str {
    if text.len() <= max {
        return text;
    }
    let mut start = text.len() - max;
    while !text.is_char_boundary(start) {
        start += 1;
    }
    &text[start..]
}
