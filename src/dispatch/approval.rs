use crate::actions::{ActionKind, MessageExecutor, SendMessageDirective};
use crate::audit;
use crate::record::{parse_document, Document};
use crate::runtime::{sleep_with_stop, RunContext};
use crate::store::{self, Stage, StoreError};
use crate::watch::InFlightSet;
use std::fs;
use std::path::Path;
use std::sync::atomic::AtomicBool;

/// Handles one record a human moved into Approved: log the approval, parse
/// the directive, execute it, then route to Completed or leave it in
/// Approved with a failure alert raised in the Inbox.
pub fn handle_approved_record(
    ctx: &RunContext,
    guard: &InFlightSet,
    executor: &MessageExecutor,
    path: &Path,
    stop: &AtomicBool,
) {
    let Some(name) = path
        .file_name()
        .and_then(|name| name.to_str())
        .map(str::to_string)
    else {
        return;
    };
    let Some(_ticket) = guard.try_claim(&name) else {
        ctx.log.info("approval.duplicate_dropped", &name);
        return;
    };

    ctx.log.info("approval.received", &name);

    if !sleep_with_stop(stop, ctx.settings.settle_delay()) {
        ctx.log
            .info("approval.interrupted", &format!("{name} left in Approved"));
        return;
    }
    if !path.exists() {
        ctx.log.warn("approval.vanished", &name);
        return;
    }

    // The approval event is recorded before anything executes.
    if let Err(err) = audit::write_approval_entry(&ctx.paths, &name) {
        ctx.log
            .error("approval.log_failed", &format!("{name}: {err}"));
    }

    // Unreadable content means "no directive", never a crash.
    let content = fs::read_to_string(path).unwrap_or_default();
    let doc = parse_document(&content);

    let outcome = execute_directive(ctx, executor, &doc, &name);
    match outcome.result {
        Ok(detail) => {
            ctx.log
                .info("approval.dispatched", &format!("{name}: {detail}"));
            if let Err(err) =
                audit::write_action_entry(&ctx.paths, &name, &outcome.action, true, &detail)
            {
                ctx.log
                    .error("approval.log_failed", &format!("{name}: {err}"));
            }
            if !path.exists() {
                return;
            }
            match store::move_record(&ctx.paths, path, Stage::Completed) {
                Ok(dest) => ctx
                    .log
                    .info("approval.completed", &dest.display().to_string()),
                Err(StoreError::SourceMissing { .. }) => {}
                Err(err) => ctx
                    .log
                    .error("approval.move_failed", &format!("{name}: {err}")),
            }
        }
        Err(detail) => {
            ctx.log
                .error("approval.action_failed", &format!("{name}: {detail}"));
            if let Err(err) =
                audit::write_action_entry(&ctx.paths, &name, &outcome.action, false, &detail)
            {
                ctx.log
                    .error("approval.log_failed", &format!("{name}: {err}"));
            }
            // The record stays in Approved for correction and re-approval;
            // the alert surfaces the failure through the normal Inbox flow.
            match audit::write_failure_alert(&ctx.paths, &name, &outcome.action, &detail) {
                Ok(alert) => ctx
                    .log
                    .info("approval.alert_raised", &alert.display().to_string()),
                Err(err) => ctx
                    .log
                    .error("approval.alert_failed", &format!("{name}: {err}")),
            }
        }
    }
}

struct DirectiveOutcome {
    action: String,
    result: Result<String, String>,
}

/// Dispatches the record's action directive. `Ok` carries a human-readable
/// success detail for the audit entry, `Err` the failure detail. An absent
/// `action_type` is not an error; an unrecognized one is.
fn execute_directive(
    ctx: &RunContext,
    executor: &MessageExecutor,
    doc: &Document,
    original: &str,
) -> DirectiveOutcome {
    let Some(raw) = doc.field("action_type") else {
        return DirectiveOutcome {
            action: "none".to_string(),
            result: Ok("no automated action declared; approval logged".to_string()),
        };
    };

    let kind = match ActionKind::parse(raw) {
        Ok(kind) => kind,
        Err(err) => {
            return DirectiveOutcome {
                action: raw.to_string(),
                result: Err(err.to_string()),
            }
        }
    };

    let result = match kind {
        ActionKind::SendMessage => dispatch_send_message(ctx, executor, doc),
        ActionKind::Unimplemented(_) => {
            match audit::write_manual_notice(&ctx.paths, original, kind.label()) {
                Ok(notice) => Ok(format!(
                    "no automated handler for {kind}; manual-handling notice created: {}",
                    notice
                        .file_name()
                        .map(|name| name.to_string_lossy().to_string())
                        .unwrap_or_default()
                )),
                Err(err) => Err(format!("failed to write manual-handling notice: {err}")),
            }
        }
    };

    DirectiveOutcome {
        action: kind.label().to_string(),
        result,
    }
}

fn dispatch_send_message(
    ctx: &RunContext,
    executor: &MessageExecutor,
    doc: &Document,
) -> Result<String, String> {
    let directive = SendMessageDirective::from_document(doc).map_err(|err| err.to_string())?;
    if ctx.dry_run {
        return Ok(format!(
            "dry run: message to {} not dispatched",
            directive.to
        ));
    }
    let receipt = executor.send(&directive).map_err(|err| err.to_string())?;
    Ok(format!(
        "message dispatched to {} (messageId={})",
        directive.to,
        receipt.message_id.as_deref().unwrap_or("unknown")
    ))
}
