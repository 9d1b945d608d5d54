use crate::record::{serialize_document, Document};
use crate::store::{write_new_record, Stage, StoreError, StorePaths};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Audit entries and orchestrator-generated Inbox notices. Every entry is
/// itself a record document, written with the codec's serializer and the
/// store's no-overwrite rule, named `<PREFIX>_<timestamp>_<stem>.md`.

fn timestamp_slug() -> String {
    chrono::Utc::now().format("%Y%m%d_%H%M%S").to_string()
}

fn timestamp_field() -> String {
    chrono::Utc::now().to_rfc3339()
}

fn stem_of(original: &str) -> String {
    Path::new(original)
        .file_stem()
        .map(|value| value.to_string_lossy().to_string())
        .unwrap_or_else(|| "record".to_string())
}

fn header(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect()
}

fn write_entry(
    paths: &StorePaths,
    stage: Stage,
    prefix: &str,
    original: &str,
    doc: &Document,
) -> Result<PathBuf, StoreError> {
    let name = format!("{prefix}_{}_{}.md", timestamp_slug(), stem_of(original));
    write_new_record(&paths.stage_dir(stage), &name, &serialize_document(doc))
}

/// Records that a human approved a record, before anything executes.
pub fn write_approval_entry(paths: &StorePaths, original: &str) -> Result<PathBuf, StoreError> {
    let timestamp = timestamp_field();
    let doc = Document::new(
        header(&[
            ("type", "approval_log"),
            ("original_file", original),
            ("timestamp", &timestamp),
        ]),
        format!("## Approval Received\n\nApproval recorded for `{original}`.\n"),
    );
    write_entry(paths, Stage::AuditLog, "APPROVED", original, &doc)
}

/// Records the outcome of one action dispatch attempt.
pub fn write_action_entry(
    paths: &StorePaths,
    original: &str,
    action: &str,
    success: bool,
    detail: &str,
) -> Result<PathBuf, StoreError> {
    let status = if success { "success" } else { "failed" };
    let prefix = if success {
        "ACTION_SUCCESS"
    } else {
        "ACTION_FAILED"
    };
    let timestamp = timestamp_field();
    let doc = Document::new(
        header(&[
            ("type", "action_log"),
            ("original_file", original),
            ("action", action),
            ("status", status),
            ("timestamp", &timestamp),
        ]),
        format!(
            "## Action {}\n\n**Action:** {action}\n**Record:** {original}\n**Detail:** {detail}\n",
            if success { "Succeeded" } else { "Failed" }
        ),
    );
    write_entry(paths, Stage::AuditLog, prefix, original, &doc)
}

/// Records a rejection. A single cheap write, idempotent in effect.
pub fn write_rejection_entry(paths: &StorePaths, original: &str) -> Result<PathBuf, StoreError> {
    let timestamp = timestamp_field();
    let doc = Document::new(
        header(&[
            ("type", "rejection_log"),
            ("original_file", original),
            ("timestamp", &timestamp),
        ]),
        format!("## Rejection Recorded\n\nRejection recorded for `{original}`.\n"),
    );
    write_entry(paths, Stage::AuditLog, "REJECTED", original, &doc)
}

/// Raises a failed approved action back into the Inbox so the failure
/// surfaces through the normal flow, not only in logs.
pub fn write_failure_alert(
    paths: &StorePaths,
    original: &str,
    action: &str,
    detail: &str,
) -> Result<PathBuf, StoreError> {
    let timestamp = timestamp_field();
    let doc = Document::new(
        header(&[
            ("type", "alert"),
            ("status", "pending"),
            ("priority", "high"),
            ("original_file", original),
            ("action", action),
            ("timestamp", &timestamp),
        ]),
        format!(
            "## Action Execution Failed\n\n\
             The approved action **{action}** could not be executed.\n\n\
             **Record:** `Approved/{original}`\n\
             **Error:** {detail}\n\n\
             Fix the issue and move the record back into `Approved/` to retry,\n\
             or execute the action manually and move it to `Completed/`.\n"
        ),
    );
    write_entry(paths, Stage::Inbox, "ALERT_FAILED", original, &doc)
}

/// Deliberate escape hatch for recognized action kinds that have no
/// automated handler yet: the task never silently disappears, it comes back
/// as an Inbox record asking for manual handling.
pub fn write_manual_notice(
    paths: &StorePaths,
    original: &str,
    action: &str,
) -> Result<PathBuf, StoreError> {
    let timestamp = timestamp_field();
    let doc = Document::new(
        header(&[
            ("type", "manual_action"),
            ("status", "pending"),
            ("priority", "normal"),
            ("original_file", original),
            ("action", action),
            ("timestamp", &timestamp),
        ]),
        format!(
            "## Manual Handling Required\n\n\
             The action **{action}** was approved but has no automated handler yet.\n\n\
             **Record:** {original}\n\n\
             - [ ] Perform the `{action}` action manually\n\
             - [ ] Move the original record to `Completed/` when done\n"
        ),
    );
    write_entry(paths, Stage::Inbox, "MANUAL", original, &doc)
}
