use crate::audit;
use crate::runtime::RunContext;
use std::path::Path;

/// A record moved into Rejected is merely recorded: one audit entry, no
/// routing, no guard. Running twice for the same record just writes a second
/// entry, which is harmless.
pub fn handle_rejected_record(ctx: &RunContext, path: &Path) {
    let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
        return;
    };

    ctx.log.info("rejection.noted", name);
    match audit::write_rejection_entry(&ctx.paths, name) {
        Ok(entry) => ctx
            .log
            .info("rejection.logged", &entry.display().to_string()),
        Err(err) => ctx
            .log
            .error("rejection.log_failed", &format!("{name}: {err}")),
    }
}
