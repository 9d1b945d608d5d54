use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliCommand {
    Run(CliArgs),
    Help,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliArgs {
    pub store_root: PathBuf,
    pub log_to_file: bool,
    pub dry_run: bool,
    pub skip_backlog: bool,
}

pub fn parse_args(args: &[String]) -> Result<CliCommand, String> {
    let mut store_root: Option<PathBuf> = None;
    let mut log_to_file = false;
    let mut dry_run = false;
    let mut skip_backlog = false;

    for arg in args {
        match arg.as_str() {
            "--help" | "-h" => return Ok(CliCommand::Help),
            "--log-to-file" => log_to_file = true,
            "--dry-run" => dry_run = true,
            "--skip-backlog" => skip_backlog = true,
            flag if flag.starts_with('-') => {
                return Err(format!("unknown flag: {flag}\n\n{}", help_text()));
            }
            positional => {
                if store_root.is_some() {
                    return Err(format!("unexpected argument: {positional}\n\n{}", help_text()));
                }
                store_root = Some(PathBuf::from(positional));
            }
        }
    }

    let Some(store_root) = store_root else {
        return Err(format!("missing store root argument\n\n{}", help_text()));
    };

    Ok(CliCommand::Run(CliArgs {
        store_root,
        log_to_file,
        dry_run,
        skip_backlog,
    }))
}

pub fn help_text() -> String {
    [
        "Usage: stagehand <store-root> [flags]",
        "",
        "Watches the record store and runs the task lifecycle:",
        "Inbox -> Active -> Completed/PendingApproval, Approved -> dispatch.",
        "",
        "Flags:",
        "  --log-to-file    Also append runtime events to AuditLog/processor_<date>.log",
        "  --dry-run        Perform moves and validations but skip the agent and executor",
        "  --skip-backlog   Ignore records already in Inbox at startup",
        "  -h, --help       Print this help",
    ]
    .join("\n")
}
