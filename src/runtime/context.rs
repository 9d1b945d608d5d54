use crate::config::Settings;
use crate::store::StorePaths;
use std::fs;
use std::io::Write;
use std::path::PathBuf;

/// Everything a handler needs, built once at startup and passed down
/// explicitly. There is no global configuration or logger.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub paths: StorePaths,
    pub settings: Settings,
    pub log: EventLog,
    pub dry_run: bool,
}

/// Runtime event log: one human-readable line per event on stdout, and when
/// file logging is enabled, one JSON line appended to the daily log under
/// AuditLog. Append failures are swallowed; logging never takes the
/// orchestrator down.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    file: Option<PathBuf>,
}

impl EventLog {
    pub fn to_stdout() -> Self {
        Self { file: None }
    }

    pub fn with_file(path: PathBuf) -> Self {
        Self { file: Some(path) }
    }

    pub fn info(&self, event: &str, message: &str) {
        self.write("info", event, message);
    }

    pub fn warn(&self, event: &str, message: &str) {
        self.write("warn", event, message);
    }

    pub fn error(&self, event: &str, message: &str) {
        self.write("error", event, message);
    }

    fn write(&self, level: &str, event: &str, message: &str) {
        let timestamp = chrono::Utc::now().to_rfc3339();
        println!("{timestamp} [{level}] {event}: {message}");

        let Some(path) = &self.file else {
            return;
        };
        let payload = serde_json::json!({
            "timestamp": timestamp,
            "level": level,
            "event": event,
            "message": message,
        });
        let Ok(line) = serde_json::to_string(&payload) else {
            return;
        };
        if let Some(parent) = path.parent() {
            if fs::create_dir_all(parent).is_err() {
                return;
            }
        }
        let Ok(mut file) = fs::OpenOptions::new().create(true).append(true).open(path) else {
            return;
        };
        let _ = writeln!(file, "{line}");
    }
}
