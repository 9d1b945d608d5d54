use super::{Stage, StoreError};
use std::fs;
use std::path::PathBuf;

/// Resolves the stage directories of one record store (the "vault" root the
/// CLI is pointed at).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorePaths {
    pub root: PathBuf,
}

/// Directories created at bootstrap for the reporting side of the business.
/// The orchestrator never reads them or routes records into them.
pub const INFORMATIONAL_DIRS: [&str; 2] = ["Accounting", "Reporting-output"];

impl StorePaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn stage_dir(&self, stage: Stage) -> PathBuf {
        self.root.join(stage.dir_name())
    }

    pub fn settings_file(&self) -> PathBuf {
        self.root.join("config.yaml")
    }

    /// Daily runtime log, kept alongside the audit entries.
    pub fn daily_log_path(&self) -> PathBuf {
        let date = chrono::Utc::now().format("%Y-%m-%d");
        self.stage_dir(Stage::AuditLog)
            .join(format!("processor_{date}.log"))
    }

    pub fn required_directories(&self) -> Vec<PathBuf> {
        let mut dirs: Vec<PathBuf> = Stage::ALL
            .iter()
            .map(|stage| self.stage_dir(*stage))
            .collect();
        dirs.extend(INFORMATIONAL_DIRS.iter().map(|name| self.root.join(name)));
        dirs
    }
}

pub fn bootstrap_store_root(paths: &StorePaths) -> Result<(), StoreError> {
    for path in paths.required_directories() {
        fs::create_dir_all(&path).map_err(|source| StoreError::CreateDir {
            path: path.display().to_string(),
            source,
        })?;
    }
    Ok(())
}
