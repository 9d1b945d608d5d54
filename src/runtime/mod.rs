pub mod context;
pub mod pump;
pub mod supervisor;
pub mod worker_primitives;

pub use context::{EventLog, RunContext};
pub use supervisor::{run_orchestrator, run_orchestrator_with_stop, RunOptions};
pub use worker_primitives::{sleep_with_stop, WorkerEvent};

#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    #[error("store root does not exist: {path}")]
    StoreRootMissing { path: String },
    #[error("store root is not a directory: {path}")]
    NotADirectory { path: String },
    #[error(transparent)]
    Config(#[from] crate::config::ConfigError),
    #[error(transparent)]
    Store(#[from] crate::store::StoreError),
    #[error("failed to install interrupt handler: {0}")]
    Signal(#[from] ctrlc::Error),
}
