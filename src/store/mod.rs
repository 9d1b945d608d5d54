pub mod paths;
pub mod stage;
pub mod transition;

pub use paths::{bootstrap_store_root, StorePaths, INFORMATIONAL_DIRS};
pub use stage::Stage;
pub use transition::{move_record, move_to_audit_batch, write_new_record};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to create stage directory {path}: {source}")]
    CreateDir {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("record vanished before it could be moved: {path}")]
    SourceMissing { path: String },
    #[error("failed to move {path} to {dest}: {source}")]
    Move {
        path: String,
        dest: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to read stage directory {path}: {source}")]
    ReadDir {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write record {path}: {source}")]
    WriteRecord {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("record path has no usable file name: {path}")]
    InvalidName { path: String },
}
