use super::{Stage, StoreError, StorePaths};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Moves a record into the target stage directory. The destination directory
/// is created if absent; an existing destination name is never overwritten —
/// the filename stem gets an incrementing numeric suffix until a free name is
/// found. A vanished source is reported as `SourceMissing`, not retried.
pub fn move_record(
    paths: &StorePaths,
    src: &Path,
    target: Stage,
) -> Result<PathBuf, StoreError> {
    let dest_dir = paths.stage_dir(target);
    fs::create_dir_all(&dest_dir).map_err(|source| StoreError::CreateDir {
        path: dest_dir.display().to_string(),
        source,
    })?;
    move_into_dir(src, &dest_dir)
}

/// Moves a failed record into a fresh timestamped batch directory under
/// AuditLog, so each failure is inspectable in isolation.
pub fn move_to_audit_batch(paths: &StorePaths, src: &Path) -> Result<PathBuf, StoreError> {
    let audit_dir = paths.stage_dir(Stage::AuditLog);
    let slug = timestamp_slug();
    let mut batch = audit_dir.join(format!("Error_{slug}"));
    let mut counter = 1u32;
    while batch.exists() {
        batch = audit_dir.join(format!("Error_{slug}_{counter}"));
        counter += 1;
    }
    fs::create_dir_all(&batch).map_err(|source| StoreError::CreateDir {
        path: batch.display().to_string(),
        source,
    })?;
    move_into_dir(src, &batch)
}

/// Creates a new record in `dir` without ever clobbering an existing file:
/// the open uses `create_new`, and a taken name falls back to the same
/// numeric-suffix rule the move uses.
pub fn write_new_record(dir: &Path, file_name: &str, content: &str) -> Result<PathBuf, StoreError> {
    fs::create_dir_all(dir).map_err(|source| StoreError::CreateDir {
        path: dir.display().to_string(),
        source,
    })?;

    let (stem, suffix) = split_name(Path::new(file_name));
    let mut candidate = dir.join(file_name);
    let mut counter = 1u32;
    loop {
        match fs::OpenOptions::new()
            .create_new(true)
            .write(true)
            .open(&candidate)
        {
            Ok(mut file) => {
                file.write_all(content.as_bytes())
                    .map_err(|source| StoreError::WriteRecord {
                        path: candidate.display().to_string(),
                        source,
                    })?;
                return Ok(candidate);
            }
            Err(err) if err.kind() == std::io::ErrorKind::AlreadyExists => {
                candidate = dir.join(format!("{stem}_{counter}{suffix}"));
                counter += 1;
            }
            Err(source) => {
                return Err(StoreError::WriteRecord {
                    path: candidate.display().to_string(),
                    source,
                })
            }
        }
    }
}

fn move_into_dir(src: &Path, dest_dir: &Path) -> Result<PathBuf, StoreError> {
    let file_name = src.file_name().ok_or_else(|| StoreError::InvalidName {
        path: src.display().to_string(),
    })?;

    let (stem, suffix) = split_name(Path::new(file_name));
    let mut dest = dest_dir.join(file_name);
    let mut counter = 1u32;
    while dest.exists() {
        dest = dest_dir.join(format!("{stem}_{counter}{suffix}"));
        counter += 1;
    }

    match fs::rename(src, &dest) {
        Ok(()) => Ok(dest),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            Err(StoreError::SourceMissing {
                path: src.display().to_string(),
            })
        }
        Err(source) => Err(StoreError::Move {
            path: src.display().to_string(),
            dest: dest.display().to_string(),
            source,
        }),
    }
}

fn split_name(name: &Path) -> (String, String) {
    let stem = name
        .file_stem()
        .map(|value| value.to_string_lossy().to_string())
        .unwrap_or_else(|| "record".to_string());
    let suffix = name
        .extension()
        .map(|value| format!(".{}", value.to_string_lossy()))
        .unwrap_or_default();
    (stem, suffix)
}

fn timestamp_slug() -> String {
    chrono::Utc::now().format("%Y%m%d_%H%M%S").to_string()
}
