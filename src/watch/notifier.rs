use crate::store::StoreError;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

pub const RECORD_EXTENSION: &str = "md";

/// Lists the record files in one stage directory, one level deep, sorted by
/// filename. Directories and files without the record extension are ignored.
pub fn list_records(dir: &Path) -> Result<Vec<PathBuf>, StoreError> {
    let entries = fs::read_dir(dir).map_err(|source| StoreError::ReadDir {
        path: dir.display().to_string(),
        source,
    })?;

    let mut records = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| StoreError::ReadDir {
            path: dir.display().to_string(),
            source,
        })?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        if path.extension().and_then(|ext| ext.to_str()) != Some(RECORD_EXTENSION) {
            continue;
        }
        records.push(path);
    }
    records.sort();
    Ok(records)
}

/// One polling pass over a stage directory: returns the records not seen on
/// the previous pass, sorted by filename. `known` is replaced with the
/// current listing, so a name that disappears and later reappears fires
/// again. Suppression of re-entrant handling for a name already in flight is
/// the idempotency guard's job, not the scanner's.
pub fn scan_new_records(
    dir: &Path,
    known: &mut BTreeSet<String>,
) -> Result<Vec<PathBuf>, StoreError> {
    let current = list_records(dir)?;
    let mut names = BTreeSet::new();
    let mut fresh = Vec::new();
    for path in current {
        let name = match path.file_name().and_then(|name| name.to_str()) {
            Some(name) => name.to_string(),
            None => continue,
        };
        if !known.contains(&name) {
            fresh.push(path);
        }
        names.insert(name);
    }
    *known = names;
    Ok(fresh)
}

/// Seeds a `known` set with whatever is already present, so a watcher can
/// start without reporting pre-existing files.
pub fn seed_known(dir: &Path) -> Result<BTreeSet<String>, StoreError> {
    let mut known = BTreeSet::new();
    scan_new_records(dir, &mut known)?;
    Ok(known)
}
