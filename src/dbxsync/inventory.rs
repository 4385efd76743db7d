//! Builds the per-run local file inventory and derives destination paths.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use hashbrown::HashMap;

use crate::dbxsync::error::SyncError;

/// Mapping from absolute local path to last-modified time, built fresh on
/// every run
pub type LocalInventory = HashMap<PathBuf, SystemTime>;

/// Recursively collects every non-directory entry under `source` together
/// with its modification time
///
/// # Errors
/// Any traversal or stat failure aborts the whole build, since a partial
/// inventory could cause missed or duplicate uploads
pub fn local_inventory(source: &Path) -> Result<LocalInventory, SyncError> {
    let mut files = HashMap::new();
    collect_files(source, &mut files)?;
    Ok(files)
}

fn collect_files(dir: &Path, files: &mut LocalInventory) -> Result<(), SyncError> {
    let entries = fs::read_dir(dir).map_err(|e| SyncError::filesystem(dir, e))?;

    for entry in entries {
        let entry = entry.map_err(|e| SyncError::filesystem(dir, e))?;
        let metadata = entry
            .metadata()
            .map_err(|e| SyncError::filesystem(&entry.path(), e))?;

        if metadata.is_dir() {
            collect_files(&entry.path(), files)?;
        } else {
            let modified = metadata
                .modified()
                .map_err(|e| SyncError::filesystem(&entry.path(), e))?;
            files.insert(entry.path(), modified);
        }
    }

    Ok(())
}

/// Computes the remote destination for a local file: the destination prefix
/// joined with the file's path relative to the source directory, with
/// separators normalized to '/' regardless of platform
///
/// The result is the join key into the remote inventory, so local and remote
/// key construction must agree on case and separators or entries will
/// silently fail to match
pub fn dest_path(
    dest_prefix: &str,
    source: &Path,
    local_path: &Path,
) -> Result<String, SyncError> {
    let relative = local_path.strip_prefix(source).map_err(|_| {
        SyncError::Config(format!(
            "{:?} is not under source directory {:?}",
            local_path, source
        ))
    })?;

    let mut dest = String::from(dest_prefix.trim_end_matches('/'));
    for component in relative.components() {
        dest.push('/');
        dest.push_str(&component.as_os_str().to_string_lossy());
    }

    Ok(dest)
}
