use std::path::Path;

use anyhow::{bail, Context, Result};
use drive_fs::UploadItem;
use walkdir::WalkDir;

/// Collect every regular file under `root` as an upload item whose relative
/// path mirrors its position below `root`.
///
/// Directories without files are not part of an upload and are not recreated.
/// Unreadable directory entries are logged and skipped.
pub fn collect_upload(root: &Path) -> Result<Vec<UploadItem>> {
    if !root.is_dir() {
        bail!("Not a directory: {}", root.display());
    }

    let mut items = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!("[DRIVE] Skipping unreadable path: {}", e);
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }

        let relative = entry
            .path()
            .strip_prefix(root)
            .with_context(|| format!("Failed to relativize {}", entry.path().display()))?;
        let relative = relative.to_string_lossy().replace('\\', "/");

        items.push(UploadItem::from_path(entry.path()).with_relative_path(relative));
    }

    tracing::debug!("[DRIVE] Collected {} file(s) from {}", items.len(), root.display());
    Ok(items)
}
