//! Input discovery.

use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

/// Every `*.csv` file under `root`, sorted by path. Symlinks are not followed
/// and unreadable entries are logged and skipped.
pub fn csv_files(root: &Path) -> Vec<PathBuf> {
    let walker = WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter();

    let mut files = Vec::new();
    for entry in walker {
        match entry {
            Ok(entry) if is_csv(&entry) => files.push(entry.into_path()),
            Ok(_) => {}
            Err(e) => warn!(error = %e, "Error accessing entry"),
        }
    }

    debug!(root = %root.display(), files = files.len(), "Input walk complete");
    files
}

fn is_csv(entry: &DirEntry) -> bool {
    entry.file_type().is_file()
        && entry
            .path()
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
}
