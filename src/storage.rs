//! Filesystem helpers for the repository storage root.

use std::path::Path;

use walkdir::WalkDir;

/// Total size in bytes of the regular files below `path`.
///
/// Unreadable entries are skipped; a missing path has size 0.
pub fn directory_size(path: &Path) -> u64 {
    WalkDir::new(path)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter_map(|entry| entry.metadata().ok())
        .map(|metadata| metadata.len())
        .sum()
}

/// Recursively deletes `path`, logging instead of failing.
pub fn remove_dir_best_effort(path: &Path) {
    if !path.exists() {
        return;
    }
    match std::fs::remove_dir_all(path) {
        Ok(()) => tracing::info!(path = %path.display(), "Removed directory"),
        Err(e) => tracing::warn!(path = %path.display(), error = %e, "Failed to clean directory"),
    }
}

pub fn human_readable_bytes(bytes: u64) -> String {
    const UNITS: [&str; 6] = ["KiB", "MiB", "GiB", "TiB", "PiB", "EiB"];

    if bytes < 1024 {
        return format!("{} B", bytes);
    }

    let mut value = bytes as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{:.1} {}", value, UNITS[unit])
}
