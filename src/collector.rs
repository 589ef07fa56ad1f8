//! Discovery of input files under a data root.

use std::path::{Path, PathBuf};
use tracing::warn;
use walkdir::WalkDir;

fn absolute(root: &Path) -> PathBuf {
    if root.is_absolute() {
        return root.to_path_buf();
    }
    match std::env::current_dir() {
        Ok(cwd) => cwd.join(root),
        Err(_) => root.to_path_buf(),
    }
}

fn matches_extension(path: &Path, extension: &str) -> bool {
    let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    // Same as a `*.<ext>` glob: dotfiles never match.
    !file_name.starts_with('.')
        && path.extension().and_then(|e| e.to_str()) == Some(extension)
}

/// Returns the absolute paths of all regular files under `root` whose name ends
/// in `.<extension>`, in discovery order (parents first, siblings by name).
///
/// A missing root, or one that is not a directory, yields an empty list.
pub fn collect_files(root: &Path, extension: &str) -> Vec<PathBuf> {
    let root = absolute(root);
    if !root.exists() {
        warn!("Data directory {} does not exist", root.display());
        return Vec::new();
    }
    if !root.is_dir() {
        warn!("Data root {} is not a directory", root.display());
        return Vec::new();
    }

    WalkDir::new(&root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| matches_extension(path, extension))
        .collect()
}

pub fn collect_json_files(root: &Path) -> Vec<PathBuf> {
    collect_files(root, "json")
}
