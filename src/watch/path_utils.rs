// src/watch/path_utils.rs

//! Path helpers for turning event paths into what commands see.

use std::path::{Path, PathBuf};

/// Convert a path into a string relative to `root`, with forward slashes.
///
/// - First try a direct `strip_prefix(root)`.
/// - If that fails (symlinked roots, `/private/var` vs `/var` on macOS),
///   canonicalize both and try again. This only works while `path` still
///   exists.
///
/// Returns `None` if the path cannot be related to `root`.
pub fn relative_str(root: &Path, path: &Path) -> Option<String> {
    if let Ok(rel) = path.strip_prefix(root) {
        return Some(rel.to_string_lossy().replace('\\', "/"));
    }

    if let (Ok(root_canon), Ok(path_canon)) = (root.canonicalize(), path.canonicalize()) {
        if let Ok(rel) = path_canon.strip_prefix(&root_canon) {
            return Some(rel.to_string_lossy().replace('\\', "/"));
        }
    }

    None
}

/// Render `path` (under the canonical `root`) for `%f`: the relative part
/// joined onto the root as the user typed it.
///
/// A user root of `.` yields the bare relative path. Paths outside the root
/// are rendered as-is.
pub fn display_path(root: &Path, display_root: &Path, path: &Path) -> String {
    let Some(rel) = relative_str(root, path) else {
        return path.to_string_lossy().into_owned();
    };
    if rel.is_empty() {
        return display_root.to_string_lossy().into_owned();
    }
    if display_root == Path::new(".") || display_root.as_os_str().is_empty() {
        return rel;
    }
    let joined: PathBuf = display_root.join(&rel);
    joined.to_string_lossy().into_owned()
}
