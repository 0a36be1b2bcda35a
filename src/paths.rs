// Path helpers for the folder hierarchy
// Paths are '/'-joined names relative to the root directory; None means the root itself

use std::path::{Path, PathBuf};

/// Folder marker (zero-byte file inside every folder directory)
pub const FOLDER_MARKER: &str = ".folder";

/// Project marker (its presence classifies a directory as a project)
pub const PROJECT_MARKER: &str = "project.json";

pub fn join(parent: Option<&str>, name: &str) -> String {
    match parent {
        Some(p) => format!("{}/{}", p, name),
        None => name.to_string(),
    }
}

pub fn parentOf(path: &str) -> Option<&str> {
    path.rfind('/').map(|i| &path[..i])
}

pub fn nameOf(path: &str) -> &str {
    match path.rfind('/') {
        Some(i) => &path[i + 1..],
        None => path,
    }
}

pub fn isAncestorOrSelf(candidateAncestor: &str, path: &str) -> bool {
    path == candidateAncestor
        || (path.len() > candidateAncestor.len()
            && path.starts_with(candidateAncestor)
            && path.as_bytes()[candidateAncestor.len()] == b'/')
}

/// Substitute `oldPrefix` with `newPrefix` when `path` is `oldPrefix` or lies under it
pub fn rebase(path: &str, oldPrefix: &str, newPrefix: &str) -> Option<String> {
    if path == oldPrefix {
        Some(newPrefix.to_string())
    } else if isAncestorOrSelf(oldPrefix, path) {
        Some(format!("{}{}", newPrefix, &path[oldPrefix.len()..]))
    } else {
        None
    }
}

/// Absolute location of a hierarchy path (None = root)
pub fn resolve(rootDir: &Path, path: Option<&str>) -> PathBuf {
    match path {
        Some(p) if !p.is_empty() => p.split('/').fold(rootDir.to_path_buf(), |acc, seg| acc.join(seg)),
        _ => rootDir.to_path_buf(),
    }
}

/// Names must be a single visible path segment that cannot shadow a marker
pub fn isValidName(name: &str) -> bool {
    !name.trim().is_empty()
        && !name.contains('/')
        && !name.contains('\\')
        && !name.starts_with('.')
        && name != PROJECT_MARKER
}

/// A non-empty hierarchy path whose every segment is a valid name (no `..`, no hidden entries)
pub fn isValidPath(path: &str) -> bool {
    !path.is_empty() && path.split('/').all(isValidName)
}
