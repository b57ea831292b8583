//! Filesystem path helpers shared by the loader and the resolver.
//!
//! Physical paths handed to repotree may not exist yet (a lazy node's
//! directory before its first clone), so comparisons fall back to lexical
//! normalization whenever canonicalization is impossible.

use std::path::{Component, Path, PathBuf};

/// Lexically normalizes a path: drops `.` components and folds `..` into the
/// preceding component. Never touches the filesystem.
pub fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let popped = match out.components().next_back() {
                    Some(Component::Normal(_)) => out.pop(),
                    _ => false,
                };
                if !popped && !out.has_root() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Joins `path` onto `base` when it is relative, then normalizes lexically.
pub fn absolutize(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        normalize_lexically(path)
    } else {
        normalize_lexically(&base.join(path))
    }
}

/// Canonicalizes the longest existing prefix of `path` and re-appends the
/// remainder, so symlinked parents (`/tmp` on macOS) compare equal whether
/// or not the leaf exists yet.
pub fn canonicalize_lenient(path: &Path) -> PathBuf {
    let normalized = normalize_lexically(path);
    let mut existing = normalized.as_path();
    let mut remainder = Vec::new();

    loop {
        if let Ok(canonical) = existing.canonicalize() {
            let mut result = canonical;
            for part in remainder.iter().rev() {
                result.push(part);
            }
            return result;
        }
        match (existing.parent(), existing.file_name()) {
            (Some(parent), Some(name)) => {
                remainder.push(name.to_os_string());
                existing = parent;
            }
            _ => return normalized,
        }
    }
}

/// Expands a leading `~/` to the user's home directory.
pub fn expand_home(path: &str) -> PathBuf {
    if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    } else if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}
