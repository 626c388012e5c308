//! Recursive enumeration of matching files under a source directory.

use std::path::{Path, PathBuf};

use tracing::warn;
use walkdir::WalkDir;

use crate::error::{FsOpsError, FsOpsResult};

/// Whether the file name of `path` ends in `extension` (leading dot optional).
///
/// Matching is by suffix, so multi-dot extensions such as `.tar.gz` work and
/// a file named exactly `.plot` matches `.plot`.
#[must_use]
pub fn has_extension(path: &Path, extension: &str) -> bool {
    let suffix = extension.trim_start_matches('.');
    if suffix.is_empty() {
        return false;
    }
    path.file_name().is_some_and(|name| {
        name.as_encoded_bytes()
            .strip_suffix(suffix.as_bytes())
            .is_some_and(|stem| stem.ends_with(b"."))
    })
}

/// All regular files under `root` whose name ends in `extension`, sorted by path.
///
/// Unreadable subtrees are logged and skipped; only a failure on `root` itself
/// is returned.
///
/// # Errors
///
/// Returns an error when `root` is not a directory or cannot be read.
pub fn scan_matching(root: &Path, extension: &str) -> FsOpsResult<Vec<PathBuf>> {
    if !root.is_dir() {
        return Err(FsOpsError::not_a_directory(root));
    }

    let mut found = Vec::new();
    for entry in WalkDir::new(root).follow_links(false) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) if err.depth() == 0 => {
                return Err(FsOpsError::traverse(root, err));
            }
            Err(err) => {
                warn!(root = %root.display(), error = %err, "skipping unreadable entry");
                continue;
            }
        };
        if entry.file_type().is_file() && has_extension(entry.path(), extension) {
            found.push(entry.into_path());
        }
    }
    found.sort();
    Ok(found)
}
