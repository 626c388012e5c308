//! Failures from source scans and destination reclamation.

use std::path::PathBuf;

use harrow_core::CoreError;
use thiserror::Error;

/// Result type for filesystem operations.
pub type FsOpsResult<T> = Result<T, FsOpsError>;

/// Errors produced by scans and space reclamation.
#[derive(Debug, Error)]
pub enum FsOpsError {
    /// A scan root does not exist or is not a directory.
    #[error("scan root is not a directory")]
    NotADirectory {
        /// Root that was requested.
        root: PathBuf,
    },
    /// The scan root itself could not be walked.
    #[error("scan root could not be read")]
    Traverse {
        /// Root being scanned.
        root: PathBuf,
        /// Underlying walkdir error.
        source: walkdir::Error,
    },
    /// Free space or a destination listing was unavailable.
    #[error("destination lookup failed")]
    Lookup {
        /// `free_bytes` or `list_files`.
        lookup: &'static str,
        /// Underlying inspector error.
        source: CoreError,
    },
}

impl FsOpsError {
    pub(crate) fn not_a_directory(root: impl Into<PathBuf>) -> Self {
        Self::NotADirectory { root: root.into() }
    }

    pub(crate) fn traverse(root: impl Into<PathBuf>, source: walkdir::Error) -> Self {
        Self::Traverse {
            root: root.into(),
            source,
        }
    }

    pub(crate) const fn lookup(lookup: &'static str, source: CoreError) -> Self {
        Self::Lookup { lookup, source }
    }
}
