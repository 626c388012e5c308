//! Error types for core domain operations.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Primary error type for domain parsing and disk lookups.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A destination string could not be interpreted.
    #[error("invalid destination")]
    InvalidDestination {
        /// Raw destination value supplied by configuration.
        value: String,
        /// Machine-readable reason for the failure.
        reason: &'static str,
    },
    /// A filesystem lookup against a source or destination failed.
    #[error("disk lookup failed")]
    Io {
        /// Operation identifier.
        operation: &'static str,
        /// Path involved in the lookup.
        path: PathBuf,
        /// Underlying IO error.
        source: io::Error,
    },
    /// The platform cannot answer the requested lookup.
    #[error("disk lookup not supported")]
    Unsupported {
        /// Operation identifier.
        operation: &'static str,
    },
}

impl CoreError {
    /// Wrap an IO failure with the operation and path that produced it.
    pub fn io(operation: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            operation,
            path: path.into(),
            source,
        }
    }

    /// Whether the failure means the inspected path no longer exists.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Io { source, .. } if source.kind() == io::ErrorKind::NotFound)
    }
}

/// Convenience alias for core results.
pub type CoreResult<T> = Result<T, CoreError>;
