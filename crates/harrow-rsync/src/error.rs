//! Error types for the transfer adapter.

use std::ffi::OsString;
use std::io;

use thiserror::Error;

/// Errors raised while launching transfer commands.
#[derive(Debug, Error)]
pub enum RsyncError {
    /// The executable could not be started or awaited.
    #[error("failed to run transfer command")]
    Spawn {
        /// Executable that failed to start.
        program: OsString,
        /// Underlying IO error.
        source: io::Error,
    },
    /// An option value cannot be turned into a command argument.
    #[error("invalid transfer option")]
    InvalidOption {
        /// Option that failed validation.
        field: &'static str,
        /// Static reason for the failure.
        reason: &'static str,
    },
}

/// Convenience alias for adapter results.
pub type RsyncResult<T> = Result<T, RsyncError>;
