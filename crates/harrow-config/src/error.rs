//! Configuration failures.
//!
//! Messages stay constant; the offending section, field or path travels in the
//! variant so callers can log it as structured context.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Convenience alias for configuration results.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Why a configuration could not be produced.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Neither `--config` nor the environment named a file.
    #[error("no configuration file was given")]
    NoPath {
        /// Variable consulted after the command line.
        env_var: &'static str,
    },
    /// The file could not be read.
    #[error("configuration file is unreadable")]
    Unreadable {
        /// Location that was attempted.
        path: PathBuf,
        /// Underlying read failure.
        source: io::Error,
    },
    /// The document is not YAML of the expected shape.
    #[error("configuration document does not match the schema")]
    Syntax {
        /// Location of the document; `None` for in-memory input.
        path: Option<PathBuf>,
        /// Underlying YAML error.
        source: serde_yaml::Error,
    },
    /// A value parsed but is unusable.
    #[error("configuration value rejected")]
    Rejected {
        /// Top-level section, e.g. `reclamation`.
        section: &'static str,
        /// Field within the section.
        field: &'static str,
        /// Offending value when it can be shown.
        value: Option<String>,
        /// Short reason, e.g. `must be positive`.
        reason: &'static str,
    },
}

impl ConfigError {
    pub(crate) const fn rejected(
        section: &'static str,
        field: &'static str,
        value: Option<String>,
        reason: &'static str,
    ) -> Self {
        Self::Rejected {
            section,
            field,
            value,
            reason,
        }
    }

    /// Section and field for [`ConfigError::Rejected`].
    #[must_use]
    pub const fn location(&self) -> Option<(&'static str, &'static str)> {
        match self {
            Self::Rejected { section, field, .. } => Some((section, field)),
            _ => None,
        }
    }
}
