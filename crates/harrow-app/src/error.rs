//! Errors surfaced by the `harrow` binary before or around the scheduler.
//!
//! Once the scheduler is running, per-unit failures are handled by the
//! workers and never reach this type.

use std::io;
use std::path::PathBuf;

use harrow_config::ConfigError;
use harrow_core::CoreError;
use harrow_fsops::FsOpsError;
use harrow_rsync::RsyncError;
use harrow_telemetry::TelemetryError;
use thiserror::Error;

/// Result alias for application operations.
pub type AppResult<T> = Result<T, AppError>;

/// Application-level error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// The configuration could not be located, read or validated.
    #[error("configuration unavailable")]
    Config {
        /// `resolve` or `load`.
        stage: &'static str,
        /// Source configuration error.
        source: ConfigError,
    },
    /// Logging or the metrics registry could not be set up.
    #[error("telemetry setup failed")]
    Telemetry {
        /// `logging` or `metrics`.
        stage: &'static str,
        /// Source telemetry error.
        source: TelemetryError,
    },
    /// A configured destination did not parse.
    #[error("destination rejected")]
    Destination {
        /// Source domain error.
        #[from]
        source: CoreError,
    },
    /// Transfer options could not become an rsync invocation.
    #[error("transfer options rejected")]
    TransferOptions {
        /// Source adapter error.
        #[from]
        source: RsyncError,
    },
    /// A source directory could not be listed for `harrow scan`.
    #[error("source scan failed")]
    Scan {
        /// Source that was being listed.
        root: PathBuf,
        /// Source fsops error.
        source: FsOpsError,
    },
    /// The effective configuration could not be printed.
    #[error("configuration could not be rendered")]
    Render {
        /// Source serialisation error.
        #[from]
        source: serde_json::Error,
    },
    /// Waiting for the shutdown signal failed.
    #[error("shutdown signal listener failed")]
    Signal {
        /// Source IO error.
        source: io::Error,
    },
}

impl AppError {
    pub(crate) const fn config(stage: &'static str, source: ConfigError) -> Self {
        Self::Config { stage, source }
    }

    pub(crate) const fn telemetry(stage: &'static str, source: TelemetryError) -> Self {
        Self::Telemetry { stage, source }
    }
}
