//! Tracing subscriber installation.
//!
//! One registry per process: an `EnvFilter` (honouring `RUST_LOG`) over a
//! single formatting layer selected by [`LogFormat`].

use once_cell::sync::OnceCell;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt};

use crate::error::{Result, TelemetryError};

/// Level used when neither `RUST_LOG` nor the configuration names one.
pub const DEFAULT_LOG_LEVEL: &str = "info";

static BUILD_SHA: OnceCell<String> = OnceCell::new();

type FormatLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Inputs for [`init_logging`].
#[derive(Debug, Clone)]
pub struct LoggingConfig<'a> {
    /// Filter directive, e.g. `info` or `harrow_app=debug`.
    pub level: &'a str,
    /// Line format.
    pub format: LogFormat,
    /// Identifier attached to the service span.
    pub build_sha: &'a str,
}

impl Default for LoggingConfig<'_> {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL,
            format: LogFormat::infer(),
            build_sha: option_env!("HARROW_BUILD_SHA").unwrap_or("dev"),
        }
    }
}

/// Output format for log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// One JSON object per line with event fields flattened.
    Json,
    /// Compact human-readable lines.
    Pretty,
}

impl LogFormat {
    /// Pretty in debug builds, JSON otherwise.
    #[must_use]
    pub const fn infer() -> Self {
        if cfg!(debug_assertions) {
            Self::Pretty
        } else {
            Self::Json
        }
    }

    /// Parse `json`, `pretty` or `text`, ignoring case and surrounding blanks.
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim();
        if label.eq_ignore_ascii_case("json") {
            Some(Self::Json)
        } else if label.eq_ignore_ascii_case("pretty") || label.eq_ignore_ascii_case("text") {
            Some(Self::Pretty)
        } else {
            None
        }
    }

    fn layer(self) -> FormatLayer {
        let base = fmt::layer().with_target(false);
        match self {
            Self::Json => base.json().flatten_event(true).boxed(),
            Self::Pretty => base.compact().boxed(),
        }
    }
}

/// Install the process-wide subscriber.
///
/// # Errors
///
/// Fails when a global subscriber is already installed.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let _ = BUILD_SHA.set(config.build_sha.to_owned());
    tracing_subscriber::registry()
        .with(config.format.layer().with_filter(env_filter(config.level)))
        .try_init()
        .map_err(|source| TelemetryError::LoggerInstall { source })
}

/// Build identifier recorded by [`init_logging`], or `dev` before it runs.
#[must_use]
pub fn build_sha() -> &'static str {
    BUILD_SHA.get().map_or("dev", String::as_str)
}

fn env_filter(fallback: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(fallback))
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_LEVEL))
}
