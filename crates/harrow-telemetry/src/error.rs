//! Failures raised while installing logging or maintaining the metrics registry.

use prometheus::Error as PrometheusError;
use thiserror::Error;
use tracing_subscriber::util::TryInitError;

/// Result alias for telemetry operations.
pub type Result<T> = std::result::Result<T, TelemetryError>;

/// Errors raised by telemetry helpers.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// A global subscriber was already present.
    #[error("log subscriber could not be installed")]
    LoggerInstall {
        /// Underlying tracing subscriber error.
        #[source]
        source: TryInitError,
    },
    /// A collector could not be created or added to the registry.
    #[error("metric setup failed")]
    Metric {
        /// Metric name.
        name: &'static str,
        /// `create` or `register`.
        stage: &'static str,
        /// Underlying Prometheus error.
        #[source]
        source: PrometheusError,
    },
    /// Gathered metrics could not be written out as text.
    #[error("metrics could not be rendered")]
    Render {
        /// Underlying encoder failure.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl TelemetryError {
    pub(crate) const fn create(name: &'static str, source: PrometheusError) -> Self {
        Self::Metric {
            name,
            stage: "create",
            source,
        }
    }

    pub(crate) const fn register(name: &'static str, source: PrometheusError) -> Self {
        Self::Metric {
            name,
            stage: "register",
            source,
        }
    }

    pub(crate) fn render(source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Render {
            source: source.into(),
        }
    }
}
