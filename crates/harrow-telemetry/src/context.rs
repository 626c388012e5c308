//! The service span wrapping every event emitted while `harrow run` is active.

use tracing::span::EnteredSpan;
use tracing::{Span, field, info_span};

use crate::init::build_sha;

/// Holds the `harrow` span entered until dropped.
pub struct ServiceSpan {
    _entered: EnteredSpan,
}

impl ServiceSpan {
    /// Enter a span tagged with `mode`, the build identifier and the process id.
    #[must_use]
    pub fn enter(mode: &str) -> Self {
        let span = info_span!(
            "harrow",
            mode = %mode,
            build = %build_sha(),
            pid = std::process::id()
        );
        Self {
            _entered: span.entered(),
        }
    }
}

/// Overwrite the `mode` field on the current span.
pub fn record_app_mode(mode: &str) {
    Span::current().record("mode", field::display(mode));
}
