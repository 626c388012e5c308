//! Fallback values applied when a configuration document omits a field.
//!
//! # Design
//! - Keep every tunable in one place so the model defaults and docs agree.

/// Transfer binary looked up on `PATH`.
pub(crate) const TRANSFER_BINARY: &str = "rsync";
/// Arguments handed to the I/O priority wrapper (best-effort class, highest level).
pub(crate) const IO_PRIORITY: &str = "-c 2 -n 0";
/// I/O priority wrapper binary.
pub(crate) const IONICE_BINARY: &str = "ionice";
/// Small reference file copied to a destination to prove it is reachable.
pub(crate) const PROBE_FILE: &str = "/etc/hostname";
/// Files younger than this many days are never reclaimed.
pub(crate) const AGE_THRESHOLD_DAYS: u64 = 90;
/// Required free space expressed as a multiple of the unit size.
pub(crate) const HEADROOM_MULTIPLIER: u64 = 3;
/// Extension that marks a finished output file.
pub(crate) const EXTENSION: &str = ".plot";
/// Seconds between polling rescans of a source directory.
pub(crate) const POLL_INTERVAL_SECS: u64 = 60;
/// Pause after an unclassified transfer failure.
pub(crate) const SHORT_BACKOFF_SECS: u64 = 180;
/// Pause after a transient network failure.
pub(crate) const LONG_BACKOFF_SECS: u64 = 1_200;
/// Log level used when neither the document nor `RUST_LOG` sets one.
pub(crate) const LOG_LEVEL: &str = "info";
/// Seconds between periodic status lines.
pub(crate) const STATUS_INTERVAL_SECS: u64 = 300;
