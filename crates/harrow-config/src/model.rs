//! Typed configuration sections.
//!
//! # Design
//! - Every section carries `#[serde(default)]` so a document may list only
//!   `sources` and `destinations`.
//! - Values are plain data; parsing destinations into endpoints happens in the
//!   application layer.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::defaults;

/// Root configuration document.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct HarrowConfig {
    /// Directories scanned for finished output files.
    pub sources: Vec<PathBuf>,
    /// Local paths or remote endpoints receiving files.
    pub destinations: Vec<String>,
    /// Randomise the destination order once at startup.
    pub shuffle_destinations: bool,
    /// Transfer command composition.
    pub transfer: TransferConfig,
    /// Concurrency limits applied around each transfer.
    pub gates: GateConfig,
    /// Destination space reclamation.
    pub reclamation: ReclamationConfig,
    /// Source discovery.
    pub discovery: DiscoveryConfig,
    /// Pauses after failed transfers.
    pub backoff: BackoffConfig,
    /// Log output.
    pub logging: LoggingSettings,
}

/// How the external transfer command is assembled.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct TransferConfig {
    /// Transfer binary.
    pub binary: String,
    /// Value passed as `--bwlimit=`; progress output is requested when unset.
    pub bandwidth_limit: Option<String>,
    /// Whitespace-separated I/O priority wrapper arguments; `null` disables the wrapper.
    pub io_priority: Option<String>,
    /// I/O priority wrapper binary.
    pub ionice_binary: String,
    /// Reference file used for the reachability probe.
    pub probe_file: PathBuf,
    /// Additional flags appended after the fixed ones.
    pub extra_flags: Vec<String>,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            binary: defaults::TRANSFER_BINARY.to_string(),
            bandwidth_limit: None,
            io_priority: Some(defaults::IO_PRIORITY.to_string()),
            ionice_binary: defaults::IONICE_BINARY.to_string(),
            probe_file: PathBuf::from(defaults::PROBE_FILE),
            extra_flags: Vec::new(),
        }
    }
}

impl TransferConfig {
    /// Split the I/O priority setting into wrapper arguments.
    #[must_use]
    pub fn io_priority_args(&self) -> Vec<String> {
        self.io_priority
            .as_deref()
            .map(|args| args.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default()
    }
}

/// Mutual-exclusion policies around transfer invocations.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct GateConfig {
    /// At most one transfer system-wide.
    pub global_single_transfer: bool,
    /// At most one transfer per source directory.
    pub per_source_single_transfer: bool,
}

/// Space reclamation on local destinations.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct ReclamationConfig {
    /// When disabled a destination short on space is treated as full immediately.
    pub enabled: bool,
    /// Minimum age in days before a destination file may be deleted.
    pub age_threshold_days: u64,
    /// Required free space as a multiple of the unit size.
    pub headroom_multiplier: u64,
}

impl Default for ReclamationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            age_threshold_days: defaults::AGE_THRESHOLD_DAYS,
            headroom_multiplier: defaults::HEADROOM_MULTIPLIER,
        }
    }
}

impl ReclamationConfig {
    /// Age threshold as a duration.
    #[must_use]
    pub const fn age_threshold(&self) -> Duration {
        Duration::from_secs(self.age_threshold_days.saturating_mul(86_400))
    }
}

/// Source discovery.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct DiscoveryConfig {
    /// File extension including the leading dot.
    pub extension: String,
    /// Seconds between rescans.
    pub poll_interval_secs: u64,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            extension: defaults::EXTENSION.to_string(),
            poll_interval_secs: defaults::POLL_INTERVAL_SECS,
        }
    }
}

impl DiscoveryConfig {
    /// Rescan interval as a duration.
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

/// Pauses after failed transfers.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct BackoffConfig {
    /// Pause before retiring after an unclassified failure.
    pub short_secs: u64,
    /// Pause before resuming after a network failure.
    pub long_secs: u64,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            short_secs: defaults::SHORT_BACKOFF_SECS,
            long_secs: defaults::LONG_BACKOFF_SECS,
        }
    }
}

impl BackoffConfig {
    /// Short pause as a duration.
    #[must_use]
    pub const fn short(&self) -> Duration {
        Duration::from_secs(self.short_secs)
    }

    /// Long pause as a duration.
    #[must_use]
    pub const fn long(&self) -> Duration {
        Duration::from_secs(self.long_secs)
    }
}

/// Log output settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingSettings {
    /// Filter directive used when `RUST_LOG` is unset.
    pub level: String,
    /// `pretty` or `json`; inferred from the build profile when absent.
    pub format: Option<String>,
    /// Seconds between periodic status lines; `0` disables them.
    pub status_interval_secs: u64,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: defaults::LOG_LEVEL.to_string(),
            format: None,
            status_interval_secs: defaults::STATUS_INTERVAL_SECS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_document_fills_defaults() -> Result<(), serde_yaml::Error> {
        let config: HarrowConfig = serde_yaml::from_str(
            "sources: [/mnt/farm]\ndestinations: [/mnt/a, 'nas::plots/']\n",
        )?;
        assert_eq!(config.sources, vec![PathBuf::from("/mnt/farm")]);
        assert_eq!(config.destinations.len(), 2);
        assert!(!config.shuffle_destinations);
        assert_eq!(config.transfer.binary, "rsync");
        assert_eq!(config.transfer.io_priority_args(), vec!["-c", "2", "-n", "0"]);
        assert_eq!(config.transfer.probe_file, PathBuf::from("/etc/hostname"));
        assert!(config.reclamation.enabled);
        assert_eq!(config.reclamation.headroom_multiplier, 3);
        assert_eq!(
            config.reclamation.age_threshold(),
            Duration::from_secs(90 * 86_400)
        );
        assert_eq!(config.discovery.extension, ".plot");
        assert_eq!(config.discovery.poll_interval(), Duration::from_secs(60));
        assert_eq!(config.backoff.short(), Duration::from_secs(180));
        assert_eq!(config.backoff.long(), Duration::from_secs(1_200));
        assert_eq!(config.logging.level, "info");
        Ok(())
    }

    #[test]
    fn null_io_priority_disables_wrapper() -> Result<(), serde_yaml::Error> {
        let config: HarrowConfig =
            serde_yaml::from_str("destinations: [/mnt/a]\ntransfer:\n  io_priority: null\n")?;
        assert!(config.transfer.io_priority_args().is_empty());
        Ok(())
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let parsed: Result<HarrowConfig, _> =
            serde_yaml::from_str("destinations: [/mnt/a]\ngates:\n  global: true\n");
        assert!(parsed.is_err());
    }
}
