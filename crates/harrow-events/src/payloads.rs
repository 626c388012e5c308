//! Event payload types published by discovery, reclamation and the workers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier assigned to each published event.
pub type EventId = u64;

/// Default buffer size for the in-memory replay ring.
pub const DEFAULT_REPLAY_CAPACITY: usize = 1_024;

/// Typed domain events surfaced across the system.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// A newly discovered file entered the work queue.
    UnitQueued {
        /// Absolute path of the file.
        path: String,
        /// Source volume the file belongs to.
        source: String,
    },
    /// A configured source directory was missing at startup and is skipped.
    WatchPathMissing {
        /// Configured source directory.
        path: String,
    },
    /// A destination worker entered service.
    WorkerStarted {
        /// Destination served by the worker.
        destination: String,
    },
    /// A unit passed its space check and the transfer is about to run.
    TransferStarted {
        /// File being transferred.
        path: String,
        /// Target destination.
        destination: String,
    },
    /// The transfer command exited successfully.
    TransferSucceeded {
        /// File that was transferred.
        path: String,
        /// Target destination.
        destination: String,
        /// Wall-clock duration of the transfer command.
        elapsed_ms: u64,
    },
    /// The probe or the transfer command exited with a non-zero code.
    TransferFailed {
        /// File whose transfer failed.
        path: String,
        /// Target destination.
        destination: String,
        /// Exit code, absent when the process was killed by a signal.
        exit_code: Option<i32>,
        /// Fault classification (`network`, `file_io`, `other`, `probe`).
        class: String,
    },
    /// Reclamation deleted an aged file from a destination.
    FileReclaimed {
        /// Deleted file.
        path: String,
        /// Destination directory the file lived in.
        destination: String,
        /// Bytes released by the deletion.
        bytes: u64,
    },
    /// Reclamation finished for a destination.
    ReclamationSummary {
        /// Destination directory that was reclaimed.
        destination: String,
        /// Bytes freed during this pass.
        freed_bytes: u64,
        /// Projected free space after the pass.
        free_bytes: u64,
        /// Whether the headroom target was met.
        target_met: bool,
    },
    /// A destination lacks space for a unit even after reclamation.
    DestinationFull {
        /// Destination that is full.
        destination: String,
        /// Unit that did not fit.
        path: String,
    },
    /// A worker left rotation for the remainder of the run.
    DestinationRetired {
        /// Destination whose worker retired.
        destination: String,
        /// Reason label for the retirement.
        reason: String,
    },
    /// A unit left the system without being transferred.
    UnitDropped {
        /// Dropped file.
        path: String,
        /// Reason label for the drop.
        reason: String,
    },
}

impl Event {
    /// Machine-friendly discriminator for log and metric labels.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::UnitQueued { .. } => "unit_queued",
            Self::WatchPathMissing { .. } => "watch_path_missing",
            Self::WorkerStarted { .. } => "worker_started",
            Self::TransferStarted { .. } => "transfer_started",
            Self::TransferSucceeded { .. } => "transfer_succeeded",
            Self::TransferFailed { .. } => "transfer_failed",
            Self::FileReclaimed { .. } => "file_reclaimed",
            Self::ReclamationSummary { .. } => "reclamation_summary",
            Self::DestinationFull { .. } => "destination_full",
            Self::DestinationRetired { .. } => "destination_retired",
            Self::UnitDropped { .. } => "unit_dropped",
        }
    }
}

/// Metadata wrapper around events: sequential id and emission timestamp.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EventEnvelope {
    /// Sequential identifier assigned by the bus.
    pub id: EventId,
    /// Time the event was published.
    pub timestamp: DateTime<Utc>,
    /// Event payload.
    pub event: Event,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_serialise_with_snake_case_tag() -> Result<(), serde_json::Error> {
        let event = Event::TransferFailed {
            path: "/src/a.plot".into(),
            destination: "/mnt/hdd1".into(),
            exit_code: Some(23),
            class: "file_io".into(),
        };
        let json = serde_json::to_value(&event)?;
        assert_eq!(json["type"], "transfer_failed");
        assert_eq!(json["exit_code"], 23);
        assert_eq!(event.kind(), "transfer_failed");

        let back: Event = serde_json::from_value(json)?;
        assert_eq!(back, event);
        Ok(())
    }
}
