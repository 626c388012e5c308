//! Domain models for space reclamation.
//!
//! # Design
//! - Keep request/outcome types lightweight and copyable.
//! - The clock is part of the request so age checks are reproducible in tests.

use std::path::Path;
use std::time::{Duration, SystemTime};

/// Inputs for one reclamation pass against a local destination.
#[derive(Debug, Clone, Copy)]
pub struct ReclaimRequest<'a> {
    /// Destination directory whose top-level files may be deleted.
    pub destination: &'a Path,
    /// Size of the unit that needs to fit.
    pub unit_bytes: u64,
    /// Required free space as a multiple of `unit_bytes`.
    pub headroom_multiplier: u64,
    /// Files modified more recently than this are never deleted.
    pub age_threshold: Duration,
    /// Reference time for the age check.
    pub now: SystemTime,
}

impl<'a> ReclaimRequest<'a> {
    /// Request evaluated against the current wall clock.
    #[must_use]
    pub fn new(
        destination: &'a Path,
        unit_bytes: u64,
        headroom_multiplier: u64,
        age_threshold: Duration,
    ) -> Self {
        Self {
            destination,
            unit_bytes,
            headroom_multiplier,
            age_threshold,
            now: SystemTime::now(),
        }
    }

    /// Free space the destination must reach.
    #[must_use]
    pub const fn target_bytes(&self) -> u64 {
        self.unit_bytes.saturating_mul(self.headroom_multiplier)
    }

    /// Files last modified before this instant are old enough to delete.
    #[must_use]
    pub fn cutoff(&self) -> SystemTime {
        self.now
            .checked_sub(self.age_threshold)
            .unwrap_or(SystemTime::UNIX_EPOCH)
    }
}

/// Result of a reclamation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReclaimOutcome {
    /// Free space the pass aimed for.
    pub target_bytes: u64,
    /// Free space reported before any deletion.
    pub initial_free_bytes: u64,
    /// Bytes released by deleted files.
    pub freed_bytes: u64,
    /// Number of files deleted.
    pub files_deleted: usize,
}

impl ReclaimOutcome {
    /// Free space assumed after the pass.
    #[must_use]
    pub const fn projected_free_bytes(&self) -> u64 {
        self.initial_free_bytes.saturating_add(self.freed_bytes)
    }

    /// Whether the destination now has room for the unit plus headroom.
    #[must_use]
    pub const fn target_met(&self) -> bool {
        self.projected_free_bytes() >= self.target_bytes
    }
}
