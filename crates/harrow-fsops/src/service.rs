//! Space reclamation for local destinations.
//!
//! # Design
//! - Only top-level files of the destination are candidates.
//! - Candidates are visited oldest first; deletion stops as soon as the
//!   projected free space reaches the target.
//! - A file modified after the age cutoff is never deleted.
//! - Every deletion and the final summary are logged and published.

use std::sync::Arc;

use harrow_core::{DiskInspector, FileEntry};
use harrow_events::{Event, EventBus};
use harrow_telemetry::Metrics;
use tracing::{info, warn};

use crate::error::{FsOpsError, FsOpsResult};
use crate::model::{ReclaimOutcome, ReclaimRequest};

/// Deletes aged destination files until a unit fits.
#[derive(Clone)]
pub struct ReclaimService {
    disk: Arc<dyn DiskInspector>,
    events: EventBus,
    metrics: Metrics,
}

impl ReclaimService {
    /// Construct a reclamation service over the given disk inspector.
    #[must_use]
    pub fn new(disk: Arc<dyn DiskInspector>, events: EventBus, metrics: Metrics) -> Self {
        Self {
            disk,
            events,
            metrics,
        }
    }

    /// Run one reclamation pass.
    ///
    /// A failed deletion ends the pass early; the outcome then reflects only the
    /// files removed so far.
    ///
    /// # Errors
    ///
    /// Returns an error when free space or the destination listing cannot be read.
    pub fn reclaim(&self, request: ReclaimRequest<'_>) -> FsOpsResult<ReclaimOutcome> {
        let destination = request.destination;
        let initial_free_bytes = self
            .disk
            .free_bytes(destination)
            .map_err(|source| FsOpsError::lookup("free_bytes", source))?;
        let mut outcome = ReclaimOutcome {
            target_bytes: request.target_bytes(),
            initial_free_bytes,
            freed_bytes: 0,
            files_deleted: 0,
        };
        if outcome.target_met() {
            return Ok(outcome);
        }

        let mut candidates = self
            .disk
            .list_files(destination)
            .map_err(|source| FsOpsError::lookup("list_files", source))?;
        if candidates.is_empty() {
            info!(destination = %destination.display(), "no files found to reclaim");
            self.publish_summary(&request, &outcome);
            return Ok(outcome);
        }
        candidates.sort_by_key(|entry| entry.modified);

        let cutoff = request.cutoff();
        for FileEntry {
            path,
            size,
            modified,
        } in candidates
        {
            if outcome.target_met() {
                break;
            }
            // Sorted oldest first: everything after this one is younger still.
            if modified >= cutoff {
                break;
            }
            if let Err(err) = self.disk.remove_file(&path) {
                warn!(
                    destination = %destination.display(),
                    path = %path.display(),
                    error = %err,
                    "failed to delete file during reclamation"
                );
                break;
            }
            outcome.freed_bytes = outcome.freed_bytes.saturating_add(size);
            outcome.files_deleted += 1;
            self.metrics.add_reclaimed(size);
            info!(
                destination = %destination.display(),
                path = %path.display(),
                bytes = size,
                "deleted aged file"
            );
            self.events.publish(Event::FileReclaimed {
                path: path.display().to_string(),
                destination: destination.display().to_string(),
                bytes: size,
            });
        }

        self.publish_summary(&request, &outcome);
        Ok(outcome)
    }

    fn publish_summary(&self, request: &ReclaimRequest<'_>, outcome: &ReclaimOutcome) {
        let free_bytes = outcome.projected_free_bytes();
        let target_met = outcome.target_met();
        info!(
            destination = %request.destination.display(),
            freed_bytes = outcome.freed_bytes,
            files_deleted = outcome.files_deleted,
            free_bytes,
            target_bytes = outcome.target_bytes,
            target_met,
            "reclamation finished"
        );
        self.events.publish(Event::ReclamationSummary {
            destination: request.destination.display().to_string(),
            freed_bytes: outcome.freed_bytes,
            free_bytes,
            target_met,
        });
    }
}
