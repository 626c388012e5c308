//! Discovery and de-duplication of source files.
//!
//! # Design
//! - One task owns the engine and with it the [`ProcessedSet`]; no other task
//!   mutates it.
//! - An initial recursive scan covers files that already exist; afterwards the
//!   injected [`PathObserver`] streams for every live source are merged.
//! - Inserting into the processed set and pushing onto the queue happen in one
//!   synchronous step, so a path is queued at most once.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use harrow_core::{PathObserver, TransferUnit};
use harrow_events::{Event, EventBus};
use harrow_fsops::{has_extension, scan_matching};
use harrow_telemetry::Metrics;
use tokio_stream::{StreamExt, StreamMap};
use tracing::{info, warn};

use crate::queue::WorkQueue;

/// Paths enqueued at least once during this process. Append-only.
#[derive(Debug, Default, Clone)]
pub struct ProcessedSet {
    paths: HashSet<PathBuf>,
}

impl ProcessedSet {
    /// Empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `path`; `false` when it was already present.
    pub fn insert(&mut self, path: PathBuf) -> bool {
        self.paths.insert(path)
    }

    /// Whether `path` has been enqueued before.
    #[must_use]
    pub fn contains(&self, path: &Path) -> bool {
        self.paths.contains(path)
    }

    /// Number of recorded paths.
    #[must_use]
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// Whether nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

/// Feeds newly seen matching files into the work queue exactly once.
pub struct DiscoveryEngine {
    queue: Arc<WorkQueue<TransferUnit>>,
    processed: ProcessedSet,
    observer: Arc<dyn PathObserver>,
    extension: String,
    events: EventBus,
    metrics: Metrics,
}

impl DiscoveryEngine {
    /// Assemble an engine around explicitly owned state.
    #[must_use]
    pub fn new(
        queue: Arc<WorkQueue<TransferUnit>>,
        processed: ProcessedSet,
        observer: Arc<dyn PathObserver>,
        extension: impl Into<String>,
        events: EventBus,
        metrics: Metrics,
    ) -> Self {
        Self {
            queue,
            processed,
            observer,
            extension: extension.into(),
            events,
            metrics,
        }
    }

    /// Paths enqueued so far.
    #[must_use]
    pub const fn processed(&self) -> &ProcessedSet {
        &self.processed
    }

    /// Enqueue `path` unless it does not match or was seen before.
    pub fn offer(&mut self, path: PathBuf) -> bool {
        if !has_extension(&path, &self.extension) {
            return false;
        }
        if !self.processed.insert(path.clone()) {
            return false;
        }
        let unit = TransferUnit::new(path);
        info!(
            path = %unit.path().display(),
            source = %unit.source().display(),
            "added to queue"
        );
        self.events.publish(Event::UnitQueued {
            path: unit.path().display().to_string(),
            source: unit.source().display().to_string(),
        });
        self.queue.push(unit);
        self.metrics.inc_enqueued();
        self.metrics.set_queue_depth(self.queue.len());
        true
    }

    /// Enqueue every matching file under each existing root; returns the roots
    /// that exist and should be observed.
    pub fn initial_scan(&mut self, roots: &[PathBuf]) -> Vec<PathBuf> {
        let mut live = Vec::with_capacity(roots.len());
        for root in roots {
            if !root.is_dir() {
                warn!(path = %root.display(), "source path does not exist; skipping");
                self.events.publish(Event::WatchPathMissing {
                    path: root.display().to_string(),
                });
                continue;
            }
            match scan_matching(root, &self.extension) {
                Ok(paths) => {
                    let mut added = 0_usize;
                    for path in paths {
                        if self.offer(path) {
                            added += 1;
                        }
                    }
                    info!(path = %root.display(), added, "initial scan finished");
                }
                Err(err) => {
                    warn!(path = %root.display(), error = %err, "initial scan failed");
                }
            }
            live.push(root.clone());
        }
        live
    }

    /// Scan, then follow every live root until all observer streams end.
    ///
    /// Production observers never end, so this only returns in tests; the
    /// processed set is handed back for inspection.
    pub async fn run(mut self, roots: Vec<PathBuf>) -> ProcessedSet {
        let live = self.initial_scan(&roots);
        let mut streams = StreamMap::new();
        for root in live {
            let stream = self.observer.observe(&root);
            streams.insert(root, stream);
        }
        while let Some((_root, path)) = streams.next().await {
            self.offer(path);
        }
        info!(processed = self.processed.len(), "source observers finished");
        self.processed
    }
}
