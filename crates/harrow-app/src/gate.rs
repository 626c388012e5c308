//! Mutual exclusion around transfer invocations.
//!
//! # Design
//! - Two independent policies: one global lock, and one lock per source
//!   directory created on first use.
//! - Locks are always taken global first, then per-source; the permit drops
//!   them in reverse order.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex as StdMutex, PoisonError};

use harrow_config::GateConfig;
use tokio::sync::{Mutex, OwnedMutexGuard};

type SourceLocks = StdMutex<HashMap<PathBuf, Arc<Mutex<()>>>>;

/// Shared gate handed to every worker.
#[derive(Clone, Default)]
pub struct TransferGate {
    global: Option<Arc<Mutex<()>>>,
    per_source: Option<Arc<SourceLocks>>,
}

/// Held for the duration of one probe + transfer.
///
/// Field order matters: the per-source guard is released before the global one.
#[must_use = "dropping the permit releases the gate"]
pub struct GatePermit {
    _source: Option<OwnedMutexGuard<()>>,
    _global: Option<OwnedMutexGuard<()>>,
}

impl TransferGate {
    /// Gate with the policies enabled in `config`.
    #[must_use]
    pub fn new(config: GateConfig) -> Self {
        Self {
            global: config
                .global_single_transfer
                .then(|| Arc::new(Mutex::new(()))),
            per_source: config
                .per_source_single_transfer
                .then(|| Arc::new(StdMutex::new(HashMap::new()))),
        }
    }

    /// Wait until a transfer from `source` is allowed.
    pub async fn acquire(&self, source: &Path) -> GatePermit {
        let global = match &self.global {
            Some(lock) => Some(Arc::clone(lock).lock_owned().await),
            None => None,
        };
        let source_guard = match self.source_lock(source) {
            Some(lock) => Some(lock.lock_owned().await),
            None => None,
        };
        GatePermit {
            _source: source_guard,
            _global: global,
        }
    }

    /// Number of source directories that have a lock allocated.
    #[must_use]
    pub fn tracked_sources(&self) -> usize {
        self.per_source.as_ref().map_or(0, |locks| {
            locks.lock().unwrap_or_else(PoisonError::into_inner).len()
        })
    }

    fn source_lock(&self, source: &Path) -> Option<Arc<Mutex<()>>> {
        let locks = self.per_source.as_ref()?;
        let mut locks = locks.lock().unwrap_or_else(PoisonError::into_inner);
        Some(Arc::clone(locks.entry(source.to_path_buf()).or_default()))
    }
}
