//! In-memory stand-ins for the injected capabilities.

use std::collections::{HashMap, VecDeque};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, SystemTime};

use async_trait::async_trait;
use harrow_core::{
    CommandOutput, CommandRunner, CommandSpec, CoreError, CoreResult, DiskInspector, FileEntry,
};

const PROBE_MARKER: &str = "--remove-source-files";

/// Scripted reply for one invocation.
#[derive(Debug, Clone)]
pub(crate) enum Reply {
    Exit(i32),
    Output(CommandOutput),
    SpawnError,
}

/// Replays queued exit codes per command kind and records every invocation.
///
/// Unscripted invocations exit 0.
pub(crate) struct ScriptedRunner {
    probes: Mutex<VecDeque<Reply>>,
    transfers: Mutex<VecDeque<Reply>>,
    calls: Mutex<Vec<CommandSpec>>,
    delay: Duration,
    running: AtomicUsize,
    peak: AtomicUsize,
}

impl ScriptedRunner {
    pub(crate) fn new() -> Self {
        Self {
            probes: Mutex::new(VecDeque::new()),
            transfers: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
            delay: Duration::ZERO,
            running: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        }
    }

    /// Each transfer takes `delay` of (virtual) time.
    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub(crate) fn script_probe(&self, reply: Reply) {
        self.probes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(reply);
    }

    pub(crate) fn script_transfer(&self, reply: Reply) {
        self.transfers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(reply);
    }

    pub(crate) fn calls(&self) -> Vec<CommandSpec> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub(crate) fn transfer_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|command| command.has_arg(PROBE_MARKER))
            .count()
    }

    pub(crate) fn probe_calls(&self) -> usize {
        self.calls().len() - self.transfer_calls()
    }

    /// Highest number of transfers observed running at once.
    pub(crate) fn peak_concurrency(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CommandRunner for ScriptedRunner {
    async fn run(&self, command: &CommandSpec) -> anyhow::Result<CommandOutput> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(command.clone());
        let is_transfer = command.has_arg(PROBE_MARKER);
        let script = if is_transfer {
            &self.transfers
        } else {
            &self.probes
        };
        let reply = script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .unwrap_or(Reply::Exit(0));

        if is_transfer {
            let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            self.running.fetch_sub(1, Ordering::SeqCst);
        }

        match reply {
            Reply::Exit(code) => Ok(CommandOutput::exited(code)),
            Reply::Output(output) => Ok(output),
            Reply::SpawnError => Err(io::Error::from(io::ErrorKind::NotFound).into()),
        }
    }
}

/// Scripted free space, unit sizes and destination listings.
///
/// Deleting a listed file credits its size back to free space.
pub(crate) struct FakeDisk {
    free: Mutex<Option<u64>>,
    sizes: Mutex<HashMap<PathBuf, u64>>,
    listing: Mutex<Vec<FileEntry>>,
    removed: Mutex<Vec<PathBuf>>,
}

impl FakeDisk {
    pub(crate) fn new(free: u64) -> Self {
        Self {
            free: Mutex::new(Some(free)),
            sizes: Mutex::new(HashMap::new()),
            listing: Mutex::new(Vec::new()),
            removed: Mutex::new(Vec::new()),
        }
    }

    /// Free-space lookups fail.
    pub(crate) fn without_free_space_lookup() -> Self {
        let disk = Self::new(0);
        *disk.free.lock().unwrap_or_else(PoisonError::into_inner) = None;
        disk
    }

    pub(crate) fn with_unit(self, path: impl Into<PathBuf>, size: u64) -> Self {
        self.sizes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(path.into(), size);
        self
    }

    pub(crate) fn with_destination_file(
        self,
        path: impl Into<PathBuf>,
        size: u64,
        age: Duration,
    ) -> Self {
        self.listing
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(FileEntry {
                path: path.into(),
                size,
                modified: SystemTime::now() - age,
            });
        self
    }

    pub(crate) fn removed(&self) -> Vec<PathBuf> {
        self.removed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl DiskInspector for FakeDisk {
    fn free_bytes(&self, path: &Path) -> CoreResult<u64> {
        self.free
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .ok_or_else(|| CoreError::io("statvfs", path, io::Error::other("unavailable")))
    }

    fn file_size(&self, path: &Path) -> CoreResult<u64> {
        self.sizes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(path)
            .copied()
            .ok_or_else(|| {
                CoreError::io("metadata", path, io::Error::from(io::ErrorKind::NotFound))
            })
    }

    fn list_files(&self, _dir: &Path) -> CoreResult<Vec<FileEntry>> {
        Ok(self
            .listing
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    fn remove_file(&self, path: &Path) -> CoreResult<()> {
        let mut listing = self.listing.lock().unwrap_or_else(PoisonError::into_inner);
        let index = listing
            .iter()
            .position(|entry| entry.path == path)
            .ok_or_else(|| {
                CoreError::io("remove_file", path, io::Error::from(io::ErrorKind::NotFound))
            })?;
        let entry = listing.remove(index);
        if let Some(free) = self
            .free
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_mut()
        {
            *free += entry.size;
        }
        self.removed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(entry.path);
        Ok(())
    }
}
