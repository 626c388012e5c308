//! Capabilities injected into the discovery engine and destination workers.
//!
//! Process spawning, disk queries and directory observation are all external
//! collaborators; keeping them behind these traits lets the scheduling logic run
//! against in-memory fakes.

use std::path::{Path, PathBuf};
use std::pin::Pin;

use async_trait::async_trait;
use tokio_stream::Stream;

use crate::error::CoreResult;
use crate::model::{CommandOutput, CommandSpec, FileEntry};

/// Launches an external command and waits for it to finish.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run `command` to completion, capturing its exit code and output.
    async fn run(&self, command: &CommandSpec) -> anyhow::Result<CommandOutput>;
}

/// Synchronous disk lookups used by space checks and reclamation.
pub trait DiskInspector: Send + Sync {
    /// Bytes available to unprivileged writers on the filesystem holding `path`.
    ///
    /// # Errors
    ///
    /// Returns an error when the filesystem cannot be queried.
    fn free_bytes(&self, path: &Path) -> CoreResult<u64>;

    /// Current size of the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error when the metadata cannot be read.
    fn file_size(&self, path: &Path) -> CoreResult<u64>;

    /// Regular files directly under `dir` (non-recursive).
    ///
    /// # Errors
    ///
    /// Returns an error when the directory cannot be listed.
    fn list_files(&self, dir: &Path) -> CoreResult<Vec<FileEntry>>;

    /// Delete the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error when the file cannot be removed.
    fn remove_file(&self, path: &Path) -> CoreResult<()>;
}

/// Unbounded stream of matching paths observed under a source volume.
pub type PathStream = Pin<Box<dyn Stream<Item = PathBuf> + Send>>;

/// Produces newly appearing matching files for a source volume.
///
/// Implementations may yield the same path more than once (for example a poller
/// that relists the whole directory); de-duplication is the caller's job.
pub trait PathObserver: Send + Sync {
    /// Start observing `root`. The stream runs for the life of the process.
    fn observe(&self, root: &Path) -> PathStream;
}
