//! Disk lookups against the local filesystem.

use std::fs;
use std::io;
use std::path::Path;

use harrow_core::{CoreError, CoreResult, DiskInspector, FileEntry};
use nix::sys::statvfs::statvfs;

/// [`DiskInspector`] backed by `statvfs(3)` and `std::fs`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalDisk;

impl LocalDisk {
    /// Create a new inspector.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl DiskInspector for LocalDisk {
    fn free_bytes(&self, path: &Path) -> CoreResult<u64> {
        let stats = statvfs(path)
            .map_err(|errno| CoreError::io("statvfs", path, io::Error::from(errno)))?;
        #[allow(clippy::useless_conversion)]
        let blocks = u64::from(stats.blocks_available());
        #[allow(clippy::useless_conversion)]
        let fragment = u64::from(stats.fragment_size());
        Ok(blocks.saturating_mul(fragment))
    }

    fn file_size(&self, path: &Path) -> CoreResult<u64> {
        fs::metadata(path)
            .map(|metadata| metadata.len())
            .map_err(|source| CoreError::io("metadata", path, source))
    }

    fn list_files(&self, dir: &Path) -> CoreResult<Vec<FileEntry>> {
        let entries = fs::read_dir(dir).map_err(|source| CoreError::io("read_dir", dir, source))?;
        let mut files = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| CoreError::io("read_dir.entry", dir, source))?;
            let path = entry.path();
            let metadata = match entry.metadata() {
                Ok(metadata) => metadata,
                // Removed between the listing and the stat.
                Err(err) if err.kind() == io::ErrorKind::NotFound => continue,
                Err(source) => return Err(CoreError::io("metadata", path, source)),
            };
            if !metadata.is_file() {
                continue;
            }
            let modified = metadata
                .modified()
                .map_err(|source| CoreError::io("modified", &path, source))?;
            files.push(FileEntry {
                path,
                size: metadata.len(),
                modified,
            });
        }
        Ok(files)
    }

    fn remove_file(&self, path: &Path) -> CoreResult<()> {
        fs::remove_file(path).map_err(|source| CoreError::io("remove_file", path, source))
    }
}
