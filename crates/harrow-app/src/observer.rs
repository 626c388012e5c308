//! Polling implementation of [`PathObserver`].

use std::path::Path;
use std::time::Duration;

use async_stream::stream;
use harrow_core::{PathObserver, PathStream};
use harrow_fsops::scan_matching;
use tracing::warn;

/// Rescans a source directory on a fixed interval and yields every match.
///
/// Matches already seen on a previous pass are yielded again; the discovery
/// engine filters them out.
#[derive(Debug, Clone)]
pub struct PollingObserver {
    extension: String,
    interval: Duration,
}

impl PollingObserver {
    /// Observer for files ending in `extension`, rescanning every `interval`.
    #[must_use]
    pub fn new(extension: impl Into<String>, interval: Duration) -> Self {
        Self {
            extension: extension.into(),
            interval,
        }
    }
}

impl PathObserver for PollingObserver {
    fn observe(&self, root: &Path) -> PathStream {
        let root = root.to_path_buf();
        let extension = self.extension.clone();
        let interval = self.interval;
        Box::pin(stream! {
            loop {
                tokio::time::sleep(interval).await;
                match scan_matching(&root, &extension) {
                    Ok(paths) => {
                        for path in paths {
                            yield path;
                        }
                    }
                    Err(err) => {
                        warn!(root = %root.display(), error = %err, "source rescan failed");
                    }
                }
            }
        })
    }
}
