#![forbid(unsafe_code)]
#![warn(
    unused,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    rustdoc::broken_intra_doc_links,
    missing_docs
)]

//! Filesystem side of the scheduler: source scans, destination disk lookups and
//! the space reclamation policy.
//!
//! Layout: `scan.rs` (recursive matching-file enumeration), `disk.rs`
//! (`LocalDisk`), `model` (reclamation request/outcome), `service.rs`
//! (`ReclaimService`), `error.rs` (`FsOpsError`).

pub mod disk;
pub mod error;
pub mod model;
pub mod scan;
pub mod service;

pub use disk::LocalDisk;
pub use error::{FsOpsError, FsOpsResult};
pub use model::{ReclaimOutcome, ReclaimRequest};
pub use scan::{has_extension, scan_matching};
pub use service::ReclaimService;
