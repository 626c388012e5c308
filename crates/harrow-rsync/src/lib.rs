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

//! Adapter for the external transfer mechanism.
//!
//! Layout: `command.rs` (probe and transfer command composition), `runner.rs`
//! (`ProcessRunner`, a `tokio::process` implementation of `CommandRunner`),
//! `error.rs` (`RsyncError`).

pub mod command;
pub mod error;
pub mod runner;

pub use command::{IoPriority, RsyncCommandBuilder, RsyncOptions};
pub use error::{RsyncError, RsyncResult};
pub use runner::ProcessRunner;
