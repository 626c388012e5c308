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

//! Harrow scheduler: discovers finished files on source volumes and moves them
//! onto a rotating set of destination disks.
//!
//! Layout: `bootstrap.rs` (entry and wiring), `cli.rs` (command line),
//! `settings.rs` (runtime plan), `discovery.rs` and `observer.rs` (finding
//! units), `queue.rs` (shared FIFO), `gate.rs` (transfer locks), `worker.rs`
//! (destination state machine), `orchestrator.rs` (task spawning).

/// Application bootstrap and command dispatch.
pub mod bootstrap;
mod cli;
/// Discovery engine and processed-path bookkeeping.
pub mod discovery;
pub mod error;
/// Transfer concurrency gates.
pub mod gate;
/// Polling source observer.
pub mod observer;
/// Scheduler wiring.
pub mod orchestrator;
/// Work queue shared by discovery and workers.
pub mod queue;
/// Configuration translated into runtime settings.
pub mod settings;
#[cfg(test)]
mod testing;
/// Destination worker state machine.
pub mod worker;

pub use bootstrap::run_app;
pub use discovery::{DiscoveryEngine, ProcessedSet};
pub use error::{AppError, AppResult};
pub use gate::{GatePermit, TransferGate};
pub use observer::PollingObserver;
pub use orchestrator::{SchedulerDeps, SchedulerHandles, spawn_scheduler};
pub use queue::WorkQueue;
pub use settings::RuntimePlan;
pub use worker::{RetireReason, WorkerContext, WorkerHandle, WorkerPhase, spawn_worker};
