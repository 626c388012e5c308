//! Per-destination transfer worker.
//!
//! # Design
//! - One task per destination, written as an explicit state machine:
//!   `AwaitingUnit -> SpaceCheck -> GatedTransfer -> ClassifyResult`, then back
//!   to `AwaitingUnit` or into `Retired`.
//! - Every failure path that gives up on a unit requeues it first; only a
//!   unit whose source file disappeared is dropped.
//! - Step faults (spawn errors, unreadable sizes) are logged and recovered
//!   without leaving the loop.
//! - The current phase is published on a `watch` channel for supervisors.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use harrow_config::{BackoffConfig, ReclamationConfig};
use harrow_core::{
    CommandOutput, CommandRunner, Destination, DiskInspector, ExitClass, TransferUnit,
};
use harrow_events::{Event, EventBus};
use harrow_fsops::{ReclaimRequest, ReclaimService};
use harrow_rsync::RsyncCommandBuilder;
use harrow_telemetry::Metrics;
use tokio::sync::watch;
use tokio::task::{JoinError, JoinHandle};
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::gate::TransferGate;
use crate::queue::WorkQueue;

/// Why a destination left the rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetireReason {
    /// Not enough free space even after reclamation.
    DestinationFull,
    /// The probe transfer exited non-zero.
    ProbeFailed,
    /// The transfer reported a file I/O fault.
    FileIo,
    /// The transfer exited with an unclassified non-zero code.
    TransferFailed,
}

impl RetireReason {
    /// Stable label used in logs and events.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::DestinationFull => "destination_full",
            Self::ProbeFailed => "probe_failed",
            Self::FileIo => "file_io",
            Self::TransferFailed => "transfer_failed",
        }
    }
}

/// Observable state of a worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerPhase {
    /// Suspended on the work queue.
    AwaitingUnit,
    /// Checking (and possibly reclaiming) destination space.
    SpaceCheck,
    /// Holding the gates while the probe and transfer run.
    GatedTransfer,
    /// Interpreting the transfer exit code.
    ClassifyResult,
    /// Out of rotation; the task has finished.
    Retired(RetireReason),
}

enum WorkerState {
    AwaitingUnit,
    SpaceCheck(TransferUnit),
    GatedTransfer(TransferUnit),
    ClassifyResult {
        unit: TransferUnit,
        output: CommandOutput,
        elapsed: Duration,
    },
    Retired(RetireReason),
}

impl WorkerState {
    const fn phase(&self) -> WorkerPhase {
        match self {
            Self::AwaitingUnit => WorkerPhase::AwaitingUnit,
            Self::SpaceCheck(_) => WorkerPhase::SpaceCheck,
            Self::GatedTransfer(_) => WorkerPhase::GatedTransfer,
            Self::ClassifyResult { .. } => WorkerPhase::ClassifyResult,
            Self::Retired(reason) => WorkerPhase::Retired(*reason),
        }
    }
}

/// A step that failed for reasons other than the transfer exit code.
struct WorkerFault {
    unit: TransferUnit,
    operation: &'static str,
    source: anyhow::Error,
}

impl WorkerFault {
    fn new(unit: TransferUnit, operation: &'static str, source: impl Into<anyhow::Error>) -> Self {
        Self {
            unit,
            operation,
            source: source.into(),
        }
    }
}

/// Shared collaborators handed to every worker.
#[derive(Clone)]
pub struct WorkerContext {
    /// Queue the worker pulls from and requeues onto.
    pub queue: Arc<WorkQueue<TransferUnit>>,
    /// Concurrency gates around the transfer invocation.
    pub gate: TransferGate,
    /// Executes probe and transfer commands.
    pub runner: Arc<dyn CommandRunner>,
    /// Unit sizes and destination free space.
    pub disk: Arc<dyn DiskInspector>,
    /// Space reclamation for local destinations.
    pub reclaim: ReclaimService,
    /// Composes probe and transfer commands.
    pub commands: Arc<RsyncCommandBuilder>,
    /// Domain event bus.
    pub events: EventBus,
    /// Metrics handle.
    pub metrics: Metrics,
    /// Reclamation policy.
    pub reclamation: ReclamationConfig,
    /// Pauses after failed transfers.
    pub backoff: BackoffConfig,
}

/// Supervisor view of a spawned worker.
pub struct WorkerHandle {
    destination: Destination,
    phase: watch::Receiver<WorkerPhase>,
    task: JoinHandle<RetireReason>,
}

impl WorkerHandle {
    /// Destination served by this worker.
    #[must_use]
    pub const fn destination(&self) -> &Destination {
        &self.destination
    }

    /// Most recently published phase.
    #[must_use]
    pub fn phase(&self) -> WorkerPhase {
        *self.phase.borrow()
    }

    /// Wait until the worker reports `phase`; `false` if it finished without
    /// ever doing so.
    pub async fn wait_for_phase(&mut self, phase: WorkerPhase) -> bool {
        self.phase.wait_for(|current| *current == phase).await.is_ok()
    }

    /// Whether the worker task has ended.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Cancel the worker at its next suspension point.
    pub fn abort(&self) {
        self.task.abort();
    }

    /// Wait for the worker to retire.
    ///
    /// # Errors
    ///
    /// Returns the join error when the task panicked or was aborted.
    pub async fn join(self) -> Result<RetireReason, JoinError> {
        self.task.await
    }
}

/// Start a worker task for `destination`.
#[must_use]
pub fn spawn_worker(destination: Destination, ctx: WorkerContext) -> WorkerHandle {
    let (phase_tx, phase_rx) = watch::channel(WorkerPhase::AwaitingUnit);
    let worker = DestinationWorker {
        destination: destination.clone(),
        ctx,
        phase: phase_tx,
    };
    WorkerHandle {
        destination,
        phase: phase_rx,
        task: tokio::spawn(worker.run()),
    }
}

struct DestinationWorker {
    destination: Destination,
    ctx: WorkerContext,
    phase: watch::Sender<WorkerPhase>,
}

impl DestinationWorker {
    async fn run(self) -> RetireReason {
        self.ctx.metrics.worker_started();
        info!(destination = %self.destination, "worker started");
        self.ctx.events.publish(Event::WorkerStarted {
            destination: self.destination.to_string(),
        });

        let mut state = WorkerState::AwaitingUnit;
        loop {
            self.phase.send_replace(state.phase());
            let step = match state {
                WorkerState::AwaitingUnit => Ok(self.await_unit().await),
                WorkerState::SpaceCheck(unit) => self.space_check(unit),
                WorkerState::GatedTransfer(unit) => self.gated_transfer(unit).await,
                WorkerState::ClassifyResult {
                    unit,
                    output,
                    elapsed,
                } => Ok(self.classify(&unit, &output, elapsed).await),
                WorkerState::Retired(reason) => {
                    self.retire(reason);
                    return reason;
                }
            };
            state = match step {
                Ok(next) => next,
                Err(fault) => self.recover(fault).await,
            };
        }
    }

    async fn await_unit(&self) -> WorkerState {
        let unit = self.ctx.queue.pop().await;
        self.ctx.metrics.set_queue_depth(self.ctx.queue.len());
        WorkerState::SpaceCheck(unit)
    }

    fn space_check(&self, unit: TransferUnit) -> Result<WorkerState, WorkerFault> {
        let Some(root) = self.destination.local_path() else {
            return Ok(WorkerState::GatedTransfer(unit));
        };
        let size = match unit.size(self.ctx.disk.as_ref()) {
            Ok(size) => size,
            Err(err) => return Err(WorkerFault::new(unit, "space_check.unit_size", err)),
        };
        let free = match self.ctx.disk.free_bytes(root) {
            Ok(free) => free,
            Err(err) => {
                warn!(
                    destination = %self.destination,
                    error = %err,
                    "free space unavailable; skipping space check"
                );
                return Ok(WorkerState::GatedTransfer(unit));
            }
        };
        let target = size.saturating_mul(self.ctx.reclamation.headroom_multiplier);
        if free >= target {
            return Ok(WorkerState::GatedTransfer(unit));
        }
        debug!(
            destination = %self.destination,
            free_bytes = free,
            target_bytes = target,
            "free space below headroom"
        );
        if self.ctx.reclamation.enabled && self.reclaim(root, size) {
            return Ok(WorkerState::GatedTransfer(unit));
        }

        warn!(
            destination = %self.destination,
            path = %unit.path().display(),
            "destination full"
        );
        self.ctx.events.publish(Event::DestinationFull {
            destination: self.destination.to_string(),
            path: unit.path().display().to_string(),
        });
        self.requeue(unit);
        Ok(WorkerState::Retired(RetireReason::DestinationFull))
    }

    fn reclaim(&self, root: &Path, unit_bytes: u64) -> bool {
        let request = ReclaimRequest::new(
            root,
            unit_bytes,
            self.ctx.reclamation.headroom_multiplier,
            self.ctx.reclamation.age_threshold(),
        );
        match self.ctx.reclaim.reclaim(request) {
            Ok(outcome) => outcome.target_met(),
            Err(err) => {
                warn!(
                    destination = %self.destination,
                    error = %err,
                    "space reclamation failed"
                );
                false
            }
        }
    }

    async fn gated_transfer(&self, unit: TransferUnit) -> Result<WorkerState, WorkerFault> {
        let permit = self.ctx.gate.acquire(unit.source()).await;
        info!(
            path = %unit.path().display(),
            destination = %self.destination,
            "transfer starting"
        );
        self.ctx.events.publish(Event::TransferStarted {
            path: unit.path().display().to_string(),
            destination: self.destination.to_string(),
        });

        let probe = self.ctx.commands.probe(&self.destination);
        let probe_output = match self.ctx.runner.run(&probe).await {
            Ok(output) => output,
            Err(err) => return Err(WorkerFault::new(unit, "transfer.probe", err)),
        };
        if !probe_output.success() {
            drop(permit);
            warn!(
                destination = %self.destination,
                exit_code = ?probe_output.code,
                stderr = %probe_output.stderr.trim(),
                "probe transfer failed"
            );
            self.ctx.metrics.inc_transfer("probe");
            self.ctx.events.publish(Event::TransferFailed {
                path: unit.path().display().to_string(),
                destination: self.destination.to_string(),
                exit_code: probe_output.code,
                class: "probe".to_string(),
            });
            self.requeue(unit);
            return Ok(WorkerState::Retired(RetireReason::ProbeFailed));
        }

        let command = self.ctx.commands.transfer(&unit, &self.destination);
        debug!(command = %command, "running transfer");
        let started = Instant::now();
        let result = self.ctx.runner.run(&command).await;
        drop(permit);
        match result {
            Ok(output) => Ok(WorkerState::ClassifyResult {
                unit,
                output,
                elapsed: started.elapsed(),
            }),
            Err(err) => Err(WorkerFault::new(unit, "transfer.run", err)),
        }
    }

    async fn classify(
        &self,
        unit: &TransferUnit,
        output: &CommandOutput,
        elapsed: Duration,
    ) -> WorkerState {
        if !output.stdout.trim().is_empty() {
            debug!(destination = %self.destination, stdout = %output.stdout.trim(), "transfer output");
        }
        if !output.stderr.trim().is_empty() {
            warn!(destination = %self.destination, stderr = %output.stderr.trim(), "transfer errors");
        }

        let class = output.class();
        self.ctx.metrics.inc_transfer(class.as_str());
        if class == ExitClass::Success {
            let elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
            info!(
                path = %unit.path().display(),
                destination = %self.destination,
                elapsed_ms,
                "transfer finished"
            );
            self.ctx.events.publish(Event::TransferSucceeded {
                path: unit.path().display().to_string(),
                destination: self.destination.to_string(),
                elapsed_ms,
            });
            return WorkerState::AwaitingUnit;
        }

        warn!(
            path = %unit.path().display(),
            destination = %self.destination,
            exit_code = ?output.code,
            class = class.as_str(),
            "transfer failed"
        );
        self.ctx.events.publish(Event::TransferFailed {
            path: unit.path().display().to_string(),
            destination: self.destination.to_string(),
            exit_code: output.code,
            class: class.as_str().to_string(),
        });
        self.requeue(unit.clone());

        match class {
            ExitClass::Network => {
                tokio::time::sleep(self.ctx.backoff.long()).await;
                WorkerState::AwaitingUnit
            }
            ExitClass::FileIo => WorkerState::Retired(RetireReason::FileIo),
            ExitClass::Success | ExitClass::Other => {
                tokio::time::sleep(self.ctx.backoff.short()).await;
                WorkerState::Retired(RetireReason::TransferFailed)
            }
        }
    }

    async fn recover(&self, fault: WorkerFault) -> WorkerState {
        let WorkerFault {
            unit,
            operation,
            source,
        } = fault;
        error!(
            destination = %self.destination,
            path = %unit.path().display(),
            operation,
            error = %source,
            "worker step failed"
        );
        match self.ctx.disk.file_size(unit.path()) {
            Err(err) if err.is_not_found() => {
                warn!(path = %unit.path().display(), "source file vanished; dropping unit");
                self.ctx.events.publish(Event::UnitDropped {
                    path: unit.path().display().to_string(),
                    reason: "source_missing".to_string(),
                });
            }
            _ => {
                self.requeue(unit);
                tokio::time::sleep(self.ctx.backoff.short()).await;
            }
        }
        WorkerState::AwaitingUnit
    }

    fn requeue(&self, unit: TransferUnit) {
        debug!(path = %unit.path().display(), "requeueing unit");
        self.ctx.queue.push(unit);
        self.ctx.metrics.set_queue_depth(self.ctx.queue.len());
    }

    fn retire(&self, reason: RetireReason) {
        warn!(
            destination = %self.destination,
            reason = reason.as_str(),
            "destination retiring"
        );
        self.ctx.events.publish(Event::DestinationRetired {
            destination: self.destination.to_string(),
            reason: reason.as_str().to_string(),
        });
        self.ctx.metrics.worker_retired();
        if self.ctx.metrics.snapshot().active_workers <= 0 {
            warn!("no destinations remain in rotation");
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::error::Error;
    use std::path::PathBuf;

    use harrow_config::{GateConfig, TransferConfig};
    use harrow_events::EventStream;
    use harrow_rsync::RsyncOptions;
    use tokio::time::timeout;

    use crate::testing::{FakeDisk, Reply, ScriptedRunner};

    const DAY: Duration = Duration::from_secs(86_400);
    const WAIT: Duration = Duration::from_secs(4 * 3_600);
    const UNIT: &str = "/farm1/plot-k32-a.plot";

    type TestResult = Result<(), Box<dyn Error>>;

    pub(crate) fn context(
        runner: Arc<ScriptedRunner>,
        disk: Arc<FakeDisk>,
        gates: GateConfig,
    ) -> Result<WorkerContext, Box<dyn Error>> {
        let events = EventBus::with_capacity(256);
        let metrics = Metrics::new()?;
        let disk: Arc<dyn DiskInspector> = disk;
        Ok(WorkerContext {
            queue: Arc::new(WorkQueue::new()),
            gate: TransferGate::new(gates),
            runner,
            disk: Arc::clone(&disk),
            reclaim: ReclaimService::new(disk, events.clone(), metrics.clone()),
            commands: Arc::new(RsyncCommandBuilder::new(RsyncOptions::try_from(
                &TransferConfig::default(),
            )?)),
            events,
            metrics,
            reclamation: ReclamationConfig::default(),
            backoff: BackoffConfig::default(),
        })
    }

    /// Next event of `kind`, skipping others.
    pub(crate) async fn next_of_kind(stream: &mut EventStream, kind: &str) -> Option<Event> {
        timeout(WAIT, async {
            while let Some(envelope) = stream.next().await {
                if envelope.event.kind() == kind {
                    return Some(envelope.event);
                }
            }
            None
        })
        .await
        .ok()
        .flatten()
    }

    fn remote() -> Result<Destination, Box<dyn Error>> {
        Ok(Destination::parse("nas::plots")?)
    }

    fn local() -> Result<Destination, Box<dyn Error>> {
        Ok(Destination::parse("/mnt/d0")?)
    }

    #[tokio::test(start_paused = true)]
    async fn success_discards_unit_and_keeps_serving() -> TestResult {
        let runner = Arc::new(ScriptedRunner::new());
        runner.script_transfer(Reply::Output(CommandOutput {
            code: Some(0),
            stdout: "sent 104 bytes".to_string(),
            stderr: String::new(),
        }));
        let ctx = context(Arc::clone(&runner), Arc::new(FakeDisk::new(0)), GateConfig::default())?;
        let mut events = ctx.events.subscribe(None);
        ctx.queue.push(TransferUnit::new(UNIT));
        let mut handle = spawn_worker(remote()?, ctx.clone());

        let succeeded = next_of_kind(&mut events, "transfer_succeeded").await;
        assert!(matches!(
            succeeded,
            Some(Event::TransferSucceeded { ref path, .. }) if path == UNIT
        ));
        assert!(handle.wait_for_phase(WorkerPhase::AwaitingUnit).await);
        assert!(ctx.queue.is_empty());
        assert_eq!(runner.probe_calls(), 1);
        assert_eq!(runner.transfer_calls(), 1);
        assert!(!handle.is_finished());
        let snapshot = ctx.metrics.snapshot();
        assert_eq!(snapshot.transfers_succeeded_total, 1);
        assert_eq!(snapshot.active_workers, 1);
        handle.abort();
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn network_fault_requeues_and_retries_after_long_backoff() -> TestResult {
        let runner = Arc::new(ScriptedRunner::new());
        runner.script_transfer(Reply::Exit(10));
        let ctx = context(Arc::clone(&runner), Arc::new(FakeDisk::new(0)), GateConfig::default())?;
        let mut events = ctx.events.subscribe(None);
        ctx.queue.push(TransferUnit::new(UNIT));
        let handle = spawn_worker(remote()?, ctx.clone());

        let failed = next_of_kind(&mut events, "transfer_failed").await;
        assert!(matches!(
            failed,
            Some(Event::TransferFailed { exit_code: Some(10), ref class, .. }) if class == "network"
        ));
        let failed_at = Instant::now();
        assert_eq!(ctx.queue.len(), 1);

        assert!(next_of_kind(&mut events, "transfer_succeeded").await.is_some());
        assert!(failed_at.elapsed() >= ctx.backoff.long());
        assert_eq!(runner.transfer_calls(), 2);
        assert!(ctx.queue.is_empty());
        assert!(!handle.is_finished());
        handle.abort();
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn file_io_fault_requeues_and_retires() -> TestResult {
        let runner = Arc::new(ScriptedRunner::new());
        runner.script_transfer(Reply::Exit(11));
        let ctx = context(Arc::clone(&runner), Arc::new(FakeDisk::new(0)), GateConfig::default())?;
        ctx.queue.push(TransferUnit::new(UNIT));
        let handle = spawn_worker(remote()?, ctx.clone());

        assert_eq!(timeout(WAIT, handle.join()).await??, RetireReason::FileIo);
        assert_eq!(ctx.queue.len(), 1);
        assert_eq!(runner.transfer_calls(), 1);
        let snapshot = ctx.metrics.snapshot();
        assert_eq!(snapshot.active_workers, 0);
        assert_eq!(snapshot.workers_retired_total, 1);
        let retired = ctx
            .events
            .backlog_since(0)
            .into_iter()
            .any(|envelope| envelope.event.kind() == "destination_retired");
        assert!(retired);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn generic_fault_retires_after_short_backoff() -> TestResult {
        let runner = Arc::new(ScriptedRunner::new());
        runner.script_transfer(Reply::Exit(1));
        let ctx = context(Arc::clone(&runner), Arc::new(FakeDisk::new(0)), GateConfig::default())?;
        ctx.queue.push(TransferUnit::new(UNIT));
        let started = Instant::now();
        let handle = spawn_worker(remote()?, ctx.clone());

        assert_eq!(
            timeout(WAIT, handle.join()).await??,
            RetireReason::TransferFailed
        );
        assert!(started.elapsed() >= ctx.backoff.short());
        assert!(started.elapsed() < ctx.backoff.long());
        assert_eq!(ctx.queue.len(), 1);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn probe_failure_retires_without_transferring() -> TestResult {
        let runner = Arc::new(ScriptedRunner::new());
        runner.script_probe(Reply::Exit(12));
        let ctx = context(Arc::clone(&runner), Arc::new(FakeDisk::new(0)), GateConfig::default())?;
        ctx.queue.push(TransferUnit::new(UNIT));
        let handle = spawn_worker(remote()?, ctx.clone());

        assert_eq!(
            timeout(WAIT, handle.join()).await??,
            RetireReason::ProbeFailed
        );
        assert_eq!(runner.probe_calls(), 1);
        assert_eq!(runner.transfer_calls(), 0);
        assert_eq!(ctx.queue.len(), 1);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn reclamation_makes_room_for_the_transfer() -> TestResult {
        let old = PathBuf::from("/mnt/d0/old.plot");
        let disk = Arc::new(
            FakeDisk::new(100)
                .with_unit(UNIT, 100)
                .with_destination_file(&old, 250, DAY * 200)
                .with_destination_file("/mnt/d0/new.plot", 250, DAY),
        );
        let runner = Arc::new(ScriptedRunner::new());
        let ctx = context(Arc::clone(&runner), Arc::clone(&disk), GateConfig::default())?;
        let mut events = ctx.events.subscribe(None);
        ctx.queue.push(TransferUnit::new(UNIT));
        let handle = spawn_worker(local()?, ctx.clone());

        assert!(next_of_kind(&mut events, "transfer_succeeded").await.is_some());
        assert_eq!(disk.removed(), vec![old]);
        assert_eq!(runner.transfer_calls(), 1);
        assert_eq!(ctx.metrics.snapshot().reclaimed_bytes_total, 250);
        handle.abort();
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn full_destination_requeues_and_retires_without_transferring() -> TestResult {
        let disk = Arc::new(
            FakeDisk::new(10)
                .with_unit(UNIT, 100)
                .with_destination_file("/mnt/d0/young.plot", 5_000, DAY),
        );
        let runner = Arc::new(ScriptedRunner::new());
        let ctx = context(Arc::clone(&runner), Arc::clone(&disk), GateConfig::default())?;
        ctx.queue.push(TransferUnit::new(UNIT));
        let handle = spawn_worker(local()?, ctx.clone());

        assert_eq!(
            timeout(WAIT, handle.join()).await??,
            RetireReason::DestinationFull
        );
        assert!(runner.calls().is_empty());
        assert!(disk.removed().is_empty());
        assert_eq!(ctx.queue.len(), 1);
        let kinds: Vec<_> = ctx
            .events
            .backlog_since(0)
            .into_iter()
            .map(|envelope| envelope.event.kind())
            .collect();
        assert!(kinds.contains(&"destination_full"));
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn unreadable_free_space_skips_the_check() -> TestResult {
        let disk = Arc::new(FakeDisk::without_free_space_lookup().with_unit(UNIT, 100));
        let runner = Arc::new(ScriptedRunner::new());
        let ctx = context(Arc::clone(&runner), disk, GateConfig::default())?;
        let mut events = ctx.events.subscribe(None);
        ctx.queue.push(TransferUnit::new(UNIT));
        let handle = spawn_worker(local()?, ctx);

        assert!(next_of_kind(&mut events, "transfer_succeeded").await.is_some());
        assert_eq!(runner.transfer_calls(), 1);
        handle.abort();
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn spawn_fault_requeues_while_source_exists() -> TestResult {
        let runner = Arc::new(ScriptedRunner::new());
        runner.script_transfer(Reply::SpawnError);
        let disk = Arc::new(FakeDisk::new(0).with_unit(UNIT, 100));
        let ctx = context(Arc::clone(&runner), disk, GateConfig::default())?;
        let mut events = ctx.events.subscribe(None);
        ctx.queue.push(TransferUnit::new(UNIT));
        let handle = spawn_worker(remote()?, ctx.clone());

        assert!(next_of_kind(&mut events, "transfer_succeeded").await.is_some());
        assert_eq!(runner.transfer_calls(), 2);
        assert_eq!(runner.probe_calls(), 2);
        assert!(!handle.is_finished());
        handle.abort();
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn vanished_source_is_dropped() -> TestResult {
        let runner = Arc::new(ScriptedRunner::new());
        runner.script_transfer(Reply::SpawnError);
        let ctx = context(Arc::clone(&runner), Arc::new(FakeDisk::new(0)), GateConfig::default())?;
        let mut events = ctx.events.subscribe(None);
        ctx.queue.push(TransferUnit::new(UNIT));
        let mut handle = spawn_worker(remote()?, ctx.clone());

        let dropped = next_of_kind(&mut events, "unit_dropped").await;
        assert!(matches!(
            dropped,
            Some(Event::UnitDropped { ref reason, .. }) if reason == "source_missing"
        ));
        assert!(handle.wait_for_phase(WorkerPhase::AwaitingUnit).await);
        assert!(ctx.queue.is_empty());
        assert!(!handle.is_finished());
        handle.abort();
        Ok(())
    }

    #[test]
    fn retire_reasons_have_stable_labels() {
        assert_eq!(RetireReason::DestinationFull.as_str(), "destination_full");
        assert_eq!(RetireReason::ProbeFailed.as_str(), "probe_failed");
        assert_eq!(RetireReason::FileIo.as_str(), "file_io");
        assert_eq!(RetireReason::TransferFailed.as_str(), "transfer_failed");
    }
}
