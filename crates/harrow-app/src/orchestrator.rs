//! Scheduler wiring: one discovery task, one worker per destination and an
//! optional status reporter, all sharing a single work queue.

use std::sync::Arc;
use std::time::Duration;

use harrow_core::{CommandRunner, DiskInspector, PathObserver, TransferUnit};
use harrow_events::EventBus;
use harrow_fsops::ReclaimService;
use harrow_rsync::RsyncCommandBuilder;
use harrow_telemetry::Metrics;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::discovery::{DiscoveryEngine, ProcessedSet};
use crate::gate::TransferGate;
use crate::queue::WorkQueue;
use crate::settings::RuntimePlan;
use crate::worker::{WorkerContext, WorkerHandle, spawn_worker};

/// Capabilities the scheduler runs against.
pub struct SchedulerDeps {
    /// Executes probe and transfer commands.
    pub runner: Arc<dyn CommandRunner>,
    /// Unit sizes, free space and destination listings.
    pub disk: Arc<dyn DiskInspector>,
    /// Source of newly appearing files.
    pub observer: Arc<dyn PathObserver>,
    /// Domain event bus.
    pub events: EventBus,
    /// Metrics handle.
    pub metrics: Metrics,
}

/// Handles to every task spawned by [`spawn_scheduler`].
pub struct SchedulerHandles {
    /// Queue shared by discovery and the workers.
    pub queue: Arc<WorkQueue<TransferUnit>>,
    /// Discovery task; yields the processed set if every observer ends.
    pub discovery: JoinHandle<ProcessedSet>,
    /// One handle per destination, in start order.
    pub workers: Vec<WorkerHandle>,
    /// Periodic status reporter, when enabled.
    pub status: Option<JoinHandle<()>>,
}

impl SchedulerHandles {
    /// Number of workers still in rotation.
    #[must_use]
    pub fn active_workers(&self) -> usize {
        self.workers
            .iter()
            .filter(|worker| !worker.is_finished())
            .count()
    }

    /// Cancel every task and wait for them to stop.
    pub async fn shutdown(self) {
        let Self {
            queue,
            discovery,
            workers,
            status,
        } = self;
        discovery.abort();
        if let Some(status) = &status {
            status.abort();
        }
        for worker in &workers {
            worker.abort();
        }

        if let Err(err) = discovery.await
            && !err.is_cancelled()
        {
            warn!(error = %err, "discovery task join failed");
        }
        if let Some(status) = status
            && let Err(err) = status.await
            && !err.is_cancelled()
        {
            warn!(error = %err, "status task join failed");
        }
        for worker in workers {
            let destination = worker.destination().to_string();
            match worker.join().await {
                Ok(reason) => debug!(destination, reason = reason.as_str(), "worker had retired"),
                Err(err) if err.is_cancelled() => {}
                Err(err) => warn!(destination, error = %err, "worker join failed"),
            }
        }
        info!(queued = queue.len(), "scheduler stopped; queued units are not persisted");
    }
}

/// Spawn discovery, the destination workers and the status reporter.
#[must_use]
pub fn spawn_scheduler(plan: &RuntimePlan, deps: SchedulerDeps) -> SchedulerHandles {
    let SchedulerDeps {
        runner,
        disk,
        observer,
        events,
        metrics,
    } = deps;
    let queue = Arc::new(WorkQueue::new());

    let engine = DiscoveryEngine::new(
        Arc::clone(&queue),
        ProcessedSet::new(),
        observer,
        plan.extension.clone(),
        events.clone(),
        metrics.clone(),
    );
    let discovery = tokio::spawn(engine.run(plan.sources.clone()));

    let ctx = WorkerContext {
        queue: Arc::clone(&queue),
        gate: TransferGate::new(plan.gates),
        runner,
        disk: Arc::clone(&disk),
        reclaim: ReclaimService::new(disk, events.clone(), metrics.clone()),
        commands: Arc::new(RsyncCommandBuilder::new(plan.rsync.clone())),
        events,
        metrics: metrics.clone(),
        reclamation: plan.reclamation,
        backoff: plan.backoff,
    };
    let workers: Vec<WorkerHandle> = plan
        .destinations
        .iter()
        .map(|destination| spawn_worker(destination.clone(), ctx.clone()))
        .collect();

    let status = plan
        .status_interval
        .map(|interval| spawn_status_task(interval, Arc::clone(&queue), metrics));

    info!(
        sources = plan.sources.len(),
        destinations = workers.len(),
        global_gate = plan.gates.global_single_transfer,
        per_source_gate = plan.gates.per_source_single_transfer,
        "running"
    );
    SchedulerHandles {
        queue,
        discovery,
        workers,
        status,
    }
}

fn spawn_status_task(
    interval: Duration,
    queue: Arc<WorkQueue<TransferUnit>>,
    metrics: Metrics,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let snapshot = metrics.snapshot();
            info!(
                queue_depth = queue.len(),
                active_workers = snapshot.active_workers,
                workers_retired = snapshot.workers_retired_total,
                transfers_succeeded = snapshot.transfers_succeeded_total,
                transfers_failed = snapshot.transfers_failed_total,
                reclaimed_bytes = snapshot.reclaimed_bytes_total,
                "status"
            );
        }
    })
}
