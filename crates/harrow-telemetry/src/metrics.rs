//! Prometheus-backed metrics registry and snapshot helpers.
//!
//! # Design
//! - Encapsulates collector registration to keep the public API small.
//! - Exposes the counters/gauges the scheduler needs for periodic status lines.

use std::sync::Arc;

use prometheus::{Encoder, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};
use serde::Serialize;

use crate::error::{Result, TelemetryError};

/// Outcome labels recorded on `transfers_total`.
const FAILURE_CLASSES: [&str; 4] = ["network", "file_io", "other", "probe"];

/// Prometheus-backed metrics registry shared across services.
#[derive(Clone)]
pub struct Metrics {
    inner: Arc<MetricsInner>,
}

struct MetricsInner {
    registry: Registry,
    units_enqueued_total: IntCounter,
    transfers_total: IntCounterVec,
    reclaimed_files_total: IntCounter,
    reclaimed_bytes_total: IntCounter,
    workers_retired_total: IntCounter,
    queue_depth: IntGauge,
    active_workers: IntGauge,
}

/// Snapshot of selected gauges and counters for status reporting.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct MetricsSnapshot {
    /// Units discovered and queued since startup.
    pub units_enqueued_total: u64,
    /// Transfers that exited successfully.
    pub transfers_succeeded_total: u64,
    /// Probe or transfer commands that exited non-zero.
    pub transfers_failed_total: u64,
    /// Files deleted by space reclamation.
    pub reclaimed_files_total: u64,
    /// Bytes released by space reclamation.
    pub reclaimed_bytes_total: u64,
    /// Workers that left rotation.
    pub workers_retired_total: u64,
    /// Units currently waiting in the queue.
    pub queue_depth: i64,
    /// Workers still accepting units.
    pub active_workers: i64,
}

impl Metrics {
    /// Construct a new metrics registry with the standard collectors registered.
    ///
    /// # Errors
    ///
    /// Returns an error if any of the Prometheus collectors cannot be
    /// built or registered.
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let units_enqueued_total = register_counter(
            &registry,
            "units_enqueued_total",
            "Discovered files placed on the work queue",
        )?;
        let transfers_total = IntCounterVec::new(
            Opts::new("transfers_total", "Transfer attempts by outcome class"),
            &["class"],
        )
        .map_err(|source| TelemetryError::create("transfers_total", source))?;
        registry
            .register(Box::new(transfers_total.clone()))
            .map_err(|source| TelemetryError::register("transfers_total", source))?;
        let reclaimed_files_total = register_counter(
            &registry,
            "reclaimed_files_total",
            "Aged destination files deleted to make room",
        )?;
        let reclaimed_bytes_total = register_counter(
            &registry,
            "reclaimed_bytes_total",
            "Bytes released by space reclamation",
        )?;
        let workers_retired_total = register_counter(
            &registry,
            "workers_retired_total",
            "Destination workers removed from rotation",
        )?;
        let queue_depth = register_gauge(&registry, "queue_depth", "Units waiting for a worker")?;
        let active_workers = register_gauge(
            &registry,
            "active_workers",
            "Destination workers accepting units",
        )?;

        Ok(Self {
            inner: Arc::new(MetricsInner {
                registry,
                units_enqueued_total,
                transfers_total,
                reclaimed_files_total,
                reclaimed_bytes_total,
                workers_retired_total,
                queue_depth,
                active_workers,
            }),
        })
    }

    /// Count a unit entering the queue for the first time.
    pub fn inc_enqueued(&self) {
        self.inner.units_enqueued_total.inc();
    }

    /// Count a finished transfer attempt under its outcome class label.
    pub fn inc_transfer(&self, class: &str) {
        self.inner.transfers_total.with_label_values(&[class]).inc();
    }

    /// Record one reclaimed file of `bytes` size.
    pub fn add_reclaimed(&self, bytes: u64) {
        self.inner.reclaimed_files_total.inc();
        self.inner.reclaimed_bytes_total.inc_by(bytes);
    }

    /// Set the queue depth gauge.
    pub fn set_queue_depth(&self, depth: usize) {
        self.inner
            .queue_depth
            .set(i64::try_from(depth).unwrap_or(i64::MAX));
    }

    /// A worker entered service.
    pub fn worker_started(&self) {
        self.inner.active_workers.inc();
    }

    /// A worker left rotation for good.
    pub fn worker_retired(&self) {
        self.inner.active_workers.dec();
        self.inner.workers_retired_total.inc();
    }

    /// Render the metrics registry using the Prometheus text exposition format.
    ///
    /// # Errors
    ///
    /// Returns an error if the metrics cannot be encoded or if the encoded
    /// buffer is not valid UTF-8.
    pub fn render(&self) -> Result<String> {
        let mut text = Vec::new();
        TextEncoder::new()
            .encode(&self.inner.registry.gather(), &mut text)
            .map_err(TelemetryError::render)?;
        String::from_utf8(text).map_err(TelemetryError::render)
    }

    /// Take a point-in-time snapshot of the most relevant gauges and counters.
    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        let transfers = &self.inner.transfers_total;
        MetricsSnapshot {
            units_enqueued_total: self.inner.units_enqueued_total.get(),
            transfers_succeeded_total: transfers.with_label_values(&["success"]).get(),
            transfers_failed_total: FAILURE_CLASSES
                .iter()
                .map(|class| transfers.with_label_values(&[*class]).get())
                .sum(),
            reclaimed_files_total: self.inner.reclaimed_files_total.get(),
            reclaimed_bytes_total: self.inner.reclaimed_bytes_total.get(),
            workers_retired_total: self.inner.workers_retired_total.get(),
            queue_depth: self.inner.queue_depth.get(),
            active_workers: self.inner.active_workers.get(),
        }
    }
}

fn register_counter(registry: &Registry, name: &'static str, help: &str) -> Result<IntCounter> {
    let counter = IntCounter::with_opts(Opts::new(name, help))
        .map_err(|source| TelemetryError::create(name, source))?;
    registry
        .register(Box::new(counter.clone()))
        .map_err(|source| TelemetryError::register(name, source))?;
    Ok(counter)
}

fn register_gauge(registry: &Registry, name: &'static str, help: &str) -> Result<IntGauge> {
    let gauge = IntGauge::with_opts(Opts::new(name, help))
        .map_err(|source| TelemetryError::create(name, source))?;
    registry
        .register(Box::new(gauge.clone()))
        .map_err(|source| TelemetryError::register(name, source))?;
    Ok(gauge)
}
