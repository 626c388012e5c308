//! Translation of the configuration document into a runtime plan.
//!
//! # Design
//! - Parse destinations and transfer options once at startup so workers only
//!   handle typed values.
//! - Destination order is shuffled here, once, when requested.

use std::path::PathBuf;
use std::time::Duration;

use harrow_config::{BackoffConfig, GateConfig, HarrowConfig, ReclamationConfig};
use harrow_core::Destination;
use harrow_rsync::RsyncOptions;
use rand::Rng;
use rand::seq::SliceRandom;

use crate::error::AppResult;

/// Immutable settings the scheduler runs with.
#[derive(Debug, Clone)]
pub struct RuntimePlan {
    /// Source directories to scan and observe.
    pub sources: Vec<PathBuf>,
    /// Destinations in worker start order.
    pub destinations: Vec<Destination>,
    /// Transfer concurrency policies.
    pub gates: GateConfig,
    /// Space reclamation policy for local destinations.
    pub reclamation: ReclamationConfig,
    /// Pauses after failed transfers.
    pub backoff: BackoffConfig,
    /// Extension of files to transfer.
    pub extension: String,
    /// Interval between source rescans.
    pub poll_interval: Duration,
    /// Interval between status lines, when enabled.
    pub status_interval: Option<Duration>,
    /// Transfer command settings.
    pub rsync: RsyncOptions,
}

impl RuntimePlan {
    /// Build a plan, shuffling destinations with the thread-local generator.
    ///
    /// # Errors
    ///
    /// Returns an error when a destination or the transfer settings are invalid.
    pub fn from_config(config: &HarrowConfig) -> AppResult<Self> {
        Self::from_config_with_rng(config, &mut rand::rng())
    }

    /// Build a plan using `rng` for the optional destination shuffle.
    ///
    /// # Errors
    ///
    /// Returns an error when a destination or the transfer settings are invalid.
    pub fn from_config_with_rng<R: Rng + ?Sized>(
        config: &HarrowConfig,
        rng: &mut R,
    ) -> AppResult<Self> {
        let mut destinations = config
            .destinations
            .iter()
            .map(|value| Destination::parse(value))
            .collect::<Result<Vec<_>, _>>()?;
        if config.shuffle_destinations {
            destinations.shuffle(rng);
        }

        let rsync = RsyncOptions::try_from(&config.transfer)?;

        let status_interval = (config.logging.status_interval_secs > 0)
            .then(|| Duration::from_secs(config.logging.status_interval_secs));

        Ok(Self {
            sources: config.sources.clone(),
            destinations,
            gates: config.gates,
            reclamation: config.reclamation,
            backoff: config.backoff,
            extension: config.discovery.extension.clone(),
            poll_interval: config.discovery.poll_interval(),
            status_interval,
            rsync,
        })
    }
}
