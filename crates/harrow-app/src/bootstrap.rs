//! Process entry: command-line parsing, configuration loading and service wiring.

use std::fmt::Write as _;
use std::future::Future;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use harrow_config::{ConfigLoader, HarrowConfig, LoadedConfig};
use harrow_events::EventBus;
use harrow_fsops::{LocalDisk, scan_matching};
use harrow_rsync::ProcessRunner;
use harrow_telemetry::{
    LogFormat, LoggingConfig, Metrics, ServiceSpan, init_logging, record_app_mode,
};
use tracing::{debug, info, warn};

use crate::cli::{Cli, Command};
use crate::error::{AppError, AppResult};
use crate::observer::PollingObserver;
use crate::orchestrator::{SchedulerDeps, spawn_scheduler};
use crate::settings::RuntimePlan;

/// Everything the service needs to start.
pub(crate) struct BootstrapDependencies {
    plan: RuntimePlan,
    scheduler: SchedulerDeps,
    metrics: Metrics,
}

impl BootstrapDependencies {
    /// Production dependencies: real processes, the local filesystem and a
    /// polling observer.
    pub(crate) fn from_config(config: &HarrowConfig) -> AppResult<Self> {
        let plan = RuntimePlan::from_config(config)?;
        let metrics =
            Metrics::new().map_err(|err| AppError::telemetry("metrics", err))?;
        let scheduler = SchedulerDeps {
            runner: Arc::new(ProcessRunner::new()),
            disk: Arc::new(LocalDisk::new()),
            observer: Arc::new(PollingObserver::new(
                plan.extension.clone(),
                plan.poll_interval,
            )),
            events: EventBus::new(),
            metrics: metrics.clone(),
        };
        Ok(Self {
            plan,
            scheduler,
            metrics,
        })
    }
}

/// Parse the command line and dispatch.
///
/// # Errors
///
/// Returns an error if the configuration cannot be loaded or the selected
/// command fails to start.
pub async fn run_app() -> AppResult<()> {
    let cli = Cli::parse();
    let loader = ConfigLoader::resolve(cli.command.config_args().config.clone())
        .map_err(|err| AppError::config("resolve", err))?;
    let loaded = loader
        .load()
        .await
        .map_err(|err| AppError::config("load", err))?;
    let config = &loaded.config;

    match cli.command {
        Command::Run(_) => run_service(&loaded).await,
        Command::Check(_) => {
            println!("{}", render_check(config)?);
            Ok(())
        }
        Command::Scan(_) => {
            print!(
                "{}",
                render_scan(&config.sources, &config.discovery.extension)?
            );
            Ok(())
        }
    }
}

async fn run_service(loaded: &LoadedConfig) -> AppResult<()> {
    let config = &loaded.config;
    let format = config
        .logging
        .format
        .as_deref()
        .and_then(LogFormat::from_label)
        .unwrap_or_else(LogFormat::infer);
    init_logging(&LoggingConfig {
        level: &config.logging.level,
        format,
        ..LoggingConfig::default()
    })
    .map_err(|err| AppError::telemetry("logging", err))?;
    let _span = ServiceSpan::enter("bootstrap");

    info!("harrow starting");
    loaded.log_summary();
    let dependencies = BootstrapDependencies::from_config(config)?;
    record_app_mode("run");
    run_with(dependencies, tokio::signal::ctrl_c()).await
}

/// Run the scheduler until `shutdown` resolves.
pub(crate) async fn run_with<F>(dependencies: BootstrapDependencies, shutdown: F) -> AppResult<()>
where
    F: Future<Output = io::Result<()>>,
{
    let BootstrapDependencies {
        plan,
        scheduler,
        metrics,
    } = dependencies;
    let handles = spawn_scheduler(&plan, scheduler);

    let signal = shutdown.await;
    info!(
        queued = handles.queue.len(),
        active_workers = handles.active_workers(),
        "shutdown requested"
    );
    handles.shutdown().await;
    match metrics.render() {
        Ok(rendered) => debug!(metrics = %rendered, "final metrics"),
        Err(err) => warn!(error = %err, "failed to render metrics"),
    }
    signal.map_err(|source| AppError::Signal { source })
}

fn render_check(config: &HarrowConfig) -> AppResult<String> {
    // Building the plan catches destinations and transfer options the loader accepts.
    RuntimePlan::from_config(config)?;
    Ok(serde_json::to_string_pretty(config)?)
}

fn render_scan(sources: &[PathBuf], extension: &str) -> AppResult<String> {
    let mut report = String::new();
    for source in sources {
        if !source.is_dir() {
            let _ = writeln!(report, "{}: missing", source.display());
            continue;
        }
        let paths = scan_matching(source, extension).map_err(|err| AppError::Scan {
            root: source.clone(),
            source: err,
        })?;
        let _ = writeln!(report, "{}: {} file(s)", source.display(), paths.len());
        for path in paths {
            let _ = writeln!(report, "  {}", path.display());
        }
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;
    use std::fs;
    use std::time::Duration;

    use harrow_core::{PathObserver, PathStream};

    use crate::testing::{FakeDisk, ScriptedRunner};
    use crate::worker::tests::next_of_kind;

    struct SilentObserver;

    impl PathObserver for SilentObserver {
        fn observe(&self, _root: &std::path::Path) -> PathStream {
            Box::pin(tokio_stream::empty())
        }
    }

    fn config_for(sources: Vec<PathBuf>) -> HarrowConfig {
        HarrowConfig {
            sources,
            destinations: vec!["nas::plots".to_string()],
            ..HarrowConfig::default()
        }
    }

    #[test]
    fn check_renders_effective_configuration() -> Result<(), Box<dyn Error>> {
        let rendered = render_check(&config_for(vec![PathBuf::from("/farm")]))?;
        let value: serde_json::Value = serde_json::from_str(&rendered)?;
        assert_eq!(value["destinations"][0], "nas::plots");
        assert_eq!(value["backoff"]["long_secs"], 1_200);
        Ok(())
    }

    #[test]
    fn check_rejects_unparseable_destinations() {
        let mut config = config_for(Vec::new());
        config.destinations.push("  ".to_string());
        assert!(matches!(render_check(&config), Err(AppError::Destination { .. })));
    }

    #[test]
    fn scan_lists_matches_and_missing_sources() -> Result<(), Box<dyn Error>> {
        let dir = tempfile::tempdir()?;
        fs::write(dir.path().join("a.plot"), b"x")?;
        fs::write(dir.path().join("a.plot.tmp"), b"x")?;
        let missing = dir.path().join("gone");

        let report = render_scan(&[dir.path().to_path_buf(), missing.clone()], ".plot")?;
        assert!(report.contains(&format!("{}: 1 file(s)", dir.path().display())));
        assert!(report.contains(&format!("  {}", dir.path().join("a.plot").display())));
        assert!(report.contains(&format!("{}: missing", missing.display())));
        assert!(!report.contains("a.plot.tmp"));
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn run_with_transfers_until_shutdown() -> Result<(), Box<dyn Error>> {
        let dir = tempfile::tempdir()?;
        fs::write(dir.path().join("a.plot"), b"x")?;
        let plan = RuntimePlan::from_config(&config_for(vec![dir.path().to_path_buf()]))?;
        let metrics = Metrics::new()?;
        let events = EventBus::with_capacity(64);
        let mut stream = events.subscribe(None);
        let runner = Arc::new(ScriptedRunner::new());
        let dependencies = BootstrapDependencies {
            plan,
            scheduler: SchedulerDeps {
                runner: runner.clone(),
                disk: Arc::new(FakeDisk::new(0)),
                observer: Arc::new(SilentObserver),
                events,
                metrics: metrics.clone(),
            },
            metrics: metrics.clone(),
        };

        let shutdown = async move {
            let succeeded = next_of_kind(&mut stream, "transfer_succeeded").await;
            assert!(succeeded.is_some());
            Ok(())
        };
        tokio::time::timeout(Duration::from_secs(60), run_with(dependencies, shutdown)).await??;
        assert_eq!(runner.transfer_calls(), 1);
        assert_eq!(metrics.snapshot().units_enqueued_total, 1);
        Ok(())
    }

    #[tokio::test]
    async fn failed_signal_listener_is_reported() -> Result<(), Box<dyn Error>> {
        let config = config_for(Vec::new());
        let dependencies = BootstrapDependencies::from_config(&config)?;
        let result = run_with(dependencies, async {
            Err(io::Error::other("no signal handler"))
        })
        .await;
        assert!(matches!(result, Err(AppError::Signal { .. })));
        Ok(())
    }
}
