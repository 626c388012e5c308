//! Configuration document loading with environment overrides.
//!
//! # Design
//! - The path comes from the command line or `HARROW_CONFIG`.
//! - Overrides apply after parsing and before validation so an override can
//!   never smuggle in an invalid value.
//! - Environment access is injectable for tests.
//! - Loading happens before logging is installed, so the loader reports what
//!   it did through [`LoadedConfig`] instead of logging directly.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::info;

use crate::error::{ConfigError, ConfigResult};
use crate::model::HarrowConfig;
use crate::validate::validate_config;

/// Environment variable holding the configuration path.
pub const CONFIG_PATH_ENV: &str = "HARROW_CONFIG";
const LOG_LEVEL_ENV: &str = "HARROW_LOG_LEVEL";
const LOG_FORMAT_ENV: &str = "HARROW_LOG_FORMAT";
const BWLIMIT_ENV: &str = "HARROW_BWLIMIT";

/// Environment variable lookup.
pub type EnvLookup = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// An environment variable that replaced a document value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedOverride {
    /// Variable name, e.g. `HARROW_BWLIMIT`.
    pub variable: &'static str,
    /// Raw value read from the environment.
    pub value: String,
}

/// A validated configuration together with how it was produced.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    /// Effective configuration.
    pub config: HarrowConfig,
    /// Document the configuration was read from.
    pub path: PathBuf,
    /// Overrides applied after parsing, in application order.
    pub overrides: Vec<AppliedOverride>,
}

impl LoadedConfig {
    /// Emit the load summary; call once a subscriber is installed.
    pub fn log_summary(&self) {
        for applied in &self.overrides {
            info!(variable = applied.variable, value = %applied.value, "applied override");
        }
        info!(
            path = %self.path.display(),
            sources = self.config.sources.len(),
            destinations = self.config.destinations.len(),
            overrides = self.overrides.len(),
            "configuration loaded"
        );
    }
}

/// Reads, overrides and validates a configuration document.
#[derive(Clone)]
pub struct ConfigLoader {
    path: PathBuf,
    env: EnvLookup,
}

impl ConfigLoader {
    /// Loader for an explicit path using the process environment.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            env: process_env(),
        }
    }

    /// Resolve the path from the command line, falling back to `HARROW_CONFIG`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NoPath`] when neither source provides one.
    pub fn resolve(cli_path: Option<PathBuf>) -> ConfigResult<Self> {
        Self::resolve_with_env(cli_path, process_env())
    }

    /// [`ConfigLoader::resolve`] with an injected environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NoPath`] when neither source provides one.
    pub fn resolve_with_env(cli_path: Option<PathBuf>, env: EnvLookup) -> ConfigResult<Self> {
        let path = cli_path
            .or_else(|| {
                env(CONFIG_PATH_ENV)
                    .filter(|value| !value.is_empty())
                    .map(PathBuf::from)
            })
            .ok_or(ConfigError::NoPath {
                env_var: CONFIG_PATH_ENV,
            })?;
        Ok(Self { path, env })
    }

    /// Replace the environment lookup.
    #[must_use]
    pub fn with_env(mut self, env: EnvLookup) -> Self {
        self.env = env;
        self
    }

    /// Location of the document.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the document, apply overrides and validate.
    ///
    /// # Errors
    ///
    /// Returns an error when the file cannot be read, is not valid YAML for the
    /// model, or fails validation.
    pub async fn load(&self) -> ConfigResult<LoadedConfig> {
        let document = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| ConfigError::Unreadable {
                path: self.path.clone(),
                source,
            })?;
        let mut config: HarrowConfig =
            serde_yaml::from_str(&document).map_err(|source| ConfigError::Syntax {
                path: Some(self.path.clone()),
                source,
            })?;
        let overrides = apply_env_overrides(&mut config, self.env.as_ref());
        validate_config(&config)?;
        Ok(LoadedConfig {
            config,
            path: self.path.clone(),
            overrides,
        })
    }
}

/// Parse and validate an in-memory document without environment overrides.
///
/// # Errors
///
/// Returns an error when the document does not deserialise or fails validation.
pub fn parse_document(document: &str) -> ConfigResult<HarrowConfig> {
    let config: HarrowConfig = serde_yaml::from_str(document)
        .map_err(|source| ConfigError::Syntax { path: None, source })?;
    validate_config(&config)?;
    Ok(config)
}

fn apply_env_overrides(
    config: &mut HarrowConfig,
    env: &(dyn Fn(&str) -> Option<String> + Send + Sync),
) -> Vec<AppliedOverride> {
    let mut applied = Vec::new();
    let mut record = |variable: &'static str, value: &str| {
        applied.push(AppliedOverride {
            variable,
            value: value.to_string(),
        });
    };
    if let Some(level) = env(LOG_LEVEL_ENV).filter(|value| !value.trim().is_empty()) {
        record(LOG_LEVEL_ENV, &level);
        config.logging.level = level;
    }
    if let Some(format) = env(LOG_FORMAT_ENV).filter(|value| !value.trim().is_empty()) {
        record(LOG_FORMAT_ENV, &format);
        config.logging.format = Some(format);
    }
    if let Some(limit) = env(BWLIMIT_ENV) {
        record(BWLIMIT_ENV, &limit);
        let limit = limit.trim();
        config.transfer.bandwidth_limit = if limit.is_empty() {
            None
        } else {
            Some(limit.to_string())
        };
    }
    applied
}

fn process_env() -> EnvLookup {
    Arc::new(|name| std::env::var(name).ok())
}
