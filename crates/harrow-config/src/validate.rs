//! Validation helpers for configuration documents.

use crate::error::{ConfigError, ConfigResult};
use crate::model::HarrowConfig;

const LOG_FORMATS: [&str; 3] = ["pretty", "text", "json"];

/// Check a parsed document for values the scheduler cannot run with.
///
/// # Errors
///
/// Returns [`ConfigError::Rejected`] naming the first offending field.
pub fn validate_config(config: &HarrowConfig) -> ConfigResult<()> {
    if config.destinations.is_empty() {
        return Err(ConfigError::rejected(
            "root",
            "destinations",
            None,
            "at least one destination is required",
        ));
    }
    if let Some(blank) = config
        .destinations
        .iter()
        .find(|destination| destination.trim().is_empty())
    {
        return Err(ConfigError::rejected(
            "root",
            "destinations",
            Some(blank.clone()),
            "destination must not be blank",
        ));
    }
    if config.transfer.binary.trim().is_empty() {
        return Err(ConfigError::rejected(
            "transfer",
            "binary",
            None,
            "binary must not be empty",
        ));
    }
    validate_extension(&config.discovery.extension)?;
    if config.discovery.poll_interval_secs == 0 {
        return Err(ConfigError::rejected(
            "discovery",
            "poll_interval_secs",
            Some("0".to_string()),
            "poll interval must be positive",
        ));
    }
    if config.reclamation.headroom_multiplier < 1 {
        return Err(ConfigError::rejected(
            "reclamation",
            "headroom_multiplier",
            Some(config.reclamation.headroom_multiplier.to_string()),
            "headroom multiplier must be at least 1",
        ));
    }
    if let Some(format) = config.logging.format.as_deref() {
        validate_log_format(format)?;
    }
    Ok(())
}

fn validate_extension(extension: &str) -> ConfigResult<()> {
    if extension.len() < 2 || !extension.starts_with('.') {
        return Err(ConfigError::rejected(
            "discovery",
            "extension",
            Some(extension.to_string()),
            "extension must start with '.' and name a suffix",
        ));
    }
    Ok(())
}

fn validate_log_format(format: &str) -> ConfigResult<()> {
    let normalised = format.trim().to_ascii_lowercase();
    if LOG_FORMATS.contains(&normalised.as_str()) {
        Ok(())
    } else {
        Err(ConfigError::rejected(
            "logging",
            "format",
            Some(format.to_string()),
            "format must be 'pretty' or 'json'",
        ))
    }
}
