//! Composition of the probe and transfer commands.
//!
//! # Design
//! - The transfer command is `[ionice <args>] rsync --remove-source-files
//!   --whole-file (--bwlimit=<cap> | --progress) [extra flags] <source> <dest>`.
//! - The probe copies a small reference file with the bare binary and no
//!   priority wrapper.

use std::ffi::OsString;
use std::path::PathBuf;

use harrow_config::TransferConfig;
use harrow_core::{CommandSpec, Destination, TransferUnit};

use crate::error::{RsyncError, RsyncResult};

const REMOVE_SOURCE_FILES: &str = "--remove-source-files";
const WHOLE_FILE: &str = "--whole-file";
const PROGRESS: &str = "--progress";

/// I/O scheduling wrapper placed in front of the transfer binary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IoPriority {
    /// Wrapper executable.
    pub binary: OsString,
    /// Arguments placed between the wrapper and the transfer binary.
    pub args: Vec<String>,
}

/// Settings used to compose commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RsyncOptions {
    /// Transfer binary.
    pub binary: OsString,
    /// Bandwidth cap forwarded as `--bwlimit=`.
    pub bandwidth_limit: Option<String>,
    /// Optional priority wrapper for real transfers.
    pub io_priority: Option<IoPriority>,
    /// Reference file copied by the probe.
    pub probe_file: PathBuf,
    /// Flags appended after the fixed ones.
    pub extra_flags: Vec<String>,
}

impl TryFrom<&TransferConfig> for RsyncOptions {
    type Error = RsyncError;

    fn try_from(config: &TransferConfig) -> RsyncResult<Self> {
        let binary = config.binary.trim();
        if binary.is_empty() {
            return Err(RsyncError::InvalidOption {
                field: "binary",
                reason: "binary must not be empty",
            });
        }
        let args = config.io_priority_args();
        let io_priority = if args.is_empty() {
            None
        } else {
            Some(IoPriority {
                binary: OsString::from(&config.ionice_binary),
                args,
            })
        };
        Ok(Self {
            binary: OsString::from(binary),
            bandwidth_limit: config
                .bandwidth_limit
                .as_deref()
                .map(str::trim)
                .filter(|limit| !limit.is_empty())
                .map(str::to_string),
            io_priority,
            probe_file: config.probe_file.clone(),
            extra_flags: config.extra_flags.clone(),
        })
    }
}

/// Builds [`CommandSpec`]s for one configured transfer mechanism.
#[derive(Debug, Clone)]
pub struct RsyncCommandBuilder {
    options: RsyncOptions,
}

impl RsyncCommandBuilder {
    /// Wrap the given options.
    #[must_use]
    pub const fn new(options: RsyncOptions) -> Self {
        Self { options }
    }

    /// Options in use.
    #[must_use]
    pub const fn options(&self) -> &RsyncOptions {
        &self.options
    }

    /// Reachability probe: copy the reference file to `destination`.
    #[must_use]
    pub fn probe(&self, destination: &Destination) -> CommandSpec {
        CommandSpec::new(self.options.binary.clone())
            .arg(self.options.probe_file.as_os_str())
            .arg(destination.as_arg())
    }

    /// Real transfer of `unit` to `destination`, removing the source on success.
    #[must_use]
    pub fn transfer(&self, unit: &TransferUnit, destination: &Destination) -> CommandSpec {
        let options = &self.options;
        let command = match &options.io_priority {
            Some(priority) => CommandSpec::new(priority.binary.clone())
                .args(priority.args.iter().map(String::as_str))
                .arg(options.binary.clone()),
            None => CommandSpec::new(options.binary.clone()),
        };
        let rate = match &options.bandwidth_limit {
            Some(limit) => format!("--bwlimit={limit}"),
            None => PROGRESS.to_string(),
        };
        command
            .arg(REMOVE_SOURCE_FILES)
            .arg(WHOLE_FILE)
            .arg(rate)
            .args(options.extra_flags.iter().map(String::as_str))
            .arg(unit.path().as_os_str())
            .arg(destination.as_arg())
    }
}
