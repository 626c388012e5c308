//! Domain models shared by discovery, reclamation and the destination workers.
//!
//! # Design
//! - Units are identified by path and never cache their size; the generator may
//!   still be growing a file when it is first observed.
//! - Destinations carry no dynamic state. Every space question is asked fresh.

use std::ffi::{OsStr, OsString};
use std::fmt::{self, Display, Formatter};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::service::DiskInspector;

/// One discovered file pending or undergoing movement to a destination.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TransferUnit {
    path: PathBuf,
    source: PathBuf,
}

impl TransferUnit {
    /// Build a unit for `path`; the parent directory becomes the source-volume key.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let source = path
            .parent()
            .map_or_else(|| path.clone(), Path::to_path_buf);
        Self { path, source }
    }

    /// Absolute path of the discovered file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Source-volume key used by the per-source gate.
    #[must_use]
    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Read the current size of the file.
    ///
    /// # Errors
    ///
    /// Returns an error when the file metadata cannot be read, including when
    /// the file has disappeared since discovery.
    pub fn size(&self, disk: &dyn DiskInspector) -> CoreResult<u64> {
        disk.file_size(&self.path)
    }
}

impl Display for TransferUnit {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}", self.path.display())
    }
}

/// Configured transfer target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    /// Directory on a locally mounted filesystem; eligible for space checks.
    Local(PathBuf),
    /// Endpoint understood only by the transfer mechanism (`host::module`, `host:path`, `rsync://`).
    Remote(String),
}

impl Destination {
    /// Interpret a configured destination string.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidDestination`] when the value is blank.
    pub fn parse(value: &str) -> CoreResult<Self> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(CoreError::InvalidDestination {
                value: value.to_string(),
                reason: "empty",
            });
        }
        if is_remote_endpoint(trimmed) {
            return Ok(Self::Remote(trimmed.to_string()));
        }
        Ok(Self::Local(PathBuf::from(trimmed)))
    }

    /// Local directory backing the destination, if it is introspectable.
    #[must_use]
    pub fn local_path(&self) -> Option<&Path> {
        match self {
            Self::Local(path) => Some(path),
            Self::Remote(_) => None,
        }
    }

    /// Argument handed to the transfer mechanism.
    #[must_use]
    pub fn as_arg(&self) -> &OsStr {
        match self {
            Self::Local(path) => path.as_os_str(),
            Self::Remote(endpoint) => OsStr::new(endpoint),
        }
    }
}

impl FromStr for Destination {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Display for Destination {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local(path) => write!(formatter, "{}", path.display()),
            Self::Remote(endpoint) => formatter.write_str(endpoint),
        }
    }
}

fn is_remote_endpoint(value: &str) -> bool {
    if value.starts_with("rsync://") || value.contains("::") {
        return true;
    }
    // rsync treats `host:path` as remote when the colon precedes any slash.
    match (value.find(':'), value.find('/')) {
        (Some(colon), Some(slash)) => colon > 0 && colon < slash,
        (Some(colon), None) => colon > 0,
        (None, _) => false,
    }
}

/// Fully composed external command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    program: OsString,
    args: Vec<OsString>,
}

impl CommandSpec {
    /// Start a command for `program` with no arguments.
    #[must_use]
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Append a single argument.
    #[must_use]
    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append several arguments in order.
    #[must_use]
    pub fn args<I, A>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Executable to launch.
    #[must_use]
    pub fn program(&self) -> &OsStr {
        &self.program
    }

    /// Arguments passed to the executable.
    #[must_use]
    pub fn arguments(&self) -> &[OsString] {
        &self.args
    }

    /// Whether any argument equals `flag`.
    #[must_use]
    pub fn has_arg(&self, flag: &str) -> bool {
        self.args.iter().any(|arg| arg == flag)
    }
}

impl Display for CommandSpec {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.program.to_string_lossy())?;
        for arg in &self.args {
            write!(formatter, " {}", arg.to_string_lossy())?;
        }
        Ok(())
    }
}

/// Outcome categories for a finished transfer process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitClass {
    /// Exit code 0.
    Success,
    /// Socket or network I/O fault (rsync code 10); worth retrying later.
    Network,
    /// File I/O fault (rsync codes 11 and 23); the destination is treated as full.
    FileIo,
    /// Any other non-zero code, or termination by signal.
    Other,
}

impl ExitClass {
    /// Classify a process exit code; `None` means the process was killed by a signal.
    #[must_use]
    pub const fn from_code(code: Option<i32>) -> Self {
        match code {
            Some(0) => Self::Success,
            Some(10) => Self::Network,
            Some(11 | 23) => Self::FileIo,
            _ => Self::Other,
        }
    }

    /// Stable label used in logs, events and metrics.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Network => "network",
            Self::FileIo => "file_io",
            Self::Other => "other",
        }
    }
}

/// Captured result of an external command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, or `None` when terminated by a signal.
    pub code: Option<i32>,
    /// Captured standard output.
    pub stdout: String,
    /// Captured standard error.
    pub stderr: String,
}

impl CommandOutput {
    /// Output of a process that exited with `code` and printed nothing.
    #[must_use]
    pub const fn exited(code: i32) -> Self {
        Self {
            code: Some(code),
            stdout: String::new(),
            stderr: String::new(),
        }
    }

    /// Whether the process exited with code 0.
    #[must_use]
    pub const fn success(&self) -> bool {
        matches!(self.code, Some(0))
    }

    /// Classification of the exit code.
    #[must_use]
    pub const fn class(&self) -> ExitClass {
        ExitClass::from_code(self.code)
    }
}

/// Regular file found directly under a destination directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    /// Absolute path of the file.
    pub path: PathBuf,
    /// Size in bytes.
    pub size: u64,
    /// Last modification time.
    pub modified: SystemTime,
}
