//! Subprocess runner built on `tokio::process`.

use std::process::Stdio;

use async_trait::async_trait;
use harrow_core::{CommandOutput, CommandRunner, CommandSpec};
use tokio::process::Command;
use tracing::debug;

use crate::error::RsyncError;

/// Runs commands as child processes, capturing both output streams.
///
/// Children are killed if the awaiting task is dropped.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessRunner;

impl ProcessRunner {
    /// Create a runner.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(&self, command: &CommandSpec) -> anyhow::Result<CommandOutput> {
        debug!(command = %command, "spawning");
        let output = Command::new(command.program())
            .args(command.arguments())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| RsyncError::Spawn {
                program: command.program().to_os_string(),
                source,
            })?;

        Ok(CommandOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}
