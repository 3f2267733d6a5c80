//! Handing control to a runtime executable.
//!
//! Where the platform allows it the current process image is replaced, so
//! signals and the exit status belong to the launched program directly.
//! Elsewhere the program runs as a child with inherited stdio and its exit
//! code is propagated as [`JvmanError::ProcessExitCode`].

use anyhow::{Context, Result};
use std::process::{Command, ExitStatus};

use crate::errors::JvmanError;

/// How a command is started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchBackend {
    /// Replace the current process (`execvp`). Falls back to
    /// [`LaunchBackend::Spawn`] if the exec call fails.
    Replace,
    /// Run a child process, wait for it and propagate its exit code.
    Spawn,
}

impl LaunchBackend {
    /// The preferred backend for the host platform.
    #[must_use]
    pub fn host() -> Self {
        if cfg!(unix) { Self::Replace } else { Self::Spawn }
    }

    /// Runs `command`.
    ///
    /// Returns `Ok(())` only when the program was spawned and exited
    /// successfully; with [`LaunchBackend::Replace`] a successful launch
    /// never returns.
    ///
    /// # Errors
    ///
    /// Returns an error if the program cannot be started, or
    /// [`JvmanError::ProcessExitCode`] if it exits unsuccessfully.
    pub fn launch(self, command: &mut Command) -> Result<()> {
        if self == Self::Replace {
            replace(command);
        }
        spawn(command)
    }
}

#[cfg(unix)]
fn replace(command: &mut Command) {
    use std::os::unix::process::CommandExt;

    tracing::debug!(program = ?command.get_program(), "replacing process");
    let err = command.exec();
    tracing::warn!(
        program = ?command.get_program(),
        error = %err,
        "exec failed, running as a child process instead"
    );
}

#[cfg(not(unix))]
fn replace(_command: &mut Command) {}

fn spawn(command: &mut Command) -> Result<()> {
    tracing::debug!(program = ?command.get_program(), "spawning process");
    let status = command
        .status()
        .with_context(|| format!("Failed to execute {}", command.get_program().to_string_lossy()))?;

    if status.success() {
        Ok(())
    } else {
        Err(JvmanError::process_exit_code(exit_code(status)).into())
    }
}

#[cfg(unix)]
fn exit_code(status: ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    status
        .code()
        .or_else(|| status.signal().map(|signal| 128 + signal))
        .unwrap_or(1)
}

#[cfg(not(unix))]
fn exit_code(status: ExitStatus) -> i32 {
    status.code().unwrap_or(1)
}
