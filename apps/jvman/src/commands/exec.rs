//! Exec command for the jvman CLI.
//!
//! Runs a command against a chosen runtime without changing any setting:
//! `JAVA_HOME` points at the runtime and its `bin` directory is put first on
//! `PATH`, so build tools started this way pick it up as well.
//!
//! ## Usage
//!
//! ```bash
//! jvman exec 21 java -version
//! jvman exec temurin-17 javac Main.java
//! jvman exec corretto-11 mvn clean install
//! ```
//!
//! The command is looked up in the runtime's `bin` directory first and on
//! `PATH` otherwise.

use anyhow::{Context, Result, bail};
use clap::Args;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;

use super::{installed_name, open_registry};
use crate::runtime::{LaunchBackend, RuntimePaths};

/// Arguments for the exec command.
#[derive(Args)]
pub struct ExecArgs {
    /// Installed version or install name.
    pub version: String,

    /// Program to run.
    pub command: String,

    /// Arguments passed to the program unchanged.
    #[clap(trailing_var_arg = true, allow_hyphen_values = true)]
    pub args: Vec<String>,
}

/// Executes the exec command.
///
/// On Unix the jvman process is replaced by the program. Elsewhere the
/// program's exit code becomes jvman's.
///
/// # Errors
///
/// Returns an error if the version is not installed, its directory is
/// missing, the program cannot be found or started, or it exits with a
/// non-zero code.
pub fn execute(args: &ExecArgs) -> Result<()> {
    let (_, registry) = open_registry()?;
    let name = installed_name(&registry, &args.version)?;
    let runtime = registry.get(&name)?;

    let mut command = build_command(&runtime.path, &args.command, &args.args)?;
    tracing::info!(runtime = %name, program = ?command.get_program(), "executing");
    LaunchBackend::host().launch(&mut command)
}

/// Prepares `program` to run with `runtime` as `JAVA_HOME`.
fn build_command(runtime: &Path, program: &str, args: &[String]) -> Result<Command> {
    let bin_dir = RuntimePaths::runtime_bin_dir(runtime);
    let binary = locate_binary(&bin_dir, program)?;

    let mut command = Command::new(binary);
    command
        .args(args)
        .env("JAVA_HOME", runtime)
        .env("PATH", prepend_path(&bin_dir)?);
    Ok(command)
}

fn locate_binary(bin_dir: &Path, program: &str) -> Result<PathBuf> {
    let candidates = [
        bin_dir.join(program),
        bin_dir.join(format!("{program}{}", std::env::consts::EXE_SUFFIX)),
    ];
    if let Some(found) = candidates.into_iter().find(|path| path.is_file()) {
        return Ok(found);
    }
    match which::which(program) {
        Ok(found) => Ok(found),
        Err(_) => bail!("command not found: {program}"),
    }
}

/// The current `PATH` with `dir` in front.
fn prepend_path(dir: &Path) -> Result<OsString> {
    let mut entries = vec![dir.to_path_buf()];
    if let Some(current) = std::env::var_os("PATH") {
        entries.extend(std::env::split_paths(&current));
    }
    std::env::join_paths(entries).context("Failed to build PATH")
}
