//! Use command for the jvman CLI.
//!
//! Writes a `.jvman` marker file into the current directory. The marker
//! applies to the directory and everything below it, and can be committed
//! with a project.
//!
//! ## Usage
//!
//! ```bash
//! jvman use 17
//! ```

use anyhow::{Context, Result};
use clap::Args;
use std::path::{Path, PathBuf};

use super::{installed_name, open_registry};
use crate::runtime::RuntimePaths;

/// Arguments for the use command.
#[derive(Args)]
pub struct UseArgs {
    /// Installed version or install name.
    pub version: String,
}

/// Executes the use command.
///
/// # Errors
///
/// Returns an error if the version is not installed or the marker file
/// cannot be written.
pub fn execute(args: &UseArgs) -> Result<()> {
    let (_, registry) = open_registry()?;
    let name = installed_name(&registry, &args.version)?;

    let cwd = std::env::current_dir().context("Failed to get current directory")?;
    write_marker(&cwd, &name)?;

    println!("Created .jvman file with version {name}");
    Ok(())
}

/// Writes `name` followed by a newline to the marker file in `dir`.
fn write_marker(dir: &Path, name: &str) -> Result<PathBuf> {
    let marker = dir.join(RuntimePaths::marker_file_name());
    std::fs::write(&marker, format!("{name}\n"))
        .with_context(|| format!("Failed to write {}", marker.display()))?;
    tracing::debug!(marker = %marker.display(), name, "marker file written");
    Ok(marker)
}
