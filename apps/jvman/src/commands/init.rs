//! Init command for the jvman CLI.
//!
//! Creates the base layout, writes the registry and the shims, and prints the
//! line to add to a shell profile. Safe to run repeatedly.

use anyhow::{Context, Result};

use super::open_registry;
use crate::runtime::ShimManager;

/// Executes the init command.
///
/// # Errors
///
/// Returns an error if the directories, the registry or the shims cannot be
/// written.
pub fn execute() -> Result<()> {
    let (paths, registry) = open_registry()?;

    paths
        .ensure_directories()
        .context("failed to create directories")?;
    registry.save().context("failed to save config")?;
    ShimManager::new(&paths)
        .create_shims()
        .context("failed to create shims")?;

    println!("jvman initialized successfully!");
    println!();
    if cfg!(windows) {
        println!("Add the following directory to your PATH environment variable:");
        println!("  {}", paths.bin.display());
    } else {
        println!("Add the following to your shell profile:");
        println!("  export PATH=\"{}:$PATH\"", paths.bin.display());
    }
    Ok(())
}
