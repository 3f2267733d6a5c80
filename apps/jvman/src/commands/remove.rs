//! Remove command for the jvman CLI.
//!
//! Deletes a runtime directory and forgets it. A global setting or
//! directory overrides naming it are cleared too. Removing the last
//! runtime also deletes the shims.
//!
//! ## Usage
//!
//! ```bash
//! jvman remove temurin-17
//! ```

use anyhow::Result;
use clap::Args;

use super::{installed_name, open_registry};
use crate::runtime::ShimManager;

/// Arguments for the remove command.
#[derive(Args)]
pub struct RemoveArgs {
    /// Installed version or install name.
    pub version: String,
}

/// Executes the remove command.
///
/// # Errors
///
/// Returns an error if the version is not installed or its directory or the
/// registry cannot be written.
pub fn execute(args: &RemoveArgs) -> Result<()> {
    let (paths, registry) = open_registry()?;
    let name = installed_name(&registry, &args.version)?;

    registry.remove(&name)?;
    println!("Removed {name}");

    if registry.list().is_empty()
        && let Err(e) = ShimManager::new(&paths).remove_shims()
    {
        eprintln!("Warning: failed to remove shims: {e:#}");
    }
    Ok(())
}
