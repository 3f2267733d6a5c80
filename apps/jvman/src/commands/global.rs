//! Global command for the jvman CLI.
//!
//! Sets the runtime used wherever no marker file or directory override
//! applies, and rewrites the shims.
//!
//! ## Usage
//!
//! ```bash
//! jvman global 21            # Resolves to temurin-21 if installed
//! jvman global zulu-17
//! ```

use anyhow::Result;
use clap::Args;

use super::{installed_name, open_registry};
use crate::runtime::ShimManager;

/// Arguments for the global command.
#[derive(Args)]
pub struct GlobalArgs {
    /// Installed version or install name.
    pub version: String,
}

/// Executes the global command.
///
/// A shim failure is reported as a warning; the global setting is kept.
///
/// # Errors
///
/// Returns an error if the version is not installed, its directory is
/// missing, or the registry cannot be saved.
pub fn execute(args: &GlobalArgs) -> Result<()> {
    let (paths, registry) = open_registry()?;
    let name = installed_name(&registry, &args.version)?;

    registry.set_global(&name)?;

    if let Err(e) = ShimManager::new(&paths).create_shims() {
        eprintln!("Warning: failed to update shims: {e:#}");
    }

    println!("Global Java version set to {name}");
    Ok(())
}
