//! Local command for the jvman CLI.
//!
//! Records a directory override in the registry for the current directory.
//! Unlike a `.jvman` marker it leaves the directory untouched and applies to
//! that exact directory only. `jvman which` honours it; the shims do not.
//!
//! ## Usage
//!
//! ```bash
//! jvman local 21         # Pin the current directory
//! jvman local --unset    # Drop the pin
//! jvman local --list     # Show every pinned directory
//! ```

use anyhow::{Context, Result, bail};
use clap::Args;

use super::{installed_name, open_registry};

/// Arguments for the local command.
#[derive(Args)]
pub struct LocalArgs {
    /// Installed version or install name.
    #[clap(required_unless_present_any = ["unset", "list"], conflicts_with_all = ["unset", "list"])]
    pub version: Option<String>,

    /// Remove the override for the current directory.
    #[clap(long = "unset", action = clap::ArgAction::SetTrue, conflicts_with = "list")]
    pub unset: bool,

    /// List every directory override.
    #[clap(long = "list", action = clap::ArgAction::SetTrue)]
    pub list: bool,
}

/// Executes the local command.
///
/// # Errors
///
/// Returns an error if the version is not installed or the registry cannot
/// be saved.
pub fn execute(args: &LocalArgs) -> Result<()> {
    let (_, registry) = open_registry()?;

    if args.list {
        let overrides = registry.local_overrides();
        if overrides.is_empty() {
            println!("No local overrides set");
        }
        for (dir, name) in overrides {
            println!("{dir} -> {name}");
        }
        return Ok(());
    }

    let cwd = std::env::current_dir().context("Failed to get current directory")?;

    if args.unset {
        if registry.remove_local_override(&cwd)? {
            println!("Removed local override for {}", cwd.display());
        } else {
            println!("No local override set for {}", cwd.display());
        }
        return Ok(());
    }

    let Some(version) = &args.version else {
        bail!("a version is required unless --unset is given");
    };
    let name = installed_name(&registry, version)?;
    registry.set_local_override(&cwd, &name)?;

    println!("Local Java version for {} set to {name}", cwd.display());
    Ok(())
}
