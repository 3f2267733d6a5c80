//! List command for the jvman CLI.
//!
//! Shows installed runtimes, then the versions each vendor publishes.
//! Vendor listings are served from the release cache for an hour.
//!
//! ## Usage
//!
//! ```bash
//! jvman list                   # All vendors
//! jvman list --vendor zulu     # One vendor
//! jvman list --refresh         # Refetch vendor listings
//! ```
//!
//! ## Output Format
//!
//! ```text
//! Installed versions:
//! * temurin-21 (temurin)
//!   zulu-17 (zulu) (missing)
//!
//! Available versions (temurin):
//!   21 [installed]
//!   17
//! ```

use anyhow::Result;
use clap::Args;

use crate::runtime::{Platform, RegistryStore, RuntimePaths, RuntimeRelease};
use crate::vendor::{ReleaseCache, Vendor, VendorClient, VendorEndpoints};

/// Arguments for the list command.
#[derive(Args)]
pub struct ListArgs {
    /// Only list available versions from this vendor.
    #[clap(long = "vendor")]
    pub vendor: Option<String>,

    /// Discard cached vendor listings before fetching.
    #[clap(long = "refresh", action = clap::ArgAction::SetTrue)]
    pub refresh: bool,
}

/// Executes the list command.
///
/// Vendor failures are printed under that vendor's heading and do not fail
/// the command.
///
/// # Errors
///
/// Returns an error if the vendor name is unknown or the registry cannot be
/// read.
pub async fn execute(args: &ListArgs) -> Result<()> {
    let vendors = match &args.vendor {
        Some(name) => vec![Vendor::parse(name)?],
        None => Vendor::ALL.to_vec(),
    };

    let paths = RuntimePaths::new()?;
    let registry = RegistryStore::load(&paths.config_file)?;

    print_installed(&registry);

    let platform = Platform::detect()?;
    let client = VendorClient::new(VendorEndpoints::from_env())?;
    let mut cache = ReleaseCache::load(paths.cache_file());
    if args.refresh {
        let cleared = match args.vendor {
            Some(_) => vendors
                .iter()
                .try_for_each(|vendor| cache.clear_vendor(vendor.name())),
            None => cache.clear(),
        };
        if let Err(e) = cleared {
            tracing::warn!(error = %e, "failed to clear release cache");
        }
    }

    for vendor in vendors {
        println!();
        println!("Available versions ({vendor}):");

        let releases = match available(&client, &mut cache, vendor, platform).await {
            Ok(releases) => releases,
            Err(e) => {
                println!("  Error fetching: {e:#}");
                continue;
            }
        };

        for release in releases {
            let status = if registry.is_installed(&vendor.install_name(&release.version)) {
                " [installed]"
            } else {
                ""
            };
            println!("  {}{status}", release.version);
        }
    }

    Ok(())
}

fn print_installed(registry: &RegistryStore) {
    let installed = registry.list();
    let global = registry.global();

    println!("Installed versions:");
    if installed.is_empty() {
        println!("  (none)");
        return;
    }
    for (name, runtime) in &installed {
        println!("{}", installed_line(name, &runtime.vendor, global.as_deref(), runtime.path.exists()));
    }
}

fn installed_line(name: &str, vendor: &str, global: Option<&str>, present: bool) -> String {
    let marker = if global == Some(name) { "* " } else { "  " };
    let missing = if present { "" } else { " (missing)" };
    format!("{marker}{name} ({vendor}){missing}")
}

/// Cached listing for `vendor`, fetched and stored when absent or stale.
async fn available(
    client: &VendorClient,
    cache: &mut ReleaseCache,
    vendor: Vendor,
    platform: Platform,
) -> Result<Vec<RuntimeRelease>> {
    if let Some(cached) = cache.get_versions(vendor.name()) {
        tracing::debug!(%vendor, count = cached.len(), "using cached release listing");
        return Ok(cached);
    }

    let releases = client.list_available(vendor, platform).await?;
    if let Err(e) = cache.set_versions(vendor.name(), releases.clone()) {
        tracing::warn!(%vendor, error = %e, "failed to update release cache");
    }
    Ok(releases)
}
