//! Install command for the jvman CLI.
//!
//! Looks up the newest build of a version from a vendor, downloads it,
//! extracts it into `jvms/<vendor>-<version>` and registers it. The first
//! runtime installed becomes the global default.
//!
//! ## Usage
//!
//! ```bash
//! jvman install 21                    # Temurin 21
//! jvman install 17 --vendor corretto  # Corretto 17
//! jvman install 21 --arch aarch64     # Another architecture
//! ```

use anyhow::{Context, Result};
use clap::Args;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::sync::Arc;

use crate::runtime::{
    Arch, Downloader, InstallOutcome, Installer, Platform, ProgressCallback, ProgressEvent,
    RegistryStore, RuntimePaths, ShimManager,
};
use crate::vendor::{ReleaseOptions, Vendor, VendorClient, VendorEndpoints};

/// Arguments for the install command.
#[derive(Args)]
pub struct InstallArgs {
    /// Version to install (e.g., "21", "17", "jdk-21").
    pub version: String,

    /// JDK vendor: temurin, corretto or zulu.
    #[clap(short = 'v', long = "vendor", default_value = "temurin")]
    pub vendor: String,

    /// Target architecture (x64, aarch64, x86). Defaults to the host.
    #[clap(long = "arch")]
    pub arch: Option<String>,
}

/// Executes the install command.
///
/// # Errors
///
/// Returns an error if:
/// - The vendor or architecture is unknown
/// - The vendor has no such version for the platform
/// - Download, checksum verification or extraction fails
/// - The registry cannot be written
pub async fn execute(args: &InstallArgs) -> Result<()> {
    let vendor = Vendor::parse(&args.vendor)?;
    let mut platform = Platform::detect()?;
    if let Some(arch) = &args.arch {
        platform = platform.with_arch(Arch::parse(arch)?);
    }

    let paths = RuntimePaths::new()?;
    let registry = RegistryStore::load(&paths.config_file)?;

    let name = vendor.install_name(&args.version);
    let label = name.strip_prefix(&format!("{vendor}-")).unwrap_or(&name).to_string();
    if let Some((existing, _)) = registry.find_by_version(&label, vendor.name()) {
        println!("Java {} ({existing}) is already installed", args.version);
        return Ok(());
    }

    println!("Fetching release info for Java {} from {vendor}...", args.version);
    let client = VendorClient::new(VendorEndpoints::from_env())?;
    let release = client
        .get_release(vendor, &args.version, &ReleaseOptions { platform })
        .await
        .context("failed to get release info")?;

    println!("Found: {}", release.full_version);
    println!("Downloading from {}...", release.download_url);

    let downloader = Downloader::new()?.with_progress(progress_reporter());
    let installer = Installer::new(&paths, &registry, downloader);

    match installer.install(&name, &release).await? {
        InstallOutcome::AlreadyInstalled { name } => {
            println!("Java {} ({name}) is already installed", args.version);
        }
        InstallOutcome::Installed {
            name,
            became_global,
            ..
        } => {
            if let Err(e) = ShimManager::new(&paths).create_shims() {
                eprintln!("Warning: failed to create shims: {e:#}");
            }
            println!("Successfully installed Java {} as {name}", args.version);
            if became_global {
                println!("Set {name} as global default");
            }
        }
    }

    Ok(())
}

/// Renders download progress on stderr.
///
/// Draws a byte bar when the size is known and a spinner otherwise. A retry
/// starts a fresh bar.
fn progress_reporter() -> ProgressCallback {
    let bar = ProgressBar::hidden();
    Arc::new(move |event| match event {
        ProgressEvent::Started { total } => {
            bar.reset();
            match total {
                Some(total) => {
                    bar.set_length(total);
                    bar.set_style(
                        ProgressStyle::with_template(
                            "{bar:40.cyan/blue} {bytes}/{total_bytes} ({bytes_per_sec}, {eta})",
                        )
                        .unwrap_or_else(|_| ProgressStyle::default_bar()),
                    );
                }
                None => bar.set_style(
                    ProgressStyle::with_template("{spinner} {bytes} ({bytes_per_sec})")
                        .unwrap_or_else(|_| ProgressStyle::default_spinner()),
                ),
            }
            bar.set_draw_target(ProgressDrawTarget::stderr());
        }
        ProgressEvent::Progress { downloaded } => bar.set_position(downloaded),
        ProgressEvent::Completed => bar.finish_and_clear(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_reporter_accepts_full_event_sequence() {
        let report = progress_reporter();
        report(ProgressEvent::Started { total: Some(10) });
        report(ProgressEvent::Progress { downloaded: 4 });
        report(ProgressEvent::Started { total: None });
        report(ProgressEvent::Progress { downloaded: 10 });
        report(ProgressEvent::Completed);
    }
}
