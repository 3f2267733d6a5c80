//! End-to-end installation of a runtime release.
//!
//! ## Steps
//!
//! 1. Return early if the install name is already registered.
//! 2. Download into a private `.tmp-*` directory under `jvms/`.
//! 3. Extract into `extracted/` inside that directory and locate the runtime
//!    root.
//! 4. Rename the runtime root to `jvms/<name>`, replacing any stale directory.
//! 5. Register the runtime, and make it global if no global is set.
//!
//! The temporary directory is removed on every path out of steps 2 to 4.
//! A registration failure after the rename is reported as
//! [`JvmanError::Registration`] and the runtime stays on disk unregistered.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::errors::JvmanError;
use crate::runtime::archive::ArchiveFormat;
use crate::runtime::download::Downloader;
use crate::runtime::paths::RuntimePaths;
use crate::runtime::registry::RegistryStore;

/// A downloadable runtime build, as described by a vendor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeRelease {
    /// Version label the user asked for, e.g. `21`.
    pub version: String,
    /// Vendor-specific full version, e.g. `jdk-21.0.2+13`.
    #[serde(default)]
    pub full_version: String,
    /// Vendor name.
    pub vendor: String,
    /// Archive URL.
    #[serde(default)]
    pub download_url: String,
    /// Hex digest of the archive; empty disables verification.
    #[serde(default)]
    pub checksum: String,
    /// Digest algorithm identifier; empty means SHA-256.
    #[serde(default)]
    pub checksum_type: String,
    /// Archive file name.
    #[serde(default)]
    pub file_name: String,
    /// Target OS in the vendor's vocabulary.
    #[serde(default)]
    pub os: String,
    /// Target architecture in the vendor's vocabulary.
    #[serde(default)]
    pub arch: String,
}

impl RuntimeRelease {
    /// File name to store the archive under, never containing separators.
    fn archive_file_name(&self) -> String {
        let from_url = || {
            self.download_url
                .rsplit('/')
                .next()
                .and_then(|segment| segment.split('?').next())
                .unwrap_or_default()
                .to_string()
        };
        let candidate = if self.file_name.is_empty() {
            from_url()
        } else {
            self.file_name.clone()
        };

        Path::new(&candidate)
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| match ArchiveFormat::host_default() {
                ArchiveFormat::Zip => "jdk.zip".to_string(),
                ArchiveFormat::TarGz => "jdk.tar.gz".to_string(),
            })
    }
}

/// What an install call did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallOutcome {
    /// The name was already registered; nothing was touched.
    AlreadyInstalled {
        /// Install name.
        name: String,
    },
    /// The runtime was downloaded, placed and registered.
    Installed {
        /// Install name.
        name: String,
        /// Final runtime root.
        path: PathBuf,
        /// Whether it became the global default.
        became_global: bool,
    },
}

/// Drives the download, extract, place and register steps.
pub struct Installer<'a> {
    paths: &'a RuntimePaths,
    registry: &'a RegistryStore,
    downloader: Downloader,
}

impl<'a> Installer<'a> {
    /// Creates an installer writing into `paths` and registering in
    /// `registry`.
    #[must_use]
    pub fn new(paths: &'a RuntimePaths, registry: &'a RegistryStore, downloader: Downloader) -> Self {
        Self {
            paths,
            registry,
            downloader,
        }
    }

    /// Installs `release` under `name`.
    ///
    /// # Errors
    ///
    /// Returns an error if any step fails. Failures before registration
    /// leave nothing behind in the runtimes directory; a registration failure
    /// is reported as [`JvmanError::Registration`].
    pub async fn install(&self, name: &str, release: &RuntimeRelease) -> Result<InstallOutcome> {
        if self.registry.is_installed(name) {
            tracing::info!(name, "already installed, skipping");
            return Ok(InstallOutcome::AlreadyInstalled {
                name: name.to_string(),
            });
        }

        self.paths.ensure_directories()?;
        let staging = tempfile::Builder::new()
            .prefix(".tmp-")
            .tempdir_in(&self.paths.jvms)
            .with_context(|| {
                format!("Failed to create staging directory in {}", self.paths.jvms.display())
            })?;
        tracing::debug!(staging = %staging.path().display(), "staging directory created");

        let placed = self.fetch_and_place(name, release, staging.path()).await;
        if let Err(e) = staging.close() {
            tracing::warn!(error = %e, "failed to remove staging directory");
        }
        let path = placed?;

        self.registry
            .add(name, &path, &release.vendor)
            .map_err(|e| JvmanError::registration(name, e))?;

        let became_global = if self.registry.global().is_none() {
            self.registry
                .set_global(name)
                .map_err(|e| JvmanError::registration(name, e))?;
            true
        } else {
            false
        };

        Ok(InstallOutcome::Installed {
            name: name.to_string(),
            path,
            became_global,
        })
    }

    async fn fetch_and_place(
        &self,
        name: &str,
        release: &RuntimeRelease,
        staging: &Path,
    ) -> Result<PathBuf> {
        let file_name = release.archive_file_name();
        let download = self
            .downloader
            .download(
                &release.download_url,
                staging,
                &file_name,
                &release.checksum,
                &release.checksum_type,
            )
            .await
            .context("download failed")?;

        let runtime_root = ArchiveFormat::for_file(&file_name)
            .extract(&download.file_path, &staging.join("extracted"))
            .context("extraction failed")?;
        tracing::debug!(root = %runtime_root.display(), "runtime root located");

        let destination = self.paths.runtime_dir(name);
        if destination.exists() {
            tracing::debug!(path = %destination.display(), "removing stale runtime directory");
            std::fs::remove_dir_all(&destination).with_context(|| {
                format!("Failed to remove directory: {}", destination.display())
            })?;
        }
        std::fs::rename(&runtime_root, &destination).with_context(|| {
            format!(
                "Failed to move {} to {}",
                runtime_root.display(),
                destination.display()
            )
        })?;
        tracing::info!(name, path = %destination.display(), "runtime placed");

        Ok(destination)
    }
}
