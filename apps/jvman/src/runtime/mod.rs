//! Runtime management for the jvman CLI.
//!
//! This module installs Java runtimes and decides which one is active.
//!
//! ## Module Structure
//!
//! - [`paths`] - On-disk layout
//! - [`platform`] - OS and architecture detection
//! - [`download`] - HTTP download with retry and checksum verification
//! - [`archive`] - tar.gz and ZIP extraction, runtime root discovery
//! - [`registry`] - Persisted registry of installed runtimes
//! - [`resolver`] - Marker file, override and global precedence
//! - [`shim`] - Launcher scripts in `<base>/bin`
//! - [`launch`] - Exec or spawn a runtime executable
//! - [`install`] - Download, extract, place and register pipeline

pub mod archive;
pub mod download;
pub mod install;
pub mod launch;
pub mod paths;
pub mod platform;
pub mod registry;
pub mod resolver;
pub mod shim;

pub use download::{Downloader, ProgressCallback, ProgressEvent};
pub use install::{InstallOutcome, Installer, RuntimeRelease};
pub use launch::LaunchBackend;
pub use paths::RuntimePaths;
pub use platform::{Arch, Os, Platform};
#[allow(unused_imports)]
pub use registry::{InstalledRuntime, RegistryDocument};
pub use registry::RegistryStore;
#[allow(unused_imports)]
pub use resolver::ResolutionSource;
pub use resolver::{Resolution, Resolver};
#[allow(unused_imports)]
pub use shim::MANAGED_BINARIES;
pub use shim::ShimManager;
