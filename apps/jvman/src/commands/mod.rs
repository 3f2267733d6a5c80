//! Command modules for the jvman CLI.
//!
//! This module contains all subcommand implementations.
//!
//! ## Runtime Management Commands
//!
//! - [`install`] - Download and register a runtime
//! - [`list`] - Show installed and available runtimes
//! - [`remove`] - Delete an installed runtime
//!
//! ## Selection Commands
//!
//! - [`global`] - Set the global default runtime
//! - [`use_cmd`] - Pin the current directory with a `.jvman` file
//! - [`local`] - Set or clear the registry override for the current directory
//! - [`which`] - Show the runtime in effect here
//! - [`exec`] - Run a command against a specific runtime
//!
//! ## Setup Commands
//!
//! - [`init`] - Create directories and shims
//! - [`version`] - Display version information

pub mod exec;
pub mod global;
pub mod init;
pub mod install;
pub mod list;
pub mod local;
pub mod remove;
pub mod use_cmd;
pub mod version;
pub mod which;

use anyhow::Result;

use crate::errors::JvmanError;
use crate::runtime::{RegistryStore, RuntimePaths};

/// Opens the on-disk layout and its registry.
fn open_registry() -> Result<(RuntimePaths, RegistryStore)> {
    let paths = RuntimePaths::new()?;
    let registry = RegistryStore::load(&paths.config_file)?;
    Ok((paths, registry))
}

/// Maps user input such as `21` or `temurin-21` to a registered name.
fn installed_name(registry: &RegistryStore, query: &str) -> Result<String, JvmanError> {
    registry
        .resolve_name(query)
        .ok_or_else(|| JvmanError::runtime_not_installed(query))
}
