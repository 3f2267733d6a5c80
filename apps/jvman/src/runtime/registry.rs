//! The persisted registry of installed runtimes.
//!
//! `config.json` holds the global default, the per-directory overrides and
//! every installed runtime. A [`RegistryStore`] is loaded once per process
//! and handed by reference to whatever needs it.
//!
//! Mutations are read-modify-write on a copy of the document: the copy is
//! persisted first and only then published in memory, so a failed write
//! leaves memory and disk agreeing. The lock is in-process only; two
//! concurrent `jvman` processes can still overwrite each other's changes.

use anyhow::{Context, Result};
use parking_lot::RwLock;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::errors::JvmanError;
use crate::runtime::paths::RuntimePaths;
use crate::vendor::Vendor;

/// One installed runtime.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstalledRuntime {
    /// Runtime root on disk.
    pub path: PathBuf,
    /// Vendor name, e.g. `temurin`.
    pub vendor: String,
}

/// The root document persisted as `config.json`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryDocument {
    /// Install name of the global default, empty when unset.
    #[serde(default, deserialize_with = "null_as_default")]
    pub global: String,
    /// Absolute directory path to install name.
    #[serde(default, deserialize_with = "null_as_default")]
    pub local_overrides: BTreeMap<String, String>,
    /// Install name to runtime.
    #[serde(default, deserialize_with = "null_as_default")]
    pub installed: BTreeMap<String, InstalledRuntime>,
}

impl RegistryDocument {
    /// Returns the runtime registered under `name`.
    #[must_use]
    pub fn runtime(&self, name: &str) -> Option<&InstalledRuntime> {
        self.installed.get(name)
    }

    /// Returns whether `name` is registered.
    #[must_use]
    pub fn is_installed(&self, name: &str) -> bool {
        self.installed.contains_key(name)
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Process-wide handle on the registry document and its backing file.
#[derive(Debug)]
pub struct RegistryStore {
    path: PathBuf,
    document: RwLock<RegistryDocument>,
}

impl RegistryStore {
    /// Loads the document from `path`, starting empty if the file is absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let document = if path.is_file() {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read registry: {}", path.display()))?;
            if content.trim().is_empty() {
                RegistryDocument::default()
            } else {
                serde_json::from_str(&content)
                    .with_context(|| format!("Failed to parse registry: {}", path.display()))?
            }
        } else {
            RegistryDocument::default()
        };

        tracing::debug!(
            path = %path.display(),
            installed = document.installed.len(),
            "registry loaded"
        );
        Ok(Self {
            path,
            document: RwLock::new(document),
        })
    }

    /// Location of the backing file.
    #[allow(dead_code)]
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes the current document to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the file or its parent directory cannot be written.
    pub fn save(&self) -> Result<()> {
        let document = self.document.read();
        self.persist(&document)
    }

    fn persist(&self, document: &RegistryDocument) -> Result<()> {
        let parent = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;

        let json = serde_json::to_string_pretty(document).context("Failed to serialize registry")?;
        let mut staged = tempfile::NamedTempFile::new_in(parent)
            .with_context(|| format!("Failed to stage registry in {}", parent.display()))?;
        staged
            .write_all(json.as_bytes())
            .context("Failed to write registry")?;
        staged
            .persist(&self.path)
            .with_context(|| format!("Failed to save registry: {}", self.path.display()))?;

        tracing::debug!(path = %self.path.display(), "registry saved");
        Ok(())
    }

    /// Applies `change` to a copy of the document, persists the copy, then
    /// publishes it.
    fn mutate<T>(&self, change: impl FnOnce(&mut RegistryDocument) -> Result<T>) -> Result<T> {
        let mut document = self.document.write();
        let mut next = document.clone();
        let outcome = change(&mut next)?;
        self.persist(&next)?;
        *document = next;
        Ok(outcome)
    }

    /// Registers or replaces a runtime.
    ///
    /// # Errors
    ///
    /// Returns an error if the registry cannot be saved.
    pub fn add(&self, name: &str, path: &Path, vendor: &str) -> Result<()> {
        self.mutate(|doc| {
            doc.installed.insert(
                name.to_string(),
                InstalledRuntime {
                    path: path.to_path_buf(),
                    vendor: vendor.to_string(),
                },
            );
            Ok(())
        })?;
        tracing::info!(name, path = %path.display(), vendor, "runtime registered");
        Ok(())
    }

    /// Deletes a runtime from disk and from the registry.
    ///
    /// The directory is removed first; the entry, the global default and any
    /// overrides naming it are dropped only once that succeeds. A directory
    /// that is already gone is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`JvmanError::RuntimeNotInstalled`] for unknown names, or an
    /// error if the directory or the registry cannot be written.
    pub fn remove(&self, name: &str) -> Result<()> {
        self.mutate(|doc| {
            let runtime = doc
                .installed
                .get(name)
                .ok_or_else(|| JvmanError::runtime_not_installed(name))?;

            match std::fs::remove_dir_all(&runtime.path) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    tracing::debug!(name, path = %runtime.path.display(), "runtime directory already gone");
                }
                Err(e) => {
                    return Err(e).with_context(|| {
                        format!("Failed to remove directory: {}", runtime.path.display())
                    });
                }
            }

            doc.installed.remove(name);
            if doc.global == name {
                doc.global.clear();
            }
            doc.local_overrides.retain(|_, value| value != name);
            Ok(())
        })?;
        tracing::info!(name, "runtime removed");
        Ok(())
    }

    /// Returns a runtime that is registered and still present on disk.
    ///
    /// # Errors
    ///
    /// Returns [`JvmanError::RuntimeNotInstalled`] if the name is unknown and
    /// [`JvmanError::RuntimePathMissing`] if its directory is gone.
    pub fn get(&self, name: &str) -> Result<InstalledRuntime, JvmanError> {
        let document = self.document.read();
        let runtime = document
            .installed
            .get(name)
            .ok_or_else(|| JvmanError::runtime_not_installed(name))?;
        if !runtime.path.exists() {
            return Err(JvmanError::runtime_path_missing(name, runtime.path.clone()));
        }
        Ok(runtime.clone())
    }

    /// Returns every registered runtime, stale ones included.
    #[must_use]
    pub fn list(&self) -> BTreeMap<String, InstalledRuntime> {
        self.document.read().installed.clone()
    }

    /// Returns whether `name` is registered, without touching the filesystem.
    #[must_use]
    pub fn is_installed(&self, name: &str) -> bool {
        self.document.read().is_installed(name)
    }

    /// Makes `name` the global default.
    ///
    /// # Errors
    ///
    /// Fails like [`RegistryStore::get`], or if the registry cannot be saved.
    pub fn set_global(&self, name: &str) -> Result<()> {
        self.get(name)?;
        self.mutate(|doc| {
            doc.global = name.to_string();
            Ok(())
        })?;
        tracing::info!(name, "global runtime set");
        Ok(())
    }

    /// Pins `dir` to `name`. Relative directories are made absolute.
    ///
    /// # Errors
    ///
    /// Fails like [`RegistryStore::get`], or if the registry cannot be saved.
    pub fn set_local_override(&self, dir: &Path, name: &str) -> Result<()> {
        self.get(name)?;
        let key = override_key(dir)?;
        self.mutate(|doc| {
            doc.local_overrides.insert(key.clone(), name.to_string());
            Ok(())
        })?;
        tracing::info!(dir = %key, name, "local override set");
        Ok(())
    }

    /// Drops the override for `dir`, returning whether one existed.
    ///
    /// # Errors
    ///
    /// Returns an error if the registry cannot be saved.
    pub fn remove_local_override(&self, dir: &Path) -> Result<bool> {
        let key = override_key(dir)?;
        if !self.document.read().local_overrides.contains_key(&key) {
            return Ok(false);
        }
        self.mutate(|doc| Ok(doc.local_overrides.remove(&key).is_some()))
    }

    /// The global default, if one is set.
    #[must_use]
    pub fn global(&self) -> Option<String> {
        let document = self.document.read();
        (!document.global.is_empty()).then(|| document.global.clone())
    }

    /// All directory overrides.
    #[must_use]
    pub fn local_overrides(&self) -> BTreeMap<String, String> {
        self.document.read().local_overrides.clone()
    }

    /// A copy of the whole document.
    #[must_use]
    pub fn snapshot(&self) -> RegistryDocument {
        self.document.read().clone()
    }

    /// Finds an installed runtime of `vendor` for a version query.
    ///
    /// `<vendor>-<version>` is tried verbatim first. Otherwise the vendor's
    /// runtimes whose version starts with `version` at a component boundary
    /// (`21` matches `21.0.2+13` but not `210`) and whose java binary exists
    /// are considered, and the greatest name wins.
    #[must_use]
    pub fn find_by_version(&self, version: &str, vendor: &str) -> Option<(String, InstalledRuntime)> {
        let document = self.document.read();
        let exact = format!("{vendor}-{version}");
        if let Some(runtime) = document.installed.get(&exact) {
            return Some((exact, runtime.clone()));
        }

        let prefix = format!("{vendor}-");
        document
            .installed
            .iter()
            .filter(|(name, runtime)| {
                runtime.vendor == vendor
                    && name
                        .strip_prefix(&prefix)
                        .is_some_and(|installed| version_matches(installed, version))
                    && RuntimePaths::java_binary(&runtime.path).is_file()
            })
            .max_by(|a, b| a.0.cmp(b.0))
            .map(|(name, runtime)| (name.clone(), runtime.clone()))
    }

    /// Maps user input to a registered install name.
    ///
    /// Tries the exact name, then each vendor's install name for the input
    /// (so `21` finds `temurin-21`), then the first name containing it.
    #[must_use]
    pub fn resolve_name(&self, query: &str) -> Option<String> {
        let document = self.document.read();
        if document.installed.contains_key(query) {
            return Some(query.to_string());
        }
        Vendor::ALL
            .iter()
            .map(|vendor| vendor.install_name(query))
            .find(|name| document.installed.contains_key(name))
            .or_else(|| {
                document
                    .installed
                    .keys()
                    .find(|name| name.contains(query))
                    .cloned()
            })
    }
}

fn version_matches(installed: &str, query: &str) -> bool {
    installed
        .strip_prefix(query)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with(['.', '+', '-', '_']))
}

fn override_key(dir: &Path) -> Result<String> {
    let absolute = std::path::absolute(dir)
        .with_context(|| format!("Failed to make path absolute: {}", dir.display()))?;
    Ok(absolute.to_string_lossy().into_owned())
}
