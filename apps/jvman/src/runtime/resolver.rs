//! Active runtime resolution.
//!
//! Decides which installed runtime applies to a directory. The first tier
//! that yields an installed runtime wins:
//!
//! 1. The nearest `.jvman` marker file, walking up from the directory. Only
//!    the nearest marker is consulted; if it names a runtime that is not
//!    installed, ancestors are not searched and resolution moves on.
//! 2. A local override registered for exactly this directory.
//! 3. The global default.
//!
//! Nothing configured is a normal outcome (`Ok(None)`), not an error.

use anyhow::{Context, Result};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::runtime::paths::RuntimePaths;
use crate::runtime::registry::RegistryDocument;

/// Which tier produced a resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionSource {
    /// A marker file at the given path.
    LocalFile(PathBuf),
    /// The directory override map.
    LocalOverride,
    /// The global default.
    Global,
}

impl fmt::Display for ResolutionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LocalFile(path) => write!(f, "local file: {}", path.display()),
            Self::LocalOverride => write!(f, "local override"),
            Self::Global => write!(f, "global"),
        }
    }
}

/// The runtime that applies to a directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Install name.
    pub name: String,
    /// Runtime root.
    pub path: PathBuf,
    /// Tier that produced this resolution.
    pub source: ResolutionSource,
}

impl Resolution {
    /// The runtime's `java` launcher.
    #[must_use]
    pub fn java_binary(&self) -> PathBuf {
        RuntimePaths::java_binary(&self.path)
    }

    /// Any executable from the runtime's `bin` directory.
    #[allow(dead_code)]
    #[must_use]
    pub fn binary(&self, name: &str) -> PathBuf {
        RuntimePaths::runtime_bin_dir(&self.path)
            .join(format!("{name}{}", std::env::consts::EXE_SUFFIX))
    }
}

/// Applies the precedence rules to one registry snapshot.
pub struct Resolver<'a> {
    document: &'a RegistryDocument,
}

impl<'a> Resolver<'a> {
    /// Creates a resolver over `document`.
    #[must_use]
    pub fn new(document: &'a RegistryDocument) -> Self {
        Self { document }
    }

    /// Resolves for the process working directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the working directory or a marker file cannot be
    /// read.
    pub fn resolve(&self) -> Result<Option<Resolution>> {
        let cwd = std::env::current_dir().context("Failed to determine current directory")?;
        self.resolve_from(&cwd)
    }

    /// Resolves for `dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if a marker file exists but cannot be read.
    pub fn resolve_from(&self, dir: &Path) -> Result<Option<Resolution>> {
        if let Some(marker) = find_marker(dir) {
            let name = read_marker(&marker)?;
            if let Some(resolution) = self.installed(&name, ResolutionSource::LocalFile(marker.clone())) {
                tracing::debug!(name, marker = %marker.display(), "resolved from marker file");
                return Ok(Some(resolution));
            }
            tracing::debug!(name, marker = %marker.display(), "marker names a runtime that is not installed");
        }

        let absolute = std::path::absolute(dir).unwrap_or_else(|_| dir.to_path_buf());
        let key = absolute.to_string_lossy();
        if let Some(name) = self.document.local_overrides.get(key.as_ref())
            && let Some(resolution) = self.installed(name, ResolutionSource::LocalOverride)
        {
            tracing::debug!(name, dir = %key, "resolved from local override");
            return Ok(Some(resolution));
        }

        if !self.document.global.is_empty()
            && let Some(resolution) = self.installed(&self.document.global, ResolutionSource::Global)
        {
            tracing::debug!(name = %resolution.name, "resolved from global default");
            return Ok(Some(resolution));
        }

        Ok(None)
    }

    fn installed(&self, name: &str, source: ResolutionSource) -> Option<Resolution> {
        self.document.runtime(name).map(|runtime| Resolution {
            name: name.to_string(),
            path: runtime.path.clone(),
            source,
        })
    }
}

/// Returns the nearest marker file at or above `dir`.
fn find_marker(dir: &Path) -> Option<PathBuf> {
    dir.ancestors()
        .map(|ancestor| ancestor.join(RuntimePaths::marker_file_name()))
        .find(|candidate| candidate.is_file())
}

fn read_marker(marker: &Path) -> Result<String> {
    let content = std::fs::read_to_string(marker)
        .with_context(|| format!("Failed to read marker file: {}", marker.display()))?;
    Ok(content.lines().next().unwrap_or_default().trim().to_string())
}
