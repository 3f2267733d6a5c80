//! On-disk layout for jvman.
//!
//! The default root directory is `~/.jvman/`, which can be overridden by
//! setting the `JVMAN_HOME` environment variable.
//!
//! ## Directory Structure
//!
//! ```text
//! ~/.jvman/                   # Root directory (or JVMAN_HOME)
//!   config.json               # Registry document
//!   cache.json                # Vendor release listing cache
//!   jvms/                     # Installed runtimes
//!     temurin-21/             # One runtime root per install name
//!       bin/java
//!     .tmp-XXXXXX/            # Private staging area of an in-flight install
//!   bin/                      # Generated launcher shims
//!     java
//!     javac
//! ```
//!
//! A directory may pin a runtime by containing a `.jvman` marker file whose
//! single line is an install name.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Environment variable to override the default root directory.
pub const JVMAN_HOME_ENV: &str = "JVMAN_HOME";

const BASE_DIR_NAME: &str = ".jvman";
const JVMS_DIR_NAME: &str = "jvms";
const BIN_DIR_NAME: &str = "bin";
const CONFIG_FILE_NAME: &str = "config.json";
const CACHE_FILE_NAME: &str = "cache.json";
const MARKER_FILE_NAME: &str = ".jvman";

/// Fixed locations used by every other component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimePaths {
    /// Root directory (`~/.jvman` or `JVMAN_HOME`).
    pub root: PathBuf,
    /// Directory containing one subdirectory per installed runtime.
    pub jvms: PathBuf,
    /// Directory holding the generated shims.
    pub bin: PathBuf,
    /// The persisted registry document.
    pub config_file: PathBuf,
}

impl RuntimePaths {
    /// Creates the layout from `JVMAN_HOME` or the user's home directory.
    ///
    /// Empty or whitespace-only `JVMAN_HOME` values are treated as unset.
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined.
    pub fn new() -> Result<Self> {
        let root = match std::env::var(JVMAN_HOME_ENV) {
            Ok(home) if !home.trim().is_empty() => PathBuf::from(home),
            _ => dirs::home_dir()
                .context("Cannot determine home directory. Set JVMAN_HOME environment variable.")?
                .join(BASE_DIR_NAME),
        };

        Ok(Self::with_root(root))
    }

    /// Creates the layout under a known root directory.
    #[must_use = "returns new paths instance without side effects"]
    pub fn with_root(root: PathBuf) -> Self {
        Self {
            jvms: root.join(JVMS_DIR_NAME),
            bin: root.join(BIN_DIR_NAME),
            config_file: root.join(CONFIG_FILE_NAME),
            root,
        }
    }

    /// Returns the final install location for an install name.
    #[must_use = "returns the path without side effects"]
    pub fn runtime_dir(&self, name: &str) -> PathBuf {
        self.jvms.join(name)
    }

    /// Returns the vendor release listing cache file.
    #[must_use = "returns the path without side effects"]
    pub fn cache_file(&self) -> PathBuf {
        self.root.join(CACHE_FILE_NAME)
    }

    /// Returns the path of the generated shim for `binary`.
    #[must_use = "returns the path without side effects"]
    pub fn shim_path(&self, binary: &str) -> PathBuf {
        if cfg!(windows) {
            self.bin.join(format!("{binary}.cmd"))
        } else {
            self.bin.join(binary)
        }
    }

    /// Name of the per-directory marker file.
    #[must_use]
    pub const fn marker_file_name() -> &'static str {
        MARKER_FILE_NAME
    }

    /// Returns the `bin` directory of a runtime root.
    #[must_use]
    pub fn runtime_bin_dir(runtime: &Path) -> PathBuf {
        runtime.join("bin")
    }

    /// Returns the `java` launcher of a runtime root.
    #[must_use]
    pub fn java_binary(runtime: &Path) -> PathBuf {
        Self::runtime_bin_dir(runtime).join(format!("java{}", std::env::consts::EXE_SUFFIX))
    }

    /// Creates the root, runtimes and shim directories if missing.
    ///
    /// # Errors
    ///
    /// Returns an error if any directory cannot be created.
    pub fn ensure_directories(&self) -> Result<()> {
        for dir in [&self.root, &self.jvms, &self.bin] {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
        }
        Ok(())
    }
}
