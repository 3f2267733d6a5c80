//! Error types for the jvman CLI.
//!
//! Most operations return `anyhow::Result` and attach context as errors bubble
//! up. The variants below are the failures callers need to tell apart, either
//! to pick an exit code or to react differently (for example, listing installs
//! tolerates a missing runtime directory while executing one does not).

use std::path::PathBuf;
use thiserror::Error;

/// Consolidated error type for jvman operations.
#[derive(Debug, Error)]
pub enum JvmanError {
    /// The install name is not present in the registry.
    #[error("Java runtime {name} is not installed")]
    RuntimeNotInstalled {
        /// The install name that was looked up.
        name: String,
    },

    /// The registry knows the runtime but its directory is gone.
    #[error("Java runtime {name} installation path does not exist: {}", path.display())]
    RuntimePathMissing {
        /// The install name.
        name: String,
        /// The recorded, now missing, directory.
        path: PathBuf,
    },

    /// Network or HTTP failure while fetching an artifact.
    #[error("download error: {message}")]
    Download {
        /// Description of the download error.
        message: String,
        /// The underlying error.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Downloaded bytes do not hash to the expected value.
    #[error("checksum mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch {
        /// The expected checksum.
        expected: String,
        /// The computed checksum.
        actual: String,
    },

    /// The release names a checksum algorithm we cannot compute.
    #[error("unsupported checksum algorithm: {algorithm}")]
    UnsupportedChecksum {
        /// The algorithm identifier from the release.
        algorithm: String,
    },

    /// No directory containing `bin/java` was found after extraction.
    #[error("could not locate a Java runtime in extracted contents: {}", dir.display())]
    RuntimeRootNotFound {
        /// The extraction directory that was searched.
        dir: PathBuf,
    },

    /// The vendor name is not one of the supported vendors.
    #[error("unknown vendor: {name} (available: temurin, corretto, zulu)")]
    UnknownVendor {
        /// The vendor name given by the user.
        name: String,
    },

    /// The runtime was moved into place but could not be registered.
    ///
    /// The runtime directory is left on disk.
    #[error("failed to register installation {name}")]
    Registration {
        /// The install name.
        name: String,
        /// The underlying persistence error.
        #[source]
        source: anyhow::Error,
    },

    /// A launched process exited with a non-zero code.
    ///
    /// The code is propagated to our own exit status without printing
    /// anything else.
    #[error("process exited with code {code}")]
    ProcessExitCode {
        /// The exit code from the subprocess.
        code: i32,
    },
}

impl JvmanError {
    /// Creates a new `RuntimeNotInstalled` error.
    #[must_use]
    pub fn runtime_not_installed(name: impl Into<String>) -> Self {
        Self::RuntimeNotInstalled { name: name.into() }
    }

    /// Creates a new `RuntimePathMissing` error.
    #[must_use]
    pub fn runtime_path_missing(name: impl Into<String>, path: PathBuf) -> Self {
        Self::RuntimePathMissing {
            name: name.into(),
            path,
        }
    }

    /// Creates a new `Download` error.
    #[must_use]
    pub fn download(message: impl Into<String>) -> Self {
        Self::Download {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a new `Download` error with a source error.
    #[must_use]
    pub fn download_with_source(
        message: impl Into<String>,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        Self::Download {
            message: message.into(),
            source: Some(source),
        }
    }

    /// Creates a new `ChecksumMismatch` error.
    #[must_use]
    pub fn checksum_mismatch(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Self::ChecksumMismatch {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Creates a new `UnsupportedChecksum` error.
    #[must_use]
    pub fn unsupported_checksum(algorithm: impl Into<String>) -> Self {
        Self::UnsupportedChecksum {
            algorithm: algorithm.into(),
        }
    }

    /// Creates a new `RuntimeRootNotFound` error.
    #[must_use]
    pub fn runtime_root_not_found(dir: PathBuf) -> Self {
        Self::RuntimeRootNotFound { dir }
    }

    /// Creates a new `UnknownVendor` error.
    #[must_use]
    pub fn unknown_vendor(name: impl Into<String>) -> Self {
        Self::UnknownVendor { name: name.into() }
    }

    /// Creates a new `Registration` error.
    #[must_use]
    pub fn registration(name: impl Into<String>, source: anyhow::Error) -> Self {
        Self::Registration {
            name: name.into(),
            source,
        }
    }

    /// Creates a new `ProcessExitCode` error.
    #[must_use]
    pub const fn process_exit_code(code: i32) -> Self {
        Self::ProcessExitCode { code }
    }
}
