//! Host platform detection.
//!
//! Vendors name operating systems and architectures differently (`mac` vs
//! `macosx` vs `macos`), so this module only carries a neutral
//! representation. Each vendor client maps it to its own vocabulary.

use anyhow::{Result, bail};
use std::fmt;

/// Operating system families with published JDK builds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Os {
    /// Linux (glibc builds).
    Linux,
    /// macOS.
    Macos,
    /// Windows.
    Windows,
}

/// CPU architectures with published JDK builds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Arch {
    /// `x86_64`.
    X64,
    /// ARM64.
    Aarch64,
    /// 32-bit x86.
    X86,
}

impl Arch {
    /// Normalises a user-supplied architecture name.
    ///
    /// # Errors
    ///
    /// Returns an error for names that do not map to a known architecture.
    pub fn parse(name: &str) -> Result<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "amd64" | "x86_64" | "x64" => Ok(Self::X64),
            "arm64" | "aarch64" => Ok(Self::Aarch64),
            "386" | "x86" | "i686" | "x32" => Ok(Self::X86),
            other => bail!("Unsupported architecture: {other} (expected x64, aarch64 or x86)"),
        }
    }
}

/// An operating system and architecture pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Platform {
    /// Operating system.
    pub os: Os,
    /// CPU architecture.
    pub arch: Arch,
}

impl Platform {
    /// Detects the current platform based on compile-time configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the current OS or architecture has no JDK builds.
    pub fn detect() -> Result<Self> {
        let os = match std::env::consts::OS {
            "linux" => Os::Linux,
            "macos" => Os::Macos,
            "windows" => Os::Windows,
            other => bail!("Unsupported operating system: {other}"),
        };
        let arch = match std::env::consts::ARCH {
            "x86_64" => Arch::X64,
            "aarch64" => Arch::Aarch64,
            "x86" => Arch::X86,
            other => bail!("Unsupported architecture: {other}"),
        };
        Ok(Self { os, arch })
    }

    /// Returns the same platform targeting a different architecture.
    #[must_use]
    pub fn with_arch(self, arch: Arch) -> Self {
        Self { arch, ..self }
    }

    /// Returns whether this platform is Windows.
    #[must_use]
    pub fn is_windows(self) -> bool {
        self.os == Os::Windows
    }

    /// Returns the executable file extension for this platform.
    #[allow(dead_code)]
    #[must_use]
    pub fn executable_extension(self) -> &'static str {
        if self.is_windows() { ".exe" } else { "" }
    }

    /// Returns the preferred archive extension for JDK downloads.
    #[must_use]
    pub fn archive_extension(self) -> &'static str {
        if self.is_windows() { "zip" } else { "tar.gz" }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let os = match self.os {
            Os::Linux => "linux",
            Os::Macos => "macos",
            Os::Windows => "windows",
        };
        let arch = match self.arch {
            Arch::X64 => "x64",
            Arch::Aarch64 => "aarch64",
            Arch::X86 => "x86",
        };
        write!(f, "{os}-{arch}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arch_parse_normalises_aliases() {
        assert_eq!(Arch::parse("amd64").unwrap(), Arch::X64);
        assert_eq!(Arch::parse("x86_64").unwrap(), Arch::X64);
        assert_eq!(Arch::parse("ARM64").unwrap(), Arch::Aarch64);
        assert_eq!(Arch::parse("aarch64").unwrap(), Arch::Aarch64);
        assert_eq!(Arch::parse("386").unwrap(), Arch::X86);
    }

    #[test]
    fn arch_parse_rejects_unknown() {
        let err = Arch::parse("sparc").unwrap_err().to_string();
        assert!(err.contains("sparc"));
    }

    #[test]
    fn with_arch_keeps_os() {
        let platform = Platform {
            os: Os::Macos,
            arch: Arch::X64,
        }
        .with_arch(Arch::Aarch64);
        assert_eq!(platform.os, Os::Macos);
        assert_eq!(platform.arch, Arch::Aarch64);
    }

    #[test]
    fn windows_prefers_zip_archives() {
        let windows = Platform {
            os: Os::Windows,
            arch: Arch::X64,
        };
        let linux = Platform {
            os: Os::Linux,
            arch: Arch::X64,
        };
        assert!(windows.is_windows());
        assert_eq!(windows.archive_extension(), "zip");
        assert_eq!(windows.executable_extension(), ".exe");
        assert_eq!(linux.archive_extension(), "tar.gz");
        assert_eq!(linux.executable_extension(), "");
    }

    #[test]
    fn display_joins_os_and_arch() {
        let platform = Platform {
            os: Os::Linux,
            arch: Arch::Aarch64,
        };
        assert_eq!(platform.to_string(), "linux-aarch64");
    }

    #[cfg(all(target_os = "linux", target_arch = "x86_64"))]
    #[test]
    fn detect_returns_host_platform() {
        let platform = Platform::detect().unwrap();
        assert_eq!(platform.os, Os::Linux);
        assert_eq!(platform.arch, Arch::X64);
    }
}
