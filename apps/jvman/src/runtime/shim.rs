//! Launcher shims.
//!
//! One small script per managed binary lives in `<base>/bin`. Putting that
//! directory on `PATH` makes `java`, `javac` and friends follow the active
//! runtime without invoking jvman itself.
//!
//! Each script re-resolves the runtime on every call: the nearest `.jvman`
//! marker file first, then the `global` field of `config.json`. Directory
//! overrides are not consulted. A script fails with a message and exit
//! status 1 when no runtime is configured, or when the configured runtime is
//! missing from `jvms/`.

use anyhow::{Context, Result};
use std::path::Path;

use crate::runtime::paths::RuntimePaths;

/// Executables that get a shim.
pub const MANAGED_BINARIES: [&str; 9] = [
    "java",
    "javac",
    "jar",
    "jshell",
    "javadoc",
    "jarsigner",
    "keytool",
    "jlink",
    "jpackage",
];

/// Writes and deletes the shims under a base directory.
pub struct ShimManager<'a> {
    paths: &'a RuntimePaths,
}

impl<'a> ShimManager<'a> {
    /// Creates a manager for the layout in `paths`.
    #[must_use]
    pub fn new(paths: &'a RuntimePaths) -> Self {
        Self { paths }
    }

    /// Writes a shim for every managed binary, replacing existing ones.
    ///
    /// # Errors
    ///
    /// Returns an error if the shim directory or any script cannot be written.
    pub fn create_shims(&self) -> Result<()> {
        std::fs::create_dir_all(&self.paths.bin).with_context(|| {
            format!("Failed to create directory: {}", self.paths.bin.display())
        })?;

        for binary in MANAGED_BINARIES {
            let shim = self.paths.shim_path(binary);
            let script = if cfg!(windows) {
                render_cmd(&self.paths.root, binary)
            } else {
                render_sh(&self.paths.root, binary)
            };
            std::fs::write(&shim, script)
                .with_context(|| format!("Failed to create shim for {binary}"))?;
            set_executable(&shim)?;
        }

        tracing::debug!(dir = %self.paths.bin.display(), count = MANAGED_BINARIES.len(), "shims written");
        Ok(())
    }

    /// Deletes every shim. Missing files are ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if an existing shim cannot be deleted.
    pub fn remove_shims(&self) -> Result<()> {
        for binary in MANAGED_BINARIES {
            remove_if_present(&self.paths.shim_path(binary))?;
            if cfg!(windows) {
                remove_if_present(&self.paths.bin.join(format!("{binary}.exe")))?;
            }
        }
        tracing::debug!(dir = %self.paths.bin.display(), "shims removed");
        Ok(())
    }
}

fn remove_if_present(path: &Path) -> Result<()> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e).with_context(|| format!("Failed to remove shim: {}", path.display())),
    }
}

#[cfg(unix)]
fn set_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))
        .with_context(|| format!("Failed to set permissions on: {}", path.display()))
}

#[cfg(not(unix))]
#[allow(clippy::unnecessary_wraps)]
fn set_executable(_path: &Path) -> Result<()> {
    Ok(())
}

/// Quotes a value for a POSIX shell single-quoted string.
fn sh_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

fn render_sh(base: &Path, binary: &str) -> String {
    let base = sh_quote(&base.to_string_lossy());
    format!(
        r#"#!/bin/sh
set -e

JVMAN_BASE={base}

resolve_version() {{
    dir="$(pwd)"
    while :; do
        if [ -f "$dir/.jvman" ]; then
            sed -n '1{{s/^[[:space:]]*//;s/[[:space:]]*$//;p;}}' "$dir/.jvman"
            return 0
        fi
        [ "$dir" = "/" ] && break
        dir="$(dirname "$dir")"
    done

    if [ -f "$JVMAN_BASE/config.json" ]; then
        grep -o '"global"[[:space:]]*:[[:space:]]*"[^"]*"' "$JVMAN_BASE/config.json" 2>/dev/null \
            | head -n 1 \
            | sed 's/.*:[[:space:]]*"\([^"]*\)"/\1/'
    fi
    return 0
}}

version="$(resolve_version)"
if [ -z "$version" ]; then
    echo "jvman: no Java version configured. Run 'jvman global <version>' or create a .jvman file." >&2
    exit 1
fi

java_home="$JVMAN_BASE/jvms/$version"
if [ ! -d "$java_home" ]; then
    echo "jvman: Java version '$version' is not installed. Run 'jvman install $version'." >&2
    exit 1
fi

exec "$java_home/bin/{binary}" "$@"
"#
    )
}

fn render_cmd(base: &Path, binary: &str) -> String {
    let base = base.to_string_lossy().replace('%', "%%");
    format!(
        r#"@echo off
setlocal enabledelayedexpansion

set "JVMAN_BASE={base}"
set "VERSION="

set "DIR=%CD%"
:findversion
if exist "%DIR%\.jvman" (
    if not exist "%DIR%\.jvman\" (
        set /p VERSION=<"%DIR%\.jvman"
        set "VERSION=!VERSION: =!"
        goto :found
    )
)
for %%i in ("%DIR%\..") do set "PARENT=%%~fi"
if "%PARENT%"=="%DIR%" goto :checkglobal
set "DIR=%PARENT%"
goto :findversion

:checkglobal
if exist "%JVMAN_BASE%\config.json" (
    for /f "tokens=2 delims=:," %%a in ('findstr /c:"\"global\"" "%JVMAN_BASE%\config.json"') do (
        set "VERSION=%%~a"
        set "VERSION=!VERSION:"=!"
        set "VERSION=!VERSION: =!"
    )
)

:found
if "%VERSION%"=="" (
    echo jvman: no Java version configured. Run 'jvman global ^<version^>' or create a .jvman file. >&2
    exit /b 1
)

set "JAVA_HOME=%JVMAN_BASE%\jvms\%VERSION%"
if not exist "%JAVA_HOME%\" (
    echo jvman: Java version '%VERSION%' is not installed. Run 'jvman install %VERSION%'. >&2
    exit /b 1
)

"%JAVA_HOME%\bin\{binary}.exe" %*
exit /b %ERRORLEVEL%
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn sh_quote_escapes_single_quotes() {
        assert_eq!(sh_quote("/home/o'neil/.jvman"), r"'/home/o'\''neil/.jvman'");
    }

    #[test]
    fn sh_shim_embeds_base_and_binary() {
        let script = render_sh(Path::new("/opt/jvman"), "javac");

        assert!(script.starts_with("#!/bin/sh\n"));
        assert!(script.contains("JVMAN_BASE='/opt/jvman'"));
        assert!(script.contains(r#"exec "$java_home/bin/javac" "$@""#));
    }

    #[test]
    fn cmd_shim_embeds_base_and_binary() {
        let script = render_cmd(Path::new(r"C:\Users\dev\.jvman"), "jshell");

        assert!(script.contains(r#"set "JVMAN_BASE=C:\Users\dev\.jvman""#));
        assert!(script.contains(r#""%JAVA_HOME%\bin\jshell.exe" %*"#));
    }

    #[test]
    fn cmd_shim_strips_spaces_from_marker() {
        let script = render_cmd(Path::new(r"C:\jvman"), "java");

        let read = script.find(r#"set /p VERSION=<"%DIR%\.jvman""#).unwrap();
        let strip = script[read..].find(r#"set "VERSION=!VERSION: =!""#).unwrap();
        let found = script[read..].find("goto :found").unwrap();
        assert!(strip < found);
    }

    #[test]
    fn create_then_remove_shims() {
        let temp = tempfile::tempdir().unwrap();
        let paths = RuntimePaths::with_root(temp.path().to_path_buf());
        let manager = ShimManager::new(&paths);

        manager.create_shims().unwrap();
        for binary in MANAGED_BINARIES {
            assert!(paths.shim_path(binary).is_file(), "missing shim {binary}");
        }

        manager.remove_shims().unwrap();
        for binary in MANAGED_BINARIES {
            assert!(!paths.shim_path(binary).exists(), "leftover shim {binary}");
        }

        manager.remove_shims().unwrap();
    }

    #[cfg(unix)]
    mod scripts {
        use super::*;
        use crate::runtime::registry::RegistryStore;
        use std::os::unix::fs::PermissionsExt;
        use std::process::Command;

        struct Fixture {
            _temp: tempfile::TempDir,
            paths: RuntimePaths,
            project: PathBuf,
        }

        fn fixture() -> Fixture {
            let temp = tempfile::tempdir().unwrap();
            let paths = RuntimePaths::with_root(temp.path().join("base"));
            let project = temp.path().join("project");
            std::fs::create_dir_all(&project).unwrap();
            ShimManager::new(&paths).create_shims().unwrap();
            Fixture {
                _temp: temp,
                paths,
                project,
            }
        }

        fn fake_runtime(paths: &RuntimePaths, name: &str) -> PathBuf {
            let root = paths.runtime_dir(name);
            let bin = root.join("bin");
            std::fs::create_dir_all(&bin).unwrap();
            let java = bin.join("java");
            std::fs::write(&java, format!("#!/bin/sh\necho \"{name} $*\"\n")).unwrap();
            std::fs::set_permissions(&java, std::fs::Permissions::from_mode(0o755)).unwrap();
            root
        }

        fn run_java(fixture: &Fixture, dir: &Path) -> std::process::Output {
            Command::new(fixture.paths.shim_path("java"))
                .arg("-version")
                .current_dir(dir)
                .output()
                .expect("Should run shim")
        }

        #[test]
        fn shims_are_executable() {
            let fixture = fixture();
            let mode = std::fs::metadata(fixture.paths.shim_path("java"))
                .unwrap()
                .permissions()
                .mode();
            assert_eq!(mode & 0o777, 0o755);
        }

        #[test]
        fn shim_uses_global_from_registry() {
            let fixture = fixture();
            let root = fake_runtime(&fixture.paths, "temurin-21");
            let store = RegistryStore::load(&fixture.paths.config_file).unwrap();
            store.add("temurin-21", &root, "temurin").unwrap();
            store.set_global("temurin-21").unwrap();

            let output = run_java(&fixture, &fixture.project);

            assert!(output.status.success(), "{output:?}");
            assert_eq!(String::from_utf8_lossy(&output.stdout), "temurin-21 -version\n");
        }

        #[test]
        fn shim_prefers_marker_file() {
            let fixture = fixture();
            let global = fake_runtime(&fixture.paths, "temurin-21");
            fake_runtime(&fixture.paths, "zulu-17");
            let store = RegistryStore::load(&fixture.paths.config_file).unwrap();
            store.add("temurin-21", &global, "temurin").unwrap();
            store.set_global("temurin-21").unwrap();
            std::fs::write(fixture.project.join(".jvman"), "  zulu-17  \n").unwrap();
            let nested = fixture.project.join("module");
            std::fs::create_dir_all(&nested).unwrap();

            let output = run_java(&fixture, &nested);

            assert!(output.status.success(), "{output:?}");
            assert_eq!(String::from_utf8_lossy(&output.stdout), "zulu-17 -version\n");
        }

        #[test]
        fn shim_fails_without_configuration() {
            let fixture = fixture();

            let output = run_java(&fixture, &fixture.project);

            assert_eq!(output.status.code(), Some(1));
            assert!(String::from_utf8_lossy(&output.stderr).contains("no Java version configured"));
        }

        #[test]
        fn shim_fails_for_missing_runtime() {
            let fixture = fixture();
            std::fs::write(fixture.project.join(".jvman"), "corretto-8\n").unwrap();

            let output = run_java(&fixture, &fixture.project);

            assert_eq!(output.status.code(), Some(1));
            let stderr = String::from_utf8_lossy(&output.stderr);
            assert!(stderr.contains("'corretto-8' is not installed"), "{stderr}");
        }
    }
}
