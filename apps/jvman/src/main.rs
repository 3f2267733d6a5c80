#![warn(clippy::pedantic)]

//! # jvman
//!
//! Installs Java runtimes from several vendors side by side and picks the
//! right one per directory.
//!
//! ## Subcommands
//!
//! - `install` - Download and register a runtime
//! - `list` - Show installed runtimes and vendor versions
//! - `global` - Set the global default runtime
//! - `use` - Pin the current directory with a `.jvman` file
//! - `local` - Set or clear a registry override for the current directory
//! - `remove` - Delete an installed runtime
//! - `which` - Show the runtime in effect here
//! - `exec` - Run a command against a specific runtime
//! - `init` - Create directories and shims
//! - `version` - Display version information
//!
//! ## Resolution
//!
//! The runtime in effect for a directory is, in order:
//!
//! 1. The nearest `.jvman` file in the directory or one of its ancestors
//! 2. A registry override recorded for that exact directory
//! 3. The global default
//!
//! ## Examples
//!
//! ```bash
//! jvman init
//! jvman install 21
//! jvman install 17 --vendor zulu
//! jvman use 17
//! jvman exec 21 java -version
//! ```

mod commands;
mod errors;
mod runtime;
mod vendor;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{exec, global, init, install, list, local, remove, use_cmd, version, which};
use errors::JvmanError;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter.
const LOG_ENV: &str = "JVMAN_LOG";

/// Side-by-side Java runtime manager.
#[derive(Parser)]
#[command(
    name = "jvman",
    author,
    version,
    about = "Install, switch and run Java runtimes side by side",
    long_about = "jvman installs JDKs from Temurin, Corretto and Zulu into one directory \
    and selects one per project through .jvman files, directory overrides or a global default.",
    after_help = "\
VERSION RESOLUTION:
    The active runtime for a directory is chosen in this order:
    1. Nearest .jvman file in the directory or an ancestor
    2. Registry override for the exact directory (jvman local)
    3. Global default (jvman global)

ENVIRONMENT VARIABLES:
    JVMAN_HOME                  Base directory (default: ~/.jvman)
    JVMAN_LOG                   Log filter, e.g. debug or jvman=trace (default: warn)
    JVMAN_TEMURIN_API           Adoptium API base URL
    JVMAN_CORRETTO_API          GitHub API base for Corretto repositories
    JVMAN_CORRETTO_DOWNLOADS    Corretto download base URL
    JVMAN_ZULU_API              Azul metadata API URL"
)]
pub struct Cli {
    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands for the jvman CLI.
#[derive(Subcommand)]
pub enum Commands {
    /// Install a Java version.
    ///
    /// Downloads the newest build of the version from the vendor, verifies
    /// its checksum and registers it. The first install becomes the global
    /// default.
    Install(install::InstallArgs),

    /// List installed and available Java versions.
    List(list::ListArgs),

    /// Set the global default Java version.
    Global(global::GlobalArgs),

    /// Set the Java version for the current directory.
    ///
    /// Creates a .jvman file in the current directory.
    Use(use_cmd::UseArgs),

    /// Set or clear a registry override for the current directory.
    Local(local::LocalArgs),

    /// Remove an installed Java version.
    Remove(remove::RemoveArgs),

    /// Show the currently active Java installation.
    Which,

    /// Run a command with a specific Java version.
    ///
    /// Sets JAVA_HOME and puts the runtime's bin directory first on PATH.
    Exec(exec::ExecArgs),

    /// Create the jvman directories and shims.
    Init,

    /// Display version information.
    Version(version::VersionArgs),
}

#[tokio::main]
async fn main() {
    init_logging();

    if let Err(e) = run().await {
        let exit_code = handle_error(&e);
        std::process::exit(exit_code);
    }
}

/// Sends diagnostics to stderr, filtered by `JVMAN_LOG`.
fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Handles an error and returns the appropriate exit code.
///
/// For `ProcessExitCode` errors, returns the embedded exit code without
/// printing an error message (the launched program already printed its
/// output). For all other errors, prints the error and returns exit code 1.
fn handle_error(e: &anyhow::Error) -> i32 {
    if let Some(JvmanError::ProcessExitCode { code }) = e.downcast_ref::<JvmanError>() {
        return *code;
    }
    eprintln!("Error: {e:?}");
    1
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Install(args) => install::execute(&args).await,
        Commands::List(args) => list::execute(&args).await,
        Commands::Global(args) => global::execute(&args),
        Commands::Use(args) => use_cmd::execute(&args),
        Commands::Local(args) => local::execute(&args),
        Commands::Remove(args) => remove::execute(&args),
        Commands::Which => which::execute(),
        Commands::Exec(args) => exec::execute(&args),
        Commands::Init => init::execute(),
        Commands::Version(args) => version::execute(&args),
    }
}
