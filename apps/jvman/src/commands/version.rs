//! Version command for the jvman CLI.
//!
//! Displays version information. In verbose mode, shows the commit, the
//! platform and the base directory as well.

use anyhow::Result;
use clap::Args;

use crate::runtime::RuntimePaths;

/// Arguments for the version command.
#[derive(Args)]
pub struct VersionArgs {
    /// Show detailed version information including commit, platform and base directory.
    #[clap(short = 'v', long = "verbose", action = clap::ArgAction::SetTrue)]
    pub verbose: bool,
}

/// Executes the version command.
#[allow(clippy::unnecessary_wraps)]
pub fn execute(args: &VersionArgs) -> Result<()> {
    println!("jvman version {}", env!("CARGO_PKG_VERSION"));
    if args.verbose {
        print_build_details();
    }
    Ok(())
}

fn print_build_details() {
    println!();
    println!("Build Information:");
    println!("  Commit:   {}", git_commit());
    println!("  Platform: {}", platform_string());
    match RuntimePaths::new() {
        Ok(paths) => println!("  Home:     {}", paths.root.display()),
        Err(e) => println!("  Home:     unavailable ({e})"),
    }
}

/// Returns the git commit hash from environment or a fallback.
fn git_commit() -> &'static str {
    option_env!("JVMAN_GIT_COMMIT").unwrap_or("unknown")
}

/// Returns a human-readable platform string.
fn platform_string() -> String {
    format!("{}-{}", std::env::consts::OS, std::env::consts::ARCH)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn execute_with_verbose_false_succeeds() {
        assert!(execute(&VersionArgs { verbose: false }).is_ok());
    }

    #[test]
    fn execute_with_verbose_true_succeeds() {
        assert!(execute(&VersionArgs { verbose: true }).is_ok());
    }

    #[test]
    fn platform_string_is_not_empty() {
        let platform = platform_string();
        assert!(!platform.is_empty());
        assert!(platform.contains('-'));
    }

    #[test]
    fn git_commit_returns_value() {
        assert!(!git_commit().is_empty());
    }
}
