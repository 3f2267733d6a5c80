//! Which command for the jvman CLI.
//!
//! Prints the runtime in effect for the current directory and where the
//! choice came from.
//!
//! ## Output Format
//!
//! ```text
//! Version: temurin-21
//! Path: /home/dev/.jvman/jvms/temurin-21
//! Source: local file: /work/app/.jvman
//! Java binary: /home/dev/.jvman/jvms/temurin-21/bin/java
//! ```

use anyhow::Result;

use super::open_registry;
use crate::runtime::{Resolution, Resolver};

/// Executes the which command.
///
/// # Errors
///
/// Returns an error if the registry or a marker file cannot be read.
pub fn execute() -> Result<()> {
    let (_, registry) = open_registry()?;
    let document = registry.snapshot();

    match Resolver::new(&document).resolve()? {
        Some(resolution) => print!("{}", describe(&resolution)),
        None => println!("No Java version is currently configured"),
    }
    Ok(())
}

fn describe(resolution: &Resolution) -> String {
    format!(
        "Version: {}\nPath: {}\nSource: {}\nJava binary: {}\n",
        resolution.name,
        resolution.path.display(),
        resolution.source,
        resolution.java_binary().display(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::ResolutionSource;
    use std::path::PathBuf;

    #[test]
    fn describe_lists_every_field() {
        let resolution = Resolution {
            name: "temurin-21".to_string(),
            path: PathBuf::from("/j/temurin-21"),
            source: ResolutionSource::Global,
        };

        let text = describe(&resolution);

        assert!(text.starts_with("Version: temurin-21\nPath: /j/temurin-21\nSource: global\n"));
        assert!(text.contains("Java binary: "));
    }
}
