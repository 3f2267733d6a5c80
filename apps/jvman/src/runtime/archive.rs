//! Archive extraction for downloaded runtimes.
//!
//! Vendors ship JDKs as tar.gz on Unix-like hosts and as ZIP on Windows.
//! Both formats go through the same rules:
//!
//! - Every entry path is cleaned lexically. Entries that would still climb
//!   out of the destination after cleaning are skipped, not fatal.
//! - Before anything is written, the entry's parent is resolved on disk. An
//!   entry whose parent leads outside the destination through a symlink is
//!   skipped the same way.
//! - Declared permission bits are applied to files and directories.
//! - Symbolic links keep their recorded target verbatim; hard links are
//!   resolved against the destination root (tar only).
//!
//! After extraction the runtime root (the directory holding `bin/java`) is
//! located inside the extracted tree, looking through macOS `Contents/Home`
//! bundles as well.

use anyhow::{Context, Result};
use flate2::read::GzDecoder;
use std::io::{Read, Write};
use std::path::{Component, Path, PathBuf};
use tar::{Archive, EntryType};

use crate::errors::JvmanError;
use crate::runtime::paths::RuntimePaths;

/// Mode for zip directory entries that carry no Unix permissions.
const DEFAULT_DIR_MODE: u32 = 0o755;

/// Mode for zip file entries that carry no Unix permissions.
const DEFAULT_FILE_MODE: u32 = 0o644;

/// Supported archive formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    /// gzip-compressed tarball.
    TarGz,
    /// ZIP archive.
    Zip,
}

impl ArchiveFormat {
    /// Picks the format from an archive file name. Anything that is not
    /// `.zip` is treated as tar.gz.
    #[must_use]
    pub fn for_file(file_name: &str) -> Self {
        if file_name.to_ascii_lowercase().ends_with(".zip") {
            Self::Zip
        } else {
            Self::TarGz
        }
    }

    /// The format vendors publish for the host OS.
    #[must_use]
    pub fn host_default() -> Self {
        if cfg!(windows) { Self::Zip } else { Self::TarGz }
    }

    /// Extracts `archive_path` into `dest_dir` and returns the runtime root
    /// found inside it.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The archive cannot be opened or is malformed
    /// - Directory, file or link creation fails
    /// - No runtime root exists in the extracted tree
    pub fn extract(self, archive_path: &Path, dest_dir: &Path) -> Result<PathBuf> {
        std::fs::create_dir_all(dest_dir)
            .with_context(|| format!("Failed to create directory: {}", dest_dir.display()))?;

        let root = dest_dir
            .canonicalize()
            .with_context(|| format!("Failed to resolve directory: {}", dest_dir.display()))?;
        let summary = match self {
            Self::TarGz => extract_tar_gz(archive_path, dest_dir, &root)?,
            Self::Zip => extract_zip(archive_path, dest_dir, &root)?,
        };
        tracing::debug!(
            archive = %archive_path.display(),
            format = ?self,
            extracted = summary.extracted,
            skipped = summary.skipped,
            "archive extracted"
        );

        find_runtime_root(dest_dir)
    }
}

#[derive(Debug, Default)]
struct ExtractSummary {
    extracted: usize,
    skipped: usize,
}

/// Cleans an archive entry path into a path relative to the destination.
///
/// Drops root and `.` components and folds `name/..` pairs. Returns `None`
/// for paths that still escape upward, and for paths that clean to nothing.
fn clean_entry_path(raw: &Path) -> Option<PathBuf> {
    let mut parts: Vec<&std::ffi::OsStr> = Vec::new();
    let mut escapes = false;

    for component in raw.components() {
        match component {
            Component::Prefix(_) | Component::RootDir | Component::CurDir => {}
            Component::ParentDir => {
                if parts.pop().is_none() {
                    escapes = true;
                }
            }
            Component::Normal(part) => {
                if !escapes {
                    parts.push(part);
                }
            }
        }
    }

    if escapes || parts.is_empty() {
        return None;
    }
    Some(parts.iter().collect())
}

/// Whether `path` resolves inside `root`.
///
/// `path` need not exist; its nearest existing ancestor is resolved instead.
/// An ancestor that is a dangling symlink counts as outside.
fn is_confined(root: &Path, path: &Path) -> bool {
    for ancestor in path.ancestors() {
        match ancestor.canonicalize() {
            Ok(resolved) => return resolved.starts_with(root),
            Err(_) if std::fs::symlink_metadata(ancestor).is_ok() => return false,
            Err(_) => {}
        }
    }
    false
}

/// The path whose resolution decides where an entry lands. Directories are
/// created through `target` itself; everything else replaces `target`.
fn write_anchor(target: &Path, is_dir: bool) -> &Path {
    if is_dir {
        target
    } else {
        target.parent().unwrap_or(target)
    }
}

fn extract_tar_gz(archive_path: &Path, dest_dir: &Path, root: &Path) -> Result<ExtractSummary> {
    let file = std::fs::File::open(archive_path)
        .with_context(|| format!("Failed to open archive: {}", archive_path.display()))?;
    let mut archive = Archive::new(GzDecoder::new(file));
    let mut summary = ExtractSummary::default();

    for entry in archive
        .entries()
        .with_context(|| format!("Failed to read tar entries: {}", archive_path.display()))?
    {
        let mut entry = entry
            .with_context(|| format!("Failed to read tar entry: {}", archive_path.display()))?;
        let raw_path = entry
            .path()
            .context("Failed to get entry path")?
            .into_owned();

        let Some(relative) = clean_entry_path(&raw_path) else {
            skip_entry(&raw_path, &mut summary);
            continue;
        };
        let target = dest_dir.join(&relative);
        let mode = entry.header().mode().unwrap_or(DEFAULT_FILE_MODE);
        let entry_type = entry.header().entry_type();

        if !is_confined(root, write_anchor(&target, entry_type == EntryType::Directory)) {
            skip_entry(&raw_path, &mut summary);
            continue;
        }

        match entry_type {
            EntryType::Directory => create_dir(&target, mode)?,
            EntryType::Regular | EntryType::Continuous => {
                write_file(&mut entry, &target, mode)?;
            }
            EntryType::Symlink => {
                let link_target = entry
                    .link_name()
                    .context("Failed to read symlink target")?
                    .with_context(|| format!("Symlink without target: {}", raw_path.display()))?
                    .into_owned();
                create_symlink(&link_target, &target)?;
            }
            EntryType::Link => {
                let link_name = entry
                    .link_name()
                    .context("Failed to read hard link target")?
                    .with_context(|| format!("Hard link without target: {}", raw_path.display()))?
                    .into_owned();
                let source = clean_entry_path(&link_name).map(|source| dest_dir.join(source));
                let Some(source) = source.filter(|source| is_confined(root, source)) else {
                    skip_entry(&link_name, &mut summary);
                    continue;
                };
                create_hard_link(&source, &target)?;
            }
            other => {
                tracing::debug!(path = %raw_path.display(), entry_type = ?other, "ignoring tar entry");
                continue;
            }
        }
        summary.extracted += 1;
    }

    Ok(summary)
}

fn extract_zip(archive_path: &Path, dest_dir: &Path, root: &Path) -> Result<ExtractSummary> {
    let file = std::fs::File::open(archive_path)
        .with_context(|| format!("Failed to open archive: {}", archive_path.display()))?;
    let mut archive = zip::ZipArchive::new(file)
        .with_context(|| format!("Failed to read ZIP archive: {}", archive_path.display()))?;
    let mut summary = ExtractSummary::default();

    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .with_context(|| format!("Failed to read archive entry {i}"))?;
        let raw_path = PathBuf::from(entry.name());

        let Some(relative) = clean_entry_path(&raw_path) else {
            skip_entry(&raw_path, &mut summary);
            continue;
        };
        let target = dest_dir.join(&relative);
        let is_dir = entry.is_dir();
        if !is_confined(root, write_anchor(&target, is_dir)) {
            skip_entry(&raw_path, &mut summary);
            continue;
        }
        let mode = entry
            .unix_mode()
            .map(|mode| mode & 0o7777)
            .unwrap_or(if is_dir { DEFAULT_DIR_MODE } else { DEFAULT_FILE_MODE });

        if is_dir {
            create_dir(&target, mode)?;
        } else {
            write_file(&mut entry, &target, mode)?;
        }
        summary.extracted += 1;
    }

    Ok(summary)
}

fn skip_entry(raw_path: &Path, summary: &mut ExtractSummary) {
    tracing::warn!(path = %raw_path.display(), "skipping archive entry outside destination");
    summary.skipped += 1;
}

fn create_dir(target: &Path, mode: u32) -> Result<()> {
    std::fs::create_dir_all(target)
        .with_context(|| format!("Failed to create directory: {}", target.display()))?;
    set_mode(target, mode)
}

fn create_parent(target: &Path) -> Result<()> {
    if let Some(parent) = target.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    Ok(())
}

fn write_file(reader: &mut impl Read, target: &Path, mode: u32) -> Result<()> {
    create_parent(target)?;
    remove_existing(target)?;
    let mut file = std::fs::File::create(target)
        .with_context(|| format!("Failed to create file: {}", target.display()))?;
    std::io::copy(reader, &mut file)
        .with_context(|| format!("Failed to extract: {}", target.display()))?;
    file.flush()
        .with_context(|| format!("Failed to flush: {}", target.display()))?;
    set_mode(target, mode)
}

/// Removes whatever sits at `target`, without following symlinks.
fn remove_existing(target: &Path) -> Result<()> {
    let Ok(metadata) = std::fs::symlink_metadata(target) else {
        return Ok(());
    };
    let removed = if metadata.is_dir() {
        std::fs::remove_dir_all(target)
    } else {
        std::fs::remove_file(target)
    };
    removed.with_context(|| format!("Failed to replace existing path: {}", target.display()))
}

fn create_hard_link(source: &Path, target: &Path) -> Result<()> {
    create_parent(target)?;
    remove_existing(target)?;
    std::fs::hard_link(source, target).with_context(|| {
        format!(
            "Failed to create hard link {} -> {}",
            target.display(),
            source.display()
        )
    })
}

#[cfg(unix)]
fn create_symlink(link_target: &Path, target: &Path) -> Result<()> {
    create_parent(target)?;
    remove_existing(target)?;
    std::os::unix::fs::symlink(link_target, target).with_context(|| {
        format!(
            "Failed to create symlink {} -> {}",
            target.display(),
            link_target.display()
        )
    })
}

#[cfg(windows)]
fn create_symlink(link_target: &Path, target: &Path) -> Result<()> {
    create_parent(target)?;
    remove_existing(target)?;
    if let Err(e) = std::os::windows::fs::symlink_file(link_target, target) {
        tracing::warn!(
            path = %target.display(),
            link = %link_target.display(),
            error = %e,
            "skipping symlink that cannot be created"
        );
    }
    Ok(())
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode))
        .with_context(|| format!("Failed to set permissions on: {}", path.display()))
}

#[cfg(not(unix))]
#[allow(clippy::unnecessary_wraps)]
fn set_mode(_path: &Path, _mode: u32) -> Result<()> {
    Ok(())
}

/// Locates the directory that directly contains `bin/java`.
///
/// Immediate child directories are tried in name order, each both as-is and
/// as a macOS bundle (`Contents/Home`); `dir` itself is the last candidate.
///
/// # Errors
///
/// Returns [`JvmanError::RuntimeRootNotFound`] when no candidate matches, or
/// an I/O error if `dir` cannot be listed.
pub fn find_runtime_root(dir: &Path) -> Result<PathBuf> {
    let mut children: Vec<PathBuf> = std::fs::read_dir(dir)
        .with_context(|| format!("Failed to read directory: {}", dir.display()))?
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .collect();
    children.sort();

    children
        .iter()
        .find_map(|child| runtime_root_at(child))
        .or_else(|| runtime_root_at(dir))
        .ok_or_else(|| JvmanError::runtime_root_not_found(dir.to_path_buf()).into())
}

fn runtime_root_at(dir: &Path) -> Option<PathBuf> {
    if RuntimePaths::java_binary(dir).is_file() {
        return Some(dir.to_path_buf());
    }
    let bundle_home = dir.join("Contents").join("Home");
    RuntimePaths::java_binary(&bundle_home)
        .is_file()
        .then_some(bundle_home)
}
