//! Zip extraction into a release directory.
//!
//! # Design
//! - The whole entry table is validated before anything is written, including the
//!   destination itself; absolute paths, root or drive prefixes and `..` segments are
//!   rejected so output stays under the destination.
//! - Entries are processed one at a time; each entry reader and output file is dropped
//!   before the next entry is opened.
//! - No rollback: a failure leaves whatever was already written in place.

use std::fs::{self, File};
use std::io;
use std::path::{Component, Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info};
use zip::ZipArchive;

use crate::error::{FsOpsError, FsOpsResult};

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

/// Counters describing what an extraction wrote.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ExtractionSummary {
    /// Directory entries that did not exist before extraction.
    pub directories_created: usize,
    /// Regular files written.
    pub files_written: usize,
    /// Total bytes written across all files.
    pub bytes_written: u64,
}

/// Extract every entry of the zip archive at `archive` beneath `destination`.
///
/// # Errors
///
/// Returns `FsOpsError::InvalidInput` for an entry whose name would escape
/// `destination`, `FsOpsError::Zip` when the archive cannot be decoded, and
/// `FsOpsError::Io` when the filesystem rejects a write.
pub fn extract_archive(archive: &Path, destination: &Path) -> FsOpsResult<ExtractionSummary> {
    let file =
        File::open(archive).map_err(|source| FsOpsError::io("extract_zip.open", archive, source))?;
    let mut zip =
        ZipArchive::new(file).map_err(|source| FsOpsError::zip("extract_zip.decode", archive, source))?;

    let relatives = (0..zip.len())
        .map(|index| {
            let entry = zip
                .by_index(index)
                .map_err(|source| FsOpsError::zip("extract_zip.read_entry", archive, source))?;
            sanitize_archive_path(entry.name())
        })
        .collect::<FsOpsResult<Vec<_>>>()?;

    fs::create_dir_all(destination)
        .map_err(|source| FsOpsError::io("extract_zip.create_root", destination, source))?;

    let mut summary = ExtractionSummary::default();
    for (index, relative) in relatives.iter().enumerate() {
        let mut entry = zip
            .by_index(index)
            .map_err(|source| FsOpsError::zip("extract_zip.read_entry", archive, source))?;
        let target = destination.join(relative);

        if entry.is_dir() {
            if !target.is_dir() {
                fs::create_dir_all(&target)
                    .map_err(|source| FsOpsError::io("extract_zip.create_dir", &target, source))?;
                summary.directories_created += 1;
            }
            continue;
        }

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)
                .map_err(|source| FsOpsError::io("extract_zip.create_parent", parent, source))?;
        }

        let mut output = File::create(&target)
            .map_err(|source| FsOpsError::io("extract_zip.create_file", &target, source))?;
        let written = io::copy(&mut entry, &mut output)
            .map_err(|source| FsOpsError::io("extract_zip.copy", &target, source))?;
        drop(output);

        #[cfg(unix)]
        if let Some(mode) = entry.unix_mode() {
            fs::set_permissions(&target, fs::Permissions::from_mode(mode & 0o777))
                .map_err(|source| FsOpsError::io("extract_zip.set_permissions", &target, source))?;
        }

        debug!(entry = %relative.display(), bytes = written, "entry extracted");
        summary.files_written += 1;
        summary.bytes_written += written;
    }

    info!(
        archive = %archive.display(),
        destination = %destination.display(),
        files = summary.files_written,
        directories = summary.directories_created,
        bytes = summary.bytes_written,
        "archive extracted"
    );
    Ok(summary)
}

fn sanitize_archive_path(entry: &str) -> FsOpsResult<PathBuf> {
    let path = Path::new(entry);
    if path.is_absolute() || entry.starts_with('/') || entry.starts_with('\\') {
        return Err(FsOpsError::invalid_entry("absolute_path", entry));
    }

    let mut sanitized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Normal(segment) => sanitized.push(segment),
            Component::CurDir => {}
            Component::ParentDir => return Err(FsOpsError::invalid_entry("parent_segment", entry)),
            Component::RootDir | Component::Prefix(_) => {
                return Err(FsOpsError::invalid_entry("absolute_path", entry));
            }
        }
    }

    if sanitized.as_os_str().is_empty() {
        return Err(FsOpsError::invalid_entry("empty_path", entry));
    }
    Ok(sanitized)
}
