//! Temporary directories and zip archive builders.

use std::fs::File;
use std::io::{Cursor, Seek, Write};
use std::path::Path;

use anyhow::{Context, Result};
use tempfile::TempDir;
use zip::ZipWriter;
use zip::write::FileOptions;

/// Create a fresh temporary directory with a recognisable prefix.
///
/// # Errors
///
/// Returns an error when the system temp directory is not writable.
pub fn temp_dir() -> Result<TempDir> {
    tempfile::Builder::new()
        .prefix("s3deploy-test-")
        .tempdir()
        .context("failed to create temp dir")
}

#[derive(Debug, Clone)]
enum FixtureEntry {
    Directory(String),
    File {
        name: String,
        contents: Vec<u8>,
        mode: Option<u32>,
    },
}

/// Builder for zip archives used as release artifacts in tests.
///
/// Entry names are written verbatim, so unsafe names such as `../evil.txt` can be
/// produced on purpose.
#[derive(Debug, Clone, Default)]
pub struct ZipFixture {
    entries: Vec<FixtureEntry>,
}

impl ZipFixture {
    /// Start an empty archive.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a directory entry; a trailing `/` is appended when missing.
    #[must_use]
    pub fn dir(mut self, name: &str) -> Self {
        let name = if name.ends_with('/') {
            name.to_string()
        } else {
            format!("{name}/")
        };
        self.entries.push(FixtureEntry::Directory(name));
        self
    }

    /// Add a regular file entry.
    #[must_use]
    pub fn file(mut self, name: &str, contents: impl AsRef<[u8]>) -> Self {
        self.entries.push(FixtureEntry::File {
            name: name.to_string(),
            contents: contents.as_ref().to_vec(),
            mode: None,
        });
        self
    }

    /// Add a regular file entry recording unix permission bits.
    #[must_use]
    pub fn file_with_mode(mut self, name: &str, contents: impl AsRef<[u8]>, mode: u32) -> Self {
        self.entries.push(FixtureEntry::File {
            name: name.to_string(),
            contents: contents.as_ref().to_vec(),
            mode: Some(mode),
        });
        self
    }

    /// Write the archive to `path`.
    ///
    /// # Errors
    ///
    /// Returns an error when the file cannot be created or the archive cannot be encoded.
    pub fn write_to(&self, path: &Path) -> Result<()> {
        let file = File::create(path)
            .with_context(|| format!("failed to create archive {}", path.display()))?;
        self.encode(file)?;
        Ok(())
    }

    /// Encode the archive in memory.
    ///
    /// # Errors
    ///
    /// Returns an error when the archive cannot be encoded.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(self.encode(Cursor::new(Vec::new()))?.into_inner())
    }

    fn encode<W: Write + Seek>(&self, writer: W) -> Result<W> {
        let mut zip = ZipWriter::new(writer);
        for entry in &self.entries {
            match entry {
                FixtureEntry::Directory(name) => {
                    zip.add_directory(name.as_str(), FileOptions::default())
                        .with_context(|| format!("failed to add directory {name}"))?;
                }
                FixtureEntry::File {
                    name,
                    contents,
                    mode,
                } => {
                    let options = mode.map_or_else(FileOptions::default, |mode| {
                        FileOptions::default().unix_permissions(mode)
                    });
                    zip.start_file(name.as_str(), options)
                        .with_context(|| format!("failed to start entry {name}"))?;
                    zip.write_all(contents)
                        .with_context(|| format!("failed to write entry {name}"))?;
                }
            }
        }
        zip.finish().context("failed to finish archive")
    }
}
