//! Artifact download into a scratch file.
//!
//! # Design
//! - The object body is streamed through a fixed 8 KiB buffer; artifacts are never held
//!   in memory.
//! - The body is owned by `fetch` and dropped exactly once, on every exit path.
//! - The download lives in a [`TempPath`] and is removed when the caller drops it.

use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use s3deploy_storage::ObjectStore;
use tempfile::{NamedTempFile, TempPath};
use tracing::{info, instrument};

use crate::error::{DeployError, DeployResult};
use crate::model::InstallRequest;

/// Read buffer size used while streaming an artifact to disk.
pub const COPY_BUFFER_SIZE: usize = 8 * 1024;

/// A downloaded artifact, deleted from disk when dropped.
#[derive(Debug)]
pub struct FetchedArtifact {
    path: TempPath,
    key: String,
    bytes: u64,
}

impl FetchedArtifact {
    /// Local path of the download.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Storage key the artifact was fetched from.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Number of bytes written.
    #[must_use]
    pub const fn bytes(&self) -> u64 {
        self.bytes
    }
}

/// Downloads release artifacts from one bucket.
#[derive(Debug, Clone)]
pub struct ArtifactFetcher<S> {
    store: S,
    bucket: String,
    scratch_dir: Option<PathBuf>,
}

impl<S: ObjectStore> ArtifactFetcher<S> {
    /// Fetcher reading from `bucket`, downloading into `scratch_dir` or the system temp
    /// directory.
    pub fn new(store: S, bucket: impl Into<String>, scratch_dir: Option<PathBuf>) -> Self {
        Self {
            store,
            bucket: bucket.into(),
            scratch_dir,
        }
    }

    /// Download the artifact for `request`.
    ///
    /// # Errors
    ///
    /// Returns `DeployError::NotFound` when no artifact exists for the request,
    /// `DeployError::Storage` for any other storage failure and `DeployError::LocalIo`
    /// when the download cannot be written.
    #[instrument(name = "fetch", skip(self, request), fields(bucket = %self.bucket, key = tracing::field::Empty))]
    pub fn fetch(&self, request: &InstallRequest) -> DeployResult<FetchedArtifact> {
        let key = request.storage_key();
        tracing::Span::current().record("key", key.as_str());

        let mut body = self.store.get_object(&self.bucket, &key).map_err(|source| {
            if source.is_not_found() {
                DeployError::NotFound {
                    application: request.application().to_string(),
                    version: request.version().to_string(),
                    bucket: self.bucket.clone(),
                    key: key.clone(),
                }
            } else {
                DeployError::Storage {
                    operation: "fetch.get_object",
                    source,
                }
            }
        })?;

        let scratch = self.scratch_dir.clone().unwrap_or_else(std::env::temp_dir);
        let file = tempfile::Builder::new()
            .prefix("s3deploy-")
            .suffix(".zip")
            .tempfile_in(&scratch)
            .map_err(|source| DeployError::io("fetch.create_temp", &scratch, source))?;

        let (file, bytes) = stream_to_file(&mut body, file)?;
        drop(body);

        info!(
            bucket = %self.bucket,
            key = %key,
            bytes,
            path = %file.path().display(),
            "artifact downloaded"
        );
        Ok(FetchedArtifact {
            path: file.into_temp_path(),
            key,
            bytes,
        })
    }
}

fn stream_to_file(
    body: &mut impl Read,
    file: NamedTempFile,
) -> DeployResult<(NamedTempFile, u64)> {
    let path = file.path().to_path_buf();
    let mut writer = BufWriter::new(file);
    let bytes = copy_stream(body, &mut writer).map_err(|err| match err {
        CopyError::Read(source) => DeployError::io("fetch.read_body", &path, source),
        CopyError::Write(source) => DeployError::io("fetch.write_file", &path, source),
    })?;
    let file = writer
        .into_inner()
        .map_err(|err| DeployError::io("fetch.flush", &path, err.into_error()))?;
    Ok((file, bytes))
}

#[derive(Debug)]
enum CopyError {
    Read(io::Error),
    Write(io::Error),
}

fn copy_stream(reader: &mut impl Read, writer: &mut impl Write) -> Result<u64, CopyError> {
    let mut buffer = [0_u8; COPY_BUFFER_SIZE];
    let mut total = 0_u64;
    loop {
        let read = match reader.read(&mut buffer) {
            Ok(0) => return Ok(total),
            Ok(read) => read,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(CopyError::Read(err)),
        };
        writer.write_all(&buffer[..read]).map_err(CopyError::Write)?;
        total += read as u64;
    }
}
