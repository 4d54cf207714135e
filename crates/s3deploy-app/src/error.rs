//! # Design
//!
//! - One error type for the install and listing paths, classified into a closed
//!   [`ErrorKind`] so the CLI maps outcomes to exit codes without matching variants.
//! - Lower-layer errors are kept as sources; `detail` renders them for operators.

use std::io;
use std::path::PathBuf;

use s3deploy_fsops::FsOpsError;
use s3deploy_storage::StorageError;
use thiserror::Error;

/// Result alias for install and listing operations.
pub type DeployResult<T> = Result<T, DeployError>;

/// Coarse failure classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The requested artifact does not exist.
    NotFound,
    /// The storage service failed or refused the request.
    Storage,
    /// A local filesystem operation failed.
    LocalIo,
    /// The caller supplied invalid input.
    Usage,
}

/// Errors produced while installing a release or listing a bucket.
#[derive(Debug, Error)]
pub enum DeployError {
    /// No artifact exists for the requested application and version.
    #[error("no artifact for {application} version {version} (s3://{bucket}/{key})")]
    NotFound {
        /// Application name.
        application: String,
        /// Requested version.
        version: String,
        /// Bucket that was queried.
        bucket: String,
        /// Storage key that was requested.
        key: String,
    },
    /// The storage service failed.
    #[error("storage request failed")]
    Storage {
        /// Operation identifier.
        operation: &'static str,
        /// Classified storage failure.
        source: StorageError,
    },
    /// A local filesystem operation failed.
    #[error("local filesystem operation failed")]
    LocalIo {
        /// Operation identifier.
        operation: &'static str,
        /// Path involved.
        path: PathBuf,
        /// Underlying IO error.
        source: io::Error,
    },
    /// The archive could not be extracted.
    #[error("archive extraction failed")]
    Extract {
        /// Release directory being populated.
        release: PathBuf,
        /// Underlying extraction failure.
        source: FsOpsError,
    },
    /// The caller supplied invalid input.
    #[error("invalid {field}: {reason}")]
    Usage {
        /// Field that failed validation.
        field: &'static str,
        /// Static reason for the failure.
        reason: &'static str,
        /// Offending value when available.
        value: Option<String>,
    },
}

impl DeployError {
    /// Classify this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Storage { .. } => ErrorKind::Storage,
            Self::LocalIo { .. } | Self::Extract { .. } => ErrorKind::LocalIo,
            Self::Usage { .. } => ErrorKind::Usage,
        }
    }

    /// Operator-facing description including the structured context and source.
    #[must_use]
    pub fn detail(&self) -> String {
        match self {
            Self::NotFound { .. } => self.to_string(),
            Self::Storage { operation, source } => match source.service_message() {
                Some(message) => format!("{operation}: {source}: {message}"),
                None => format!("{operation}: {source}"),
            },
            Self::LocalIo {
                operation,
                path,
                source,
            } => format!("{operation} failed for {}: {source}", path.display()),
            Self::Extract { release, source } => {
                format!("extracting into {}: {}", release.display(), source.detail())
            }
            Self::Usage { value: Some(value), .. } => format!("{self} ('{value}')"),
            Self::Usage { value: None, .. } => self.to_string(),
        }
    }

    pub(crate) fn usage(field: &'static str, reason: &'static str, value: &str) -> Self {
        Self::Usage {
            field,
            reason,
            value: Some(value.to_string()),
        }
    }

    pub(crate) fn io(operation: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::LocalIo {
            operation,
            path: path.into(),
            source,
        }
    }
}
