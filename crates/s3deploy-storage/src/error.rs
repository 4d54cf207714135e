//! # Design
//!
//! - Classify backend failures into a small closed set so callers never inspect
//!   service-specific codes.
//! - Keep the service code and message when the backend supplied them.

use thiserror::Error;

/// Result alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Coarse classification of a storage failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageErrorKind {
    /// The requested object does not exist.
    NotFound,
    /// The bucket does not exist.
    NoSuchBucket,
    /// Credentials lack permission for the request.
    AccessDenied,
    /// Any other service-reported failure.
    Service,
    /// The request never produced a response.
    Transport,
    /// The response could not be understood.
    InvalidResponse,
    /// The request could not be built or signed.
    InvalidRequest,
}

/// Errors produced by an object store.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The requested object does not exist.
    #[error("object '{key}' not found in bucket '{bucket}'")]
    NotFound {
        /// Bucket that was queried.
        bucket: String,
        /// Key that was requested.
        key: String,
    },
    /// The bucket does not exist.
    #[error("bucket '{bucket}' does not exist")]
    NoSuchBucket {
        /// Bucket that was queried.
        bucket: String,
    },
    /// Credentials lack permission for the request.
    #[error("access denied to bucket '{bucket}'")]
    AccessDenied {
        /// Bucket that was queried.
        bucket: String,
        /// Service message when supplied.
        message: Option<String>,
    },
    /// Any other service-reported failure.
    #[error("storage service error {code} (status {status})")]
    Service {
        /// Operation identifier.
        operation: &'static str,
        /// HTTP status returned by the service.
        status: u16,
        /// Service error code, or the HTTP reason when none was supplied.
        code: String,
        /// Service message when supplied.
        message: Option<String>,
    },
    /// The HTTP request failed before a response was received.
    #[error("storage request failed")]
    Transport {
        /// Operation identifier.
        operation: &'static str,
        /// Underlying HTTP client error.
        source: reqwest::Error,
    },
    /// The response body could not be parsed.
    #[error("unexpected storage response")]
    InvalidResponse {
        /// Operation identifier.
        operation: &'static str,
        /// Static reason for the failure.
        reason: &'static str,
        /// Parser detail when available.
        detail: Option<String>,
    },
    /// The request could not be built.
    #[error("invalid storage request")]
    InvalidRequest {
        /// Field that was invalid.
        field: &'static str,
        /// Static reason for the failure.
        reason: &'static str,
        /// Offending value when available.
        value: Option<String>,
    },
}

impl StorageError {
    /// Classify this error.
    #[must_use]
    pub const fn kind(&self) -> StorageErrorKind {
        match self {
            Self::NotFound { .. } => StorageErrorKind::NotFound,
            Self::NoSuchBucket { .. } => StorageErrorKind::NoSuchBucket,
            Self::AccessDenied { .. } => StorageErrorKind::AccessDenied,
            Self::Service { .. } => StorageErrorKind::Service,
            Self::Transport { .. } => StorageErrorKind::Transport,
            Self::InvalidResponse { .. } => StorageErrorKind::InvalidResponse,
            Self::InvalidRequest { .. } => StorageErrorKind::InvalidRequest,
        }
    }

    /// Whether this error means the requested object is absent.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Service message attached to the failure, if any.
    #[must_use]
    pub fn service_message(&self) -> Option<&str> {
        match self {
            Self::AccessDenied { message, .. } | Self::Service { message, .. } => {
                message.as_deref()
            }
            _ => None,
        }
    }

    pub(crate) fn invalid_request(
        field: &'static str,
        reason: &'static str,
        value: impl Into<String>,
    ) -> Self {
        Self::InvalidRequest {
            field,
            reason,
            value: Some(value.into()),
        }
    }
}
