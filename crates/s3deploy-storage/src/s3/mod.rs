//! S3-compatible object store over blocking HTTP with presigned requests.
//!
//! # Design
//! - Virtual-hosted addressing against AWS; path-style when an explicit endpoint is
//!   configured (`MinIO`, local mocks).
//! - Every request is presigned with `SigV4`; the body is never buffered for `GET`.
//! - Failures are classified from the `<Error>` document, falling back to the status.

pub mod signer;
mod xml;

use std::time::Duration;

use chrono::Utc;
use reqwest::StatusCode;
use reqwest::blocking::{Client, Response};
use s3deploy_config::{AccessKey, StorageSettings};
use tracing::{debug, instrument};
use url::Url;

use crate::error::{StorageError, StorageResult};
use crate::store::{ListPage, ObjectBody, ObjectStore};
use signer::{PRESIGN_EXPIRES_SECS, PresignRequest, presign, uri_encode};

/// Object store backed by the S3 REST API.
#[derive(Debug, Clone)]
pub struct S3Store {
    client: Client,
    region: String,
    endpoint: Option<Url>,
    credentials: AccessKey,
}

impl S3Store {
    /// Build a store from validated storage settings.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Transport` when the HTTP client cannot be constructed.
    ///
    /// Downloads are never cut off by a total timeout; only `connect_timeout` applies.
    pub fn new(settings: &StorageSettings) -> StorageResult<Self> {
        let mut builder = Client::builder()
            .user_agent(concat!(
                env!("CARGO_PKG_NAME"),
                "/",
                env!("CARGO_PKG_VERSION")
            ))
            .timeout(None::<Duration>);
        if let Some(timeout) = settings.connect_timeout {
            builder = builder.connect_timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|source| StorageError::Transport {
                operation: "s3.client_build",
                source,
            })?;
        Ok(Self {
            client,
            region: settings.region.clone(),
            endpoint: settings.endpoint.clone(),
            credentials: settings.credentials.clone(),
        })
    }

    fn bucket_url(&self, bucket: &str) -> StorageResult<Url> {
        if bucket.is_empty() {
            return Err(StorageError::invalid_request("bucket", "must not be empty", bucket));
        }
        match &self.endpoint {
            Some(endpoint) => {
                let mut url = endpoint.clone();
                let base = endpoint.path().trim_end_matches('/');
                url.set_path(&format!("{base}/{}", uri_encode(bucket, true)));
                url.set_query(None);
                Ok(url)
            }
            None => {
                let raw = format!("https://{bucket}.s3.{}.amazonaws.com/", self.region);
                Url::parse(&raw).map_err(|_| {
                    StorageError::invalid_request("bucket", "not a valid host label", bucket)
                })
            }
        }
    }

    fn object_url(&self, bucket: &str, key: &str) -> StorageResult<Url> {
        let mut url = self.bucket_url(bucket)?;
        let base = url.path().trim_end_matches('/').to_string();
        url.set_path(&format!("{base}/{}", uri_encode(key, false)));
        Ok(url)
    }

    fn signed_get(&self, operation: &'static str, url: &Url) -> StorageResult<Response> {
        let signed = presign(
            &self.credentials,
            &PresignRequest {
                method: "GET",
                url,
                region: &self.region,
                time: Utc::now(),
                expires: PRESIGN_EXPIRES_SECS,
            },
        )?;
        self.client
            .get(signed)
            .send()
            .map_err(|source| StorageError::Transport { operation, source })
    }
}

impl ObjectStore for S3Store {
    #[instrument(name = "s3.get_object", skip(self))]
    fn get_object(&self, bucket: &str, key: &str) -> StorageResult<ObjectBody> {
        let url = self.object_url(bucket, key)?;
        let response = self.signed_get("s3.get_object", &url)?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_else(|err| {
                debug!(status = status.as_u16(), error = %err, "error body unreadable");
                String::new()
            });
            return Err(classify_get_failure(bucket, key, status, &body));
        }
        let content_length = response.content_length();
        debug!(status = status.as_u16(), ?content_length, "object stream opened");
        Ok(ObjectBody::new(response, content_length))
    }

    #[instrument(name = "s3.list_objects", skip(self))]
    fn list_objects(&self, bucket: &str, continuation: Option<&str>) -> StorageResult<ListPage> {
        let mut url = self.bucket_url(bucket)?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("list-type", "2");
            if let Some(token) = continuation {
                pairs.append_pair("continuation-token", token);
            }
        }
        let response = self.signed_get("s3.list_objects", &url)?;
        let status = response.status();
        let body = response
            .text()
            .map_err(|source| StorageError::Transport {
                operation: "s3.list_objects",
                source,
            })?;
        if !status.is_success() {
            return Err(classify_list_failure(bucket, status, &body));
        }
        let page = xml::parse_list_result(&body)?;
        debug!(
            keys = page.keys.len(),
            truncated = page.next_continuation.is_some(),
            "listing page received"
        );
        Ok(page)
    }
}

fn classify_get_failure(bucket: &str, key: &str, status: StatusCode, body: &str) -> StorageError {
    if let Some(doc) = xml::parse_error_document(body) {
        return classify_code(bucket, Some(key), "s3.get_object", status, doc);
    }
    match status {
        StatusCode::NOT_FOUND => StorageError::NotFound {
            bucket: bucket.to_string(),
            key: key.to_string(),
        },
        StatusCode::FORBIDDEN => StorageError::AccessDenied {
            bucket: bucket.to_string(),
            message: None,
        },
        _ => status_only("s3.get_object", status),
    }
}

fn classify_list_failure(bucket: &str, status: StatusCode, body: &str) -> StorageError {
    if let Some(doc) = xml::parse_error_document(body) {
        return classify_code(bucket, None, "s3.list_objects", status, doc);
    }
    match status {
        StatusCode::NOT_FOUND => StorageError::NoSuchBucket {
            bucket: bucket.to_string(),
        },
        StatusCode::FORBIDDEN => StorageError::AccessDenied {
            bucket: bucket.to_string(),
            message: None,
        },
        _ => status_only("s3.list_objects", status),
    }
}

fn classify_code(
    bucket: &str,
    key: Option<&str>,
    operation: &'static str,
    status: StatusCode,
    doc: xml::ErrorDocument,
) -> StorageError {
    match (doc.code.as_str(), key) {
        ("NoSuchKey", Some(key)) => StorageError::NotFound {
            bucket: bucket.to_string(),
            key: key.to_string(),
        },
        ("NoSuchBucket", _) => StorageError::NoSuchBucket {
            bucket: bucket.to_string(),
        },
        ("AccessDenied", _) => StorageError::AccessDenied {
            bucket: bucket.to_string(),
            message: doc.message,
        },
        _ => StorageError::Service {
            operation,
            status: status.as_u16(),
            code: doc.code,
            message: doc.message,
        },
    }
}

fn status_only(operation: &'static str, status: StatusCode) -> StorageError {
    StorageError::Service {
        operation,
        status: status.as_u16(),
        code: status
            .canonical_reason()
            .unwrap_or("Unknown")
            .replace(' ', ""),
        message: None,
    }
}
