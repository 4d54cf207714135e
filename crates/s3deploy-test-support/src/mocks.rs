//! In-memory object store with call counters and failure injection.

use std::collections::{BTreeMap, HashMap};
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};

use s3deploy_storage::{ListPage, ObjectBody, ObjectStore, StorageError, StorageErrorKind, StorageResult};

const DEFAULT_PAGE_SIZE: usize = 1000;

/// Object store fake holding buckets in memory.
///
/// Keys are listed in lexicographic order, like S3. Pages are `page_size` keys long and
/// continuation tokens are opaque offsets.
#[derive(Debug)]
pub struct MemoryStore {
    buckets: HashMap<String, BTreeMap<String, Vec<u8>>>,
    page_size: usize,
    get_failure: Option<StorageErrorKind>,
    list_failure: Option<(usize, StorageErrorKind)>,
    get_calls: AtomicUsize,
    list_calls: AtomicUsize,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self {
            buckets: HashMap::new(),
            page_size: DEFAULT_PAGE_SIZE,
            get_failure: None,
            list_failure: None,
            get_calls: AtomicUsize::new(0),
            list_calls: AtomicUsize::new(0),
        }
    }
}

impl MemoryStore {
    /// Empty store without buckets.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create `bucket` if it does not exist yet.
    #[must_use]
    pub fn with_bucket(mut self, bucket: &str) -> Self {
        self.buckets.entry(bucket.to_string()).or_default();
        self
    }

    /// Store `contents` under `key`, creating the bucket when needed.
    #[must_use]
    pub fn with_object(mut self, bucket: &str, key: &str, contents: impl Into<Vec<u8>>) -> Self {
        self.buckets
            .entry(bucket.to_string())
            .or_default()
            .insert(key.to_string(), contents.into());
        self
    }

    /// Number of keys returned per listing page.
    #[must_use]
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Fail every `get_object` call with an error of `kind`.
    #[must_use]
    pub const fn failing_get(mut self, kind: StorageErrorKind) -> Self {
        self.get_failure = Some(kind);
        self
    }

    /// Fail `list_objects` with an error of `kind` once `pages` pages were served.
    #[must_use]
    pub const fn failing_list_after(mut self, pages: usize, kind: StorageErrorKind) -> Self {
        self.list_failure = Some((pages, kind));
        self
    }

    /// Number of `get_object` calls observed.
    #[must_use]
    pub fn get_calls(&self) -> usize {
        self.get_calls.load(Ordering::SeqCst)
    }

    /// Number of `list_objects` calls observed.
    #[must_use]
    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }
}

impl ObjectStore for MemoryStore {
    fn get_object(&self, bucket: &str, key: &str) -> StorageResult<ObjectBody> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(kind) = self.get_failure {
            return Err(injected(kind, bucket, Some(key)));
        }
        let objects = self
            .buckets
            .get(bucket)
            .ok_or_else(|| injected(StorageErrorKind::NoSuchBucket, bucket, None))?;
        let contents = objects
            .get(key)
            .ok_or_else(|| injected(StorageErrorKind::NotFound, bucket, Some(key)))?;
        let length = u64::try_from(contents.len()).ok();
        Ok(ObjectBody::new(Cursor::new(contents.clone()), length))
    }

    fn list_objects(&self, bucket: &str, continuation: Option<&str>) -> StorageResult<ListPage> {
        let served = self.list_calls.fetch_add(1, Ordering::SeqCst);
        if let Some((after, kind)) = self.list_failure
            && served >= after
        {
            return Err(injected(kind, bucket, None));
        }
        let objects = self
            .buckets
            .get(bucket)
            .ok_or_else(|| injected(StorageErrorKind::NoSuchBucket, bucket, None))?;

        let offset = match continuation {
            Some(token) => token.parse::<usize>().map_err(|_| StorageError::InvalidResponse {
                operation: "memory.list_objects",
                reason: "unknown continuation token",
                detail: Some(token.to_string()),
            })?,
            None => 0,
        };
        let keys: Vec<String> = objects
            .keys()
            .skip(offset)
            .take(self.page_size)
            .cloned()
            .collect();
        let next = offset + keys.len();
        let next_continuation = (next < objects.len()).then(|| next.to_string());
        Ok(ListPage {
            keys,
            next_continuation,
        })
    }
}

fn injected(kind: StorageErrorKind, bucket: &str, key: Option<&str>) -> StorageError {
    match kind {
        StorageErrorKind::NotFound => StorageError::NotFound {
            bucket: bucket.to_string(),
            key: key.unwrap_or_default().to_string(),
        },
        StorageErrorKind::NoSuchBucket => StorageError::NoSuchBucket {
            bucket: bucket.to_string(),
        },
        StorageErrorKind::AccessDenied => StorageError::AccessDenied {
            bucket: bucket.to_string(),
            message: Some("Access Denied".to_string()),
        },
        _ => StorageError::Service {
            operation: "memory",
            status: 500,
            code: "InternalError".to_string(),
            message: Some("injected failure".to_string()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    #[test]
    fn serves_objects_and_counts_calls() -> anyhow::Result<()> {
        let store = MemoryStore::new().with_object("releases", "a/a-1.zip", b"zip".to_vec());
        let mut body = store.get_object("releases", "a/a-1.zip")?;
        let mut contents = Vec::new();
        body.read_to_end(&mut contents)?;
        assert_eq!(contents, b"zip");
        assert_eq!(body.content_length(), Some(3));

        let missing = store.get_object("releases", "a/a-2.zip").unwrap_err();
        assert_eq!(missing.kind(), StorageErrorKind::NotFound);
        assert_eq!(store.get_calls(), 2);
        Ok(())
    }

    #[test]
    fn paginates_in_key_order() -> anyhow::Result<()> {
        let store = MemoryStore::new()
            .with_object("b", "c", Vec::new())
            .with_object("b", "a", Vec::new())
            .with_object("b", "b", Vec::new())
            .with_page_size(2);
        let first = store.list_objects("b", None)?;
        assert_eq!(first.keys, vec!["a", "b"]);
        let second = store.list_objects("b", first.next_continuation.as_deref())?;
        assert_eq!(second.keys, vec!["c"]);
        assert!(second.next_continuation.is_none());
        assert_eq!(store.list_calls(), 2);
        Ok(())
    }

    #[test]
    fn injected_list_failure_triggers_after_pages() {
        let store = MemoryStore::new()
            .with_bucket("b")
            .failing_list_after(0, StorageErrorKind::AccessDenied);
        let err = store.list_objects("b", None).unwrap_err();
        assert_eq!(err.kind(), StorageErrorKind::AccessDenied);
        let missing = MemoryStore::new().list_objects("nope", None).unwrap_err();
        assert_eq!(missing.kind(), StorageErrorKind::NoSuchBucket);
    }
}
