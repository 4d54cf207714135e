//! The storage capability consumed by the fetcher and the lister.
//!
//! # Design
//! - Two operations only: fetch one object as a byte stream, list one page of keys.
//! - Implementations classify their own failures into `StorageError`.

use std::fmt;
use std::io::{self, Read};

use crate::error::StorageResult;

/// Read-only access to an object storage service.
pub trait ObjectStore {
    /// Open the object stored under `key` in `bucket` for streaming.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` when the key does not exist, and another
    /// `StorageError` variant for every other failure.
    fn get_object(&self, bucket: &str, key: &str) -> StorageResult<ObjectBody>;

    /// List one page of keys in `bucket`, continuing after `continuation` when given.
    ///
    /// # Errors
    ///
    /// Returns a classified `StorageError` when the listing fails.
    fn list_objects(&self, bucket: &str, continuation: Option<&str>) -> StorageResult<ListPage>;
}

impl<T: ObjectStore + ?Sized> ObjectStore for &T {
    fn get_object(&self, bucket: &str, key: &str) -> StorageResult<ObjectBody> {
        (**self).get_object(bucket, key)
    }

    fn list_objects(&self, bucket: &str, continuation: Option<&str>) -> StorageResult<ListPage> {
        (**self).list_objects(bucket, continuation)
    }
}

/// Streaming body of a fetched object. The remote stream is closed when this is dropped.
pub struct ObjectBody {
    reader: Box<dyn Read + Send>,
    content_length: Option<u64>,
}

impl ObjectBody {
    /// Wrap a reader producing the object's bytes.
    #[must_use]
    pub fn new(reader: impl Read + Send + 'static, content_length: Option<u64>) -> Self {
        Self {
            reader: Box::new(reader),
            content_length,
        }
    }

    /// Length advertised by the service, when known.
    #[must_use]
    pub const fn content_length(&self) -> Option<u64> {
        self.content_length
    }
}

impl Read for ObjectBody {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.reader.read(buf)
    }
}

impl fmt::Debug for ObjectBody {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("ObjectBody")
            .field("content_length", &self.content_length)
            .finish_non_exhaustive()
    }
}

/// One page of a bucket listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListPage {
    /// Keys in the order returned by the service.
    pub keys: Vec<String>,
    /// Token for the next page; `None` on the last page.
    pub next_continuation: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn object_body_streams_reader_contents() -> io::Result<()> {
        let mut body = ObjectBody::new(Cursor::new(b"payload".to_vec()), Some(7));
        assert_eq!(body.content_length(), Some(7));
        let mut buffer = String::new();
        body.read_to_string(&mut buffer)?;
        assert_eq!(buffer, "payload");
        assert!(format!("{body:?}").contains("content_length"));
        Ok(())
    }
}
