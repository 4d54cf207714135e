//! Lazy, optionally filtered bucket listing.

use std::collections::VecDeque;
use std::iter::FusedIterator;

use regex::Regex;
use s3deploy_storage::ObjectStore;
use tracing::debug;

use crate::error::{DeployError, DeployResult};

/// Lists keys of a bucket through an [`ObjectStore`].
#[derive(Debug, Clone)]
pub struct BucketLister<S> {
    store: S,
}

impl<S: ObjectStore> BucketLister<S> {
    /// Lister backed by `store`.
    pub const fn new(store: S) -> Self {
        Self { store }
    }

    /// Start listing `bucket`, keeping only keys matched by `pattern` when given.
    ///
    /// The pattern is compiled before any storage call. Pages are fetched as the
    /// returned iterator is consumed.
    ///
    /// # Errors
    ///
    /// Returns `DeployError::Usage` when `pattern` is not a valid regular expression.
    pub fn list(&self, bucket: &str, pattern: Option<&str>) -> DeployResult<BucketListing<'_, S>> {
        let matcher = pattern
            .map(|raw| {
                Regex::new(raw)
                    .map_err(|_| DeployError::usage("matching", "invalid regular expression", raw))
            })
            .transpose()?;
        Ok(BucketListing {
            store: &self.store,
            bucket: bucket.to_string(),
            matcher,
            pending: VecDeque::new(),
            cursor: Cursor::Start,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Cursor {
    Start,
    Continue(String),
    Done,
}

/// Keys of one bucket, in storage order.
///
/// Yields `Err` at most once, after which the listing ends. Not restartable.
#[derive(Debug)]
pub struct BucketListing<'a, S> {
    store: &'a S,
    bucket: String,
    matcher: Option<Regex>,
    pending: VecDeque<String>,
    cursor: Cursor,
}

impl<S: ObjectStore> BucketListing<'_, S> {
    fn matches(&self, key: &str) -> bool {
        self.matcher.as_ref().is_none_or(|matcher| matcher.is_match(key))
    }

    fn fetch_page(&mut self) -> DeployResult<()> {
        let continuation = match std::mem::replace(&mut self.cursor, Cursor::Done) {
            Cursor::Start => None,
            Cursor::Continue(token) => Some(token),
            Cursor::Done => return Ok(()),
        };
        let page = self
            .store
            .list_objects(&self.bucket, continuation.as_deref())
            .map_err(|source| DeployError::Storage {
                operation: "list.list_objects",
                source,
            })?;
        debug!(
            bucket = %self.bucket,
            keys = page.keys.len(),
            more = page.next_continuation.is_some(),
            "listing page fetched"
        );
        self.pending.extend(page.keys);
        if let Some(token) = page.next_continuation {
            self.cursor = Cursor::Continue(token);
        }
        Ok(())
    }
}

impl<S: ObjectStore> Iterator for BucketListing<'_, S> {
    type Item = DeployResult<String>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            while let Some(key) = self.pending.pop_front() {
                if self.matches(&key) {
                    return Some(Ok(key));
                }
            }
            if self.cursor == Cursor::Done {
                return None;
            }
            if let Err(err) = self.fetch_page() {
                self.pending.clear();
                return Some(Err(err));
            }
        }
    }
}

impl<S: ObjectStore> FusedIterator for BucketListing<'_, S> {}
