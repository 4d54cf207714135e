#![forbid(unsafe_code)]
#![deny(
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![allow(clippy::module_name_repetitions)]

//! Object storage capability consumed by the deployer.
//!
//! Layout: `store.rs` (the `ObjectStore` trait and its value types), `error.rs`
//! (classified storage failures), `s3/` (S3 adapter: addressing, SigV4 presigning,
//! XML response parsing).

pub mod error;
pub mod s3;
pub mod store;

pub use error::{StorageError, StorageErrorKind, StorageResult};
pub use s3::S3Store;
pub use store::{ListPage, ObjectBody, ObjectStore};
