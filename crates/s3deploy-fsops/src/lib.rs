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

//! Filesystem stages of a release install: unpacking the downloaded archive into the
//! release directory and normalising the permissions of what was unpacked.

pub mod error;
pub mod extract;
pub mod permissions;

pub use error::{FsOpsError, FsOpsResult};
pub use extract::{ExtractionSummary, extract_archive};
pub use permissions::{PermissionPolicy, PermissionReport, PermissionWarning, normalize};
