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

//! Release installation and bucket discovery.
//!
//! Layout: `model.rs` (requests and release layout), `error.rs` (`DeployError`),
//! `fetch.rs` (artifact download), `orchestrator.rs` (install state machine),
//! `lister.rs` (lazy, filtered bucket listing).

pub mod error;
pub mod fetch;
pub mod lister;
pub mod model;
pub mod orchestrator;

pub use error::{DeployError, DeployResult, ErrorKind};
pub use fetch::{ArtifactFetcher, FetchedArtifact};
pub use lister::{BucketLister, BucketListing};
pub use model::{InstallRequest, ReleaseLayout, parse_scripts};
pub use orchestrator::{InstallOutcome, InstallStage, Installer};
