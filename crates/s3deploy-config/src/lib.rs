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

//! File-backed configuration for the deployer.
//!
//! Layout: `model.rs` (raw document and validated settings), `validate.rs`
//! (field validation), `loader.rs` (reading and parsing the YAML file),
//! `defaults.rs` (fallback values).

pub mod defaults;
pub mod error;
pub mod loader;
pub mod model;
pub mod validate;

pub use defaults::{CONFIG_PATH_ENV, DEFAULT_CONFIG_PATH};
pub use error::{ConfigError, ConfigResult};
pub use loader::{load_config, parse_config, resolve_config_path};
pub use model::{
    AccessKey, ConfigDocument, DeployerConfig, LogFormatSetting, LoggingSettings, StorageSettings,
};
