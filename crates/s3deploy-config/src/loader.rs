//! Reads the YAML configuration file once at process start.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::defaults::DEFAULT_CONFIG_PATH;
use crate::error::{ConfigError, ConfigResult};
use crate::model::{ConfigDocument, DeployerConfig};
use crate::validate::validate_document;

/// Pick the configuration file: explicit flag, then environment value, then the default.
#[must_use]
pub fn resolve_config_path(explicit: Option<&Path>, env_value: Option<&str>) -> PathBuf {
    explicit.map_or_else(
        || {
            env_value
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from)
        },
        Path::to_path_buf,
    )
}

/// Read, parse, and validate the configuration file at `path`.
///
/// # Errors
///
/// Returns `ConfigError::Io` when the file cannot be read, `ConfigError::Parse` when it
/// is not a valid document, and `ConfigError::InvalidField` when validation fails.
pub fn load_config(path: &Path) -> ConfigResult<DeployerConfig> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        operation: "config.read",
        path: path.to_path_buf(),
        source,
    })?;
    let config = parse_config(&contents, path)?;
    debug!(path = %path.display(), bucket = %config.storage.bucket, "configuration loaded");
    Ok(config)
}

/// Parse and validate configuration text; `origin` is used for error reporting only.
///
/// # Errors
///
/// Returns `ConfigError::Parse` or `ConfigError::InvalidField`.
pub fn parse_config(contents: &str, origin: &Path) -> ConfigResult<DeployerConfig> {
    let document: ConfigDocument =
        serde_yaml::from_str(contents).map_err(|source| ConfigError::Parse {
            path: origin.to_path_buf(),
            source,
        })?;
    validate_document(document)
}
