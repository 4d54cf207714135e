//! # Design
//!
//! - Configuration failures are fatal at startup; keep them structured so the CLI can
//!   report the offending file and field.
//! - Keep error messages constant; context lives in fields.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Convenience alias for configuration results.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors raised while loading or validating the deployer configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read configuration file")]
    Io {
        /// Operation identifier.
        operation: &'static str,
        /// File that could not be read.
        path: PathBuf,
        /// Underlying IO error.
        source: io::Error,
    },
    /// The configuration file was not valid YAML or did not match the schema.
    #[error("failed to parse configuration file")]
    Parse {
        /// File that failed to parse.
        path: PathBuf,
        /// Underlying YAML error.
        source: serde_yaml::Error,
    },
    /// A field contained an invalid value.
    #[error("invalid configuration field")]
    InvalidField {
        /// Field that failed validation.
        field: &'static str,
        /// Machine-readable reason for the failure.
        reason: &'static str,
        /// Offending value when it is safe to echo.
        value: Option<String>,
    },
}

impl ConfigError {
    pub(crate) fn invalid(field: &'static str, reason: &'static str, value: Option<&str>) -> Self {
        Self::InvalidField {
            field,
            reason,
            value: value.map(str::to_string),
        }
    }

    /// Human-readable description including the offending field or file.
    #[must_use]
    pub fn detail(&self) -> String {
        match self {
            Self::Io { path, source, .. } => {
                format!("cannot read {}: {source}", path.display())
            }
            Self::Parse { path, source } => format!("{}: {source}", path.display()),
            Self::InvalidField {
                field,
                reason,
                value: Some(value),
            } => format!("field '{field}' {reason} (got '{value}')"),
            Self::InvalidField {
                field,
                reason,
                value: None,
            } => format!("field '{field}' {reason}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn detail_names_field_and_value() {
        let err = ConfigError::invalid("region", "must not be empty", Some(" "));
        assert_eq!(err.detail(), "field 'region' must not be empty (got ' ')");
        assert!(err.source().is_none());

        let err = ConfigError::invalid("secret_access_key", "is required", None);
        assert_eq!(err.detail(), "field 'secret_access_key' is required");
    }

    #[test]
    fn io_error_preserves_source() {
        let err = ConfigError::Io {
            operation: "config.read",
            path: PathBuf::from("/missing.yml"),
            source: io::Error::new(io::ErrorKind::NotFound, "gone"),
        };
        assert!(err.source().is_some());
        assert!(err.detail().contains("/missing.yml"));
    }
}
