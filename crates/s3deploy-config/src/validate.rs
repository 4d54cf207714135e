//! Validation helpers turning a raw document into a `DeployerConfig`.

use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use crate::defaults::{DEFAULT_BUCKET, DEFAULT_DEPLOYMENT_ROOT, DEFAULT_LOG_LEVEL, DEFAULT_REGION};
use crate::error::{ConfigError, ConfigResult};
use crate::model::{AccessKey, ConfigDocument, DeployerConfig, LoggingSettings, StorageSettings};

/// Validate a parsed document and apply defaults.
///
/// # Errors
///
/// Returns `ConfigError::InvalidField` when a required field is missing or a value is
/// malformed.
pub fn validate_document(document: ConfigDocument) -> ConfigResult<DeployerConfig> {
    let access_key_id = required("access_key_id", document.access_key_id)?;
    let secret_access_key = required("secret_access_key", document.secret_access_key)?;
    let region = optional_non_empty("region", document.region)?
        .unwrap_or_else(|| DEFAULT_REGION.to_string());
    let bucket = optional_non_empty("bucket", document.bucket)?
        .unwrap_or_else(|| DEFAULT_BUCKET.to_string());
    let endpoint = document
        .endpoint
        .as_deref()
        .map(parse_endpoint)
        .transpose()?;

    let deployment_root = PathBuf::from(
        optional_non_empty("deployment_root", document.deployment_root)?
            .unwrap_or_else(|| DEFAULT_DEPLOYMENT_ROOT.to_string()),
    );
    if !deployment_root.is_absolute() {
        return Err(ConfigError::invalid(
            "deployment_root",
            "must be an absolute path",
            deployment_root.to_str(),
        ));
    }

    let scratch_dir = optional_non_empty("scratch_dir", document.scratch_dir)?.map(PathBuf::from);

    let connect_timeout = match document.connect_timeout_secs {
        Some(0) => {
            return Err(ConfigError::invalid(
                "connect_timeout_secs",
                "must be greater than zero",
                Some("0"),
            ));
        }
        Some(secs) => Some(Duration::from_secs(secs)),
        None => None,
    };

    let level = optional_non_empty("log_level", document.log_level)?
        .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string());

    Ok(DeployerConfig {
        storage: StorageSettings {
            region,
            bucket,
            endpoint,
            credentials: AccessKey {
                access_key_id,
                secret_access_key,
            },
            connect_timeout,
        },
        deployment_root,
        scratch_dir,
        logging: LoggingSettings {
            level,
            format: document.log_format,
        },
    })
}

fn required(field: &'static str, value: Option<String>) -> ConfigResult<String> {
    optional_non_empty(field, value)?.ok_or_else(|| ConfigError::invalid(field, "is required", None))
}

fn optional_non_empty(field: &'static str, value: Option<String>) -> ConfigResult<Option<String>> {
    match value {
        Some(raw) => {
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                Err(ConfigError::invalid(field, "must not be empty", None))
            } else {
                Ok(Some(trimmed.to_string()))
            }
        }
        None => Ok(None),
    }
}

fn parse_endpoint(raw: &str) -> ConfigResult<Url> {
    let url = Url::parse(raw.trim())
        .map_err(|_| ConfigError::invalid("endpoint", "must be a valid URL", Some(raw)))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::invalid(
            "endpoint",
            "must use http or https",
            Some(raw),
        ));
    }
    if url.host_str().is_none() {
        return Err(ConfigError::invalid("endpoint", "must include a host", Some(raw)));
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::LogFormatSetting;

    fn document() -> ConfigDocument {
        ConfigDocument {
            access_key_id: Some("AKIDEXAMPLE".to_string()),
            secret_access_key: Some("secret".to_string()),
            ..ConfigDocument::default()
        }
    }

    #[test]
    fn defaults_fill_optional_fields() -> anyhow::Result<()> {
        let config = validate_document(document())?;
        assert_eq!(config.storage.region, DEFAULT_REGION);
        assert_eq!(config.storage.bucket, DEFAULT_BUCKET);
        assert!(config.storage.endpoint.is_none());
        assert!(config.storage.connect_timeout.is_none());
        assert_eq!(config.deployment_root, PathBuf::from(DEFAULT_DEPLOYMENT_ROOT));
        assert!(config.scratch_dir.is_none());
        assert_eq!(config.logging.level, DEFAULT_LOG_LEVEL);
        assert!(config.logging.format.is_none());
        Ok(())
    }

    #[test]
    fn missing_credentials_are_rejected() {
        let mut doc = document();
        doc.secret_access_key = None;
        assert!(matches!(
            validate_document(doc),
            Err(ConfigError::InvalidField {
                field: "secret_access_key",
                ..
            })
        ));

        let mut doc = document();
        doc.access_key_id = Some("   ".to_string());
        assert!(matches!(
            validate_document(doc),
            Err(ConfigError::InvalidField {
                field: "access_key_id",
                reason: "must not be empty",
                ..
            })
        ));
    }

    #[test]
    fn relative_deployment_root_is_rejected() {
        let mut doc = document();
        doc.deployment_root = Some("relative/root".to_string());
        assert!(matches!(
            validate_document(doc),
            Err(ConfigError::InvalidField {
                field: "deployment_root",
                ..
            })
        ));
    }

    #[test]
    fn endpoint_must_be_http_url() -> anyhow::Result<()> {
        let mut doc = document();
        doc.endpoint = Some("ftp://storage.local".to_string());
        assert!(validate_document(doc).is_err());

        let mut doc = document();
        doc.endpoint = Some("not a url".to_string());
        assert!(validate_document(doc).is_err());

        let mut doc = document();
        doc.endpoint = Some("http://127.0.0.1:9000".to_string());
        doc.log_format = Some(LogFormatSetting::Json);
        doc.connect_timeout_secs = Some(5);
        let config = validate_document(doc)?;
        assert_eq!(
            config.storage.endpoint.as_ref().map(Url::as_str),
            Some("http://127.0.0.1:9000/")
        );
        assert_eq!(config.storage.connect_timeout, Some(Duration::from_secs(5)));
        assert_eq!(config.logging.format, Some(LogFormatSetting::Json));
        Ok(())
    }

    #[test]
    fn zero_connect_timeout_is_rejected() {
        let mut doc = document();
        doc.connect_timeout_secs = Some(0);
        assert!(validate_document(doc).is_err());
    }
}
