//! Typed configuration models.
//!
//! # Design
//! - `ConfigDocument` mirrors the YAML file one-to-one and is only ever produced by serde.
//! - `DeployerConfig` is the validated form handed to the rest of the workspace; it is
//!   built once at startup and never re-read.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use url::Url;

/// Raw configuration document as written on disk.
#[derive(Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigDocument {
    /// Access key identifier used to sign storage requests.
    pub access_key_id: Option<String>,
    /// Secret paired with `access_key_id`.
    pub secret_access_key: Option<String>,
    /// Storage region (`us-west-1`, `auto`, ...).
    pub region: Option<String>,
    /// Bucket holding release artifacts.
    pub bucket: Option<String>,
    /// Optional S3-compatible endpoint; enables path-style addressing.
    pub endpoint: Option<String>,
    /// Root directory that receives `releases/<version>`.
    pub deployment_root: Option<String>,
    /// Directory used for temporary downloads.
    pub scratch_dir: Option<String>,
    /// Connect timeout applied to the HTTP client.
    pub connect_timeout_secs: Option<u64>,
    /// Log level (`info`, `debug`, ...).
    pub log_level: Option<String>,
    /// Log output format.
    pub log_format: Option<LogFormatSetting>,
}

impl fmt::Debug for ConfigDocument {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("ConfigDocument")
            .field("access_key_id", &self.access_key_id)
            .field(
                "secret_access_key",
                &self.secret_access_key.as_ref().map(|_| "<redacted>"),
            )
            .field("region", &self.region)
            .field("bucket", &self.bucket)
            .field("endpoint", &self.endpoint)
            .field("deployment_root", &self.deployment_root)
            .field("scratch_dir", &self.scratch_dir)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .field("log_level", &self.log_level)
            .field("log_format", &self.log_format)
            .finish()
    }
}

/// Log format requested by the configuration file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormatSetting {
    /// Structured JSON lines.
    Json,
    /// Human-readable output.
    Pretty,
}

/// Validated configuration shared by every command.
#[derive(Debug, Clone)]
pub struct DeployerConfig {
    /// Object storage settings.
    pub storage: StorageSettings,
    /// Root directory that receives `releases/<version>`.
    pub deployment_root: PathBuf,
    /// Directory used for temporary downloads; the system temp dir when unset.
    pub scratch_dir: Option<PathBuf>,
    /// Logging settings.
    pub logging: LoggingSettings,
}

/// Object storage connection settings.
#[derive(Debug, Clone)]
pub struct StorageSettings {
    /// Region used for request signing.
    pub region: String,
    /// Default bucket for installs and listings.
    pub bucket: String,
    /// Optional endpoint override.
    pub endpoint: Option<Url>,
    /// Signing credentials.
    pub credentials: AccessKey,
    /// Optional HTTP connect timeout.
    pub connect_timeout: Option<Duration>,
}

/// Access key pair used to sign storage requests.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessKey {
    /// Access key identifier.
    pub access_key_id: String,
    /// Secret access key.
    pub secret_access_key: String,
}

impl fmt::Debug for AccessKey {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("AccessKey")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .finish()
    }
}

/// Logging preferences sourced from the configuration file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingSettings {
    /// Log level string.
    pub level: String,
    /// Explicit format; inferred from the build profile when unset.
    pub format: Option<LogFormatSetting>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_output_redacts_secrets() {
        let key = AccessKey {
            access_key_id: "AKIDEXAMPLE".to_string(),
            secret_access_key: "wJalrXUtnFEMI".to_string(),
        };
        let rendered = format!("{key:?}");
        assert!(rendered.contains("AKIDEXAMPLE"));
        assert!(!rendered.contains("wJalrXUtnFEMI"));

        let document = ConfigDocument {
            secret_access_key: Some("wJalrXUtnFEMI".to_string()),
            ..ConfigDocument::default()
        };
        assert!(!format!("{document:?}").contains("wJalrXUtnFEMI"));
    }
}
