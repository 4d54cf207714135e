//! Fallback values applied when the configuration file omits a field.

/// Configuration file consulted when neither a flag nor the environment names one.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/s3deploy/config.yml";
/// Environment variable overriding the configuration file location.
pub const CONFIG_PATH_ENV: &str = "S3DEPLOY_CONFIG";
/// Region used for request signing when none is configured.
pub const DEFAULT_REGION: &str = "us-west-1";
/// Bucket holding release artifacts when none is configured.
pub const DEFAULT_BUCKET: &str = "releases";
/// Root directory under which `releases/<version>` directories are created.
pub const DEFAULT_DEPLOYMENT_ROOT: &str = "/srv/deploy";
/// Log level used when neither the file nor `RUST_LOG` sets one.
pub const DEFAULT_LOG_LEVEL: &str = "info";
