//! Install requests and the on-disk release layout.

use std::path::PathBuf;

use s3deploy_fsops::PermissionPolicy;

use crate::error::{DeployError, DeployResult};

/// Directory under the deployment root holding one directory per version.
pub const RELEASES_DIR: &str = "releases";

/// Extension of release artifacts in the bucket.
pub const ARTIFACT_EXTENSION: &str = "zip";

/// One request to install a version of an application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallRequest {
    application: String,
    version: String,
    scripts: Vec<String>,
    group_writable: bool,
    remove_other_permissions: bool,
}

impl InstallRequest {
    /// Validate the application name and version.
    ///
    /// Both must be non-empty single path segments so the storage key and the release
    /// directory stay inside their roots.
    ///
    /// # Errors
    ///
    /// Returns `DeployError::Usage` naming the offending field.
    pub fn new(application: &str, version: &str) -> DeployResult<Self> {
        Ok(Self {
            application: path_segment("application", application)?,
            version: path_segment("version", version)?,
            scripts: Vec::new(),
            group_writable: false,
            remove_other_permissions: false,
        })
    }

    /// Attach a comma-separated list of release-relative scripts.
    #[must_use]
    pub fn with_scripts(mut self, scripts: Option<&str>) -> Self {
        self.scripts = scripts.map(parse_scripts).unwrap_or_default();
        self
    }

    /// Add the group-write bit to every extracted file.
    #[must_use]
    pub const fn with_group_writable(mut self, enabled: bool) -> Self {
        self.group_writable = enabled;
        self
    }

    /// Strip every "other" permission bit from extracted files.
    #[must_use]
    pub const fn with_remove_other_permissions(mut self, enabled: bool) -> Self {
        self.remove_other_permissions = enabled;
        self
    }

    /// Application name.
    #[must_use]
    pub fn application(&self) -> &str {
        &self.application
    }

    /// Version identifier.
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Parsed script list.
    #[must_use]
    pub fn scripts(&self) -> &[String] {
        &self.scripts
    }

    /// Storage key of the artifact: `<application>/<application>-<version>.zip`.
    #[must_use]
    pub fn storage_key(&self) -> String {
        format!(
            "{app}/{app}-{version}.{ARTIFACT_EXTENSION}",
            app = self.application,
            version = self.version
        )
    }

    /// Permission policy derived from the request flags and script list.
    #[must_use]
    pub fn permission_policy(&self) -> PermissionPolicy {
        PermissionPolicy {
            group_writable: self.group_writable,
            remove_other_permissions: self.remove_other_permissions,
            scripts: self.scripts.clone(),
        }
    }
}

/// Split a comma-separated script list, trimming entries and dropping empty ones.
#[must_use]
pub fn parse_scripts(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(str::to_string)
        .collect()
}

fn path_segment(field: &'static str, value: &str) -> DeployResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DeployError::usage(field, "must not be empty", value));
    }
    if trimmed == "." || trimmed == ".." || trimmed.contains(['/', '\\']) {
        return Err(DeployError::usage(
            field,
            "must be a single path segment",
            value,
        ));
    }
    Ok(trimmed.to_string())
}

/// Where releases live on this host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseLayout {
    deployment_root: PathBuf,
}

impl ReleaseLayout {
    /// Layout rooted at `deployment_root`.
    #[must_use]
    pub fn new(deployment_root: impl Into<PathBuf>) -> Self {
        Self {
            deployment_root: deployment_root.into(),
        }
    }

    /// `<deployment_root>/releases`.
    #[must_use]
    pub fn releases_dir(&self) -> PathBuf {
        self.deployment_root.join(RELEASES_DIR)
    }

    /// `<deployment_root>/releases/<version>`.
    #[must_use]
    pub fn release_location(&self, version: &str) -> PathBuf {
        self.releases_dir().join(version)
    }
}
