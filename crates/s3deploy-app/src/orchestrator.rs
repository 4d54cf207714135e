//! Install state machine: check existing, fetch, extract, normalise.
//!
//! # Design
//! - Stages run in strict sequence; the first failure ends the install.
//! - An existing release directory is proof of a completed install and short-circuits
//!   before any storage call.
//! - Permission warnings are reported in the outcome, never escalated.

use std::path::{Path, PathBuf};

use s3deploy_config::DeployerConfig;
use s3deploy_fsops::{ExtractionSummary, PermissionReport, extract_archive, normalize};
use s3deploy_storage::ObjectStore;
use serde::Serialize;
use tracing::{error, info, instrument};

use crate::error::{DeployError, DeployResult};
use crate::fetch::ArtifactFetcher;
use crate::model::{InstallRequest, ReleaseLayout};

/// Stages of an install, in execution order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InstallStage {
    /// Look for an existing release directory.
    CheckExisting,
    /// Download the artifact.
    Fetch,
    /// Unpack the artifact into the release directory.
    Extract,
    /// Normalise file permissions.
    Normalize,
}

impl InstallStage {
    /// Label used in logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CheckExisting => "check_existing",
            Self::Fetch => "fetch",
            Self::Extract => "extract",
            Self::Normalize => "normalize",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum StageStatus {
    Started,
    Completed,
    Skipped,
    Failed,
}

impl StageStatus {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Started => "started",
            Self::Completed => "completed",
            Self::Skipped => "skipped",
            Self::Failed => "failed",
        }
    }
}

/// Result of a successful install call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum InstallOutcome {
    /// The release directory already existed; nothing was done.
    AlreadyInstalled {
        /// Existing release directory.
        release: PathBuf,
    },
    /// The artifact was fetched, extracted and normalised.
    Installed {
        /// Populated release directory.
        release: PathBuf,
        /// What extraction wrote.
        extraction: ExtractionSummary,
        /// What permission normalisation changed and warned about.
        permissions: PermissionReport,
    },
}

impl InstallOutcome {
    /// Release directory the outcome refers to.
    #[must_use]
    pub fn release(&self) -> &Path {
        match self {
            Self::AlreadyInstalled { release } | Self::Installed { release, .. } => release,
        }
    }
}

/// Installs releases from one bucket into one deployment root.
#[derive(Debug, Clone)]
pub struct Installer<S> {
    fetcher: ArtifactFetcher<S>,
    layout: ReleaseLayout,
}

impl<S: ObjectStore> Installer<S> {
    /// Installer wired from the process configuration.
    pub fn new(store: S, config: &DeployerConfig) -> Self {
        Self::from_parts(
            ArtifactFetcher::new(store, config.storage.bucket.clone(), config.scratch_dir.clone()),
            ReleaseLayout::new(config.deployment_root.clone()),
        )
    }

    /// Installer from an explicit fetcher and layout.
    pub const fn from_parts(fetcher: ArtifactFetcher<S>, layout: ReleaseLayout) -> Self {
        Self { fetcher, layout }
    }

    /// Install the release described by `request`.
    ///
    /// # Errors
    ///
    /// Returns `DeployError::NotFound` when the artifact does not exist,
    /// `DeployError::Storage` for other storage failures, `DeployError::LocalIo` when the
    /// release root cannot be inspected or the download cannot be written, and
    /// `DeployError::Extract` when the archive cannot be unpacked. Extraction output is
    /// not rolled back.
    #[instrument(
        name = "install",
        skip(self, request),
        fields(application = %request.application(), version = %request.version())
    )]
    pub fn install(&self, request: &InstallRequest) -> DeployResult<InstallOutcome> {
        let release = self.layout.release_location(request.version());

        let exists = run_stage(InstallStage::CheckExisting, || {
            release
                .try_exists()
                .map_err(|source| DeployError::io("install.check_existing", &release, source))
        })?;
        if exists {
            log_stage(InstallStage::Fetch, StageStatus::Skipped);
            info!(release = %release.display(), "release already installed");
            return Ok(InstallOutcome::AlreadyInstalled { release });
        }

        let artifact = run_stage(InstallStage::Fetch, || self.fetcher.fetch(request))?;

        let extraction = run_stage(InstallStage::Extract, || {
            extract_archive(artifact.path(), &release).map_err(|source| DeployError::Extract {
                release: release.clone(),
                source,
            })
        })?;
        drop(artifact);

        let policy = request.permission_policy();
        let permissions = run_stage(InstallStage::Normalize, || {
            Ok::<_, DeployError>(normalize(&release, &policy))
        })?;

        info!(
            release = %release.display(),
            files = extraction.files_written,
            warnings = permissions.warnings.len(),
            "release installed"
        );
        Ok(InstallOutcome::Installed {
            release,
            extraction,
            permissions,
        })
    }
}

fn run_stage<T>(
    stage: InstallStage,
    op: impl FnOnce() -> DeployResult<T>,
) -> DeployResult<T> {
    log_stage(stage, StageStatus::Started);
    match op() {
        Ok(value) => {
            log_stage(stage, StageStatus::Completed);
            Ok(value)
        }
        Err(err) => {
            error!(
                stage = stage.as_str(),
                status = StageStatus::Failed.as_str(),
                error = %err.detail(),
                "install stage failed"
            );
            Err(err)
        }
    }
}

fn log_stage(stage: InstallStage, status: StageStatus) {
    info!(stage = stage.as_str(), status = status.as_str(), "install stage");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use s3deploy_test_support::fixtures::{ZipFixture, temp_dir};
    use s3deploy_test_support::mocks::MemoryStore;
    use std::fs;

    fn installer<'a>(store: &'a MemoryStore, root: &Path) -> Installer<&'a MemoryStore> {
        Installer::from_parts(
            ArtifactFetcher::new(store, "releases", None),
            ReleaseLayout::new(root),
        )
    }

    #[test]
    fn stage_labels_are_stable() {
        let labels: Vec<_> = [
            InstallStage::CheckExisting,
            InstallStage::Fetch,
            InstallStage::Extract,
            InstallStage::Normalize,
        ]
        .into_iter()
        .map(InstallStage::as_str)
        .collect();
        assert_eq!(labels, ["check_existing", "fetch", "extract", "normalize"]);
    }

    #[test]
    fn existing_release_short_circuits_without_fetching() -> anyhow::Result<()> {
        let root = temp_dir()?;
        let store = MemoryStore::new().with_bucket("releases");
        fs::create_dir_all(root.path().join("releases/7"))?;

        let outcome = installer(&store, root.path()).install(&InstallRequest::new("web", "7")?)?;
        assert_eq!(
            outcome,
            InstallOutcome::AlreadyInstalled {
                release: root.path().join("releases/7")
            }
        );
        assert_eq!(store.get_calls(), 0);
        Ok(())
    }

    #[test]
    fn install_extracts_into_release_location() -> anyhow::Result<()> {
        let root = temp_dir()?;
        let archive = ZipFixture::new()
            .file("a.txt", "hello")
            .file("dir/b.sh", "echo hi")
            .to_bytes()?;
        let store = MemoryStore::new().with_object("releases", "web/web-1.zip", archive);

        let outcome = installer(&store, root.path()).install(&InstallRequest::new("web", "1")?)?;
        let release = root.path().join("releases/1");
        assert_eq!(outcome.release(), release.as_path());
        let InstallOutcome::Installed { extraction, .. } = outcome else {
            anyhow::bail!("expected a fresh install");
        };
        assert_eq!(extraction.files_written, 2);
        assert_eq!(fs::read_to_string(release.join("a.txt"))?, "hello");
        assert_eq!(fs::read_to_string(release.join("dir/b.sh"))?, "echo hi");
        assert!(release.join("dir").is_dir());

        let names = |dir: &Path| -> anyhow::Result<Vec<String>> {
            let mut names = fs::read_dir(dir)?
                .map(|entry| Ok(entry?.file_name().to_string_lossy().into_owned()))
                .collect::<anyhow::Result<Vec<_>>>()?;
            names.sort();
            Ok(names)
        };
        assert_eq!(names(&release)?, ["a.txt", "dir"]);
        assert_eq!(names(&release.join("dir"))?, ["b.sh"]);
        Ok(())
    }

    #[test]
    fn corrupt_artifact_is_an_extract_error() -> anyhow::Result<()> {
        let root = temp_dir()?;
        let store = MemoryStore::new().with_object("releases", "web/web-1.zip", b"nope".to_vec());
        let err = installer(&store, root.path())
            .install(&InstallRequest::new("web", "1")?)
            .unwrap_err();
        assert!(matches!(err, DeployError::Extract { .. }));
        assert_eq!(err.kind(), ErrorKind::LocalIo);
        Ok(())
    }
}
