//! `install <application> <version>`.

use std::io::Write;

use s3deploy_app::{InstallRequest, Installer};
use s3deploy_config::DeployerConfig;
use s3deploy_storage::ObjectStore;

use crate::cli::{InstallArgs, OutputFormat};
use crate::context::CliResult;
use crate::output::render_install_outcome;

pub(crate) fn handle_install<S: ObjectStore>(
    store: S,
    config: &DeployerConfig,
    args: &InstallArgs,
    format: OutputFormat,
    out: &mut impl Write,
) -> CliResult<()> {
    let request = InstallRequest::new(&args.application, &args.version)?
        .with_scripts(args.scripts.as_deref())
        .with_group_writable(args.group_writable)
        .with_remove_other_permissions(args.remove_other);
    let outcome = Installer::new(store, config).install(&request)?;
    render_install_outcome(out, &outcome, format)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    use anyhow::anyhow;
    use s3deploy_config::{AccessKey, LoggingSettings, StorageSettings};
    use s3deploy_test_support::fixtures::{ZipFixture, temp_dir};
    use s3deploy_test_support::mocks::MemoryStore;

    fn config(root: &Path) -> DeployerConfig {
        DeployerConfig {
            storage: StorageSettings {
                region: "us-west-1".to_string(),
                bucket: "releases".to_string(),
                endpoint: None,
                credentials: AccessKey {
                    access_key_id: "AKID".to_string(),
                    secret_access_key: "secret".to_string(),
                },
                connect_timeout: None,
            },
            deployment_root: root.to_path_buf(),
            scratch_dir: None,
            logging: LoggingSettings {
                level: "info".to_string(),
                format: None,
            },
        }
    }

    fn args(version: &str) -> InstallArgs {
        InstallArgs {
            application: "web".to_string(),
            version: version.to_string(),
            scripts: Some("bin/run.sh".to_string()),
            group_writable: false,
            remove_other: false,
        }
    }

    #[test]
    fn installs_then_reports_already_installed() -> anyhow::Result<()> {
        let root = temp_dir()?;
        let archive = ZipFixture::new()
            .file("bin/run.sh", "#!/bin/sh\n")
            .file("README", "web")
            .to_bytes()?;
        let store = MemoryStore::new().with_object("releases", "web/web-7.zip", archive);
        let config = config(root.path());

        let mut first = Vec::new();
        handle_install(&store, &config, &args("7"), OutputFormat::Table, &mut first)
            .map_err(|err| anyhow!(err.display_message()))?;
        let first = String::from_utf8(first)?;
        let release = root.path().join("releases/7");
        assert!(first.starts_with(&format!("installed: {}\n", release.display())), "{first}");
        assert!(first.contains("extracted: 2 files"), "{first}");

        let mut second = Vec::new();
        handle_install(&store, &config, &args("7"), OutputFormat::Json, &mut second)
            .map_err(|err| anyhow!(err.display_message()))?;
        let value: serde_json::Value = serde_json::from_slice(&second)?;
        assert_eq!(value["status"], "already_installed");
        assert_eq!(store.get_calls(), 1);
        Ok(())
    }

    #[test]
    fn missing_artifact_maps_to_not_found_exit() -> anyhow::Result<()> {
        let root = temp_dir()?;
        let store = MemoryStore::new().with_bucket("releases");
        let mut out = Vec::new();
        let err = handle_install(
            &store,
            &config(root.path()),
            &args("absent"),
            OutputFormat::Table,
            &mut out,
        )
        .err()
        .ok_or_else(|| anyhow!("install should fail"))?;
        assert_eq!(err.exit_code(), 4);
        assert!(err.display_message().contains("web version absent"));
        assert!(out.is_empty());
        Ok(())
    }

    #[test]
    fn unsafe_version_is_rejected_before_fetching() -> anyhow::Result<()> {
        let root = temp_dir()?;
        let store = MemoryStore::new().with_bucket("releases");
        let mut out = Vec::new();
        let err = handle_install(
            &store,
            &config(root.path()),
            &args("../1"),
            OutputFormat::Table,
            &mut out,
        )
        .err()
        .ok_or_else(|| anyhow!("install should fail"))?;
        assert_eq!(err.exit_code(), 2);
        assert_eq!(store.get_calls(), 0);
        Ok(())
    }
}
