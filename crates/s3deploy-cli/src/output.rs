//! Table and JSON renderers. Command output goes to stdout; logs go to stderr.

use std::io::Write;

use anyhow::Context;
use s3deploy_app::InstallOutcome;

use crate::cli::OutputFormat;
use crate::context::{CliError, CliResult};

pub(crate) fn render_install_outcome(
    out: &mut impl Write,
    outcome: &InstallOutcome,
    format: OutputFormat,
) -> CliResult<()> {
    match format {
        OutputFormat::Json => write_json(out, outcome),
        OutputFormat::Table => write_install_table(out, outcome)
            .context("failed to write output")
            .map_err(CliError::failure),
    }
}

fn write_install_table(out: &mut impl Write, outcome: &InstallOutcome) -> std::io::Result<()> {
    match outcome {
        InstallOutcome::AlreadyInstalled { release } => {
            writeln!(out, "already installed: {}", release.display())
        }
        InstallOutcome::Installed {
            release,
            extraction,
            permissions,
        } => {
            writeln!(out, "installed: {}", release.display())?;
            writeln!(
                out,
                "extracted: {} files, {} directories, {} bytes",
                extraction.files_written, extraction.directories_created, extraction.bytes_written
            )?;
            writeln!(out, "permissions updated: {}", permissions.files_updated)?;
            if !permissions.scripts_marked.is_empty() {
                writeln!(out, "scripts: {}", permissions.scripts_marked.join(", "))?;
            }
            for warning in &permissions.warnings {
                writeln!(out, "warning: {warning}")?;
            }
            Ok(())
        }
    }
}

pub(crate) fn render_key_line(out: &mut impl Write, key: &str) -> CliResult<()> {
    writeln!(out, "{key}")
        .context("failed to write output")
        .map_err(CliError::failure)
}

pub(crate) fn render_keys_json(out: &mut impl Write, keys: &[String]) -> CliResult<()> {
    write_json(out, keys)
}

fn write_json<T: serde::Serialize + ?Sized>(out: &mut impl Write, value: &T) -> CliResult<()> {
    let text = serde_json::to_string_pretty(value)
        .context("failed to format JSON")
        .map_err(CliError::failure)?;
    writeln!(out, "{text}")
        .context("failed to write output")
        .map_err(CliError::failure)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn already_installed_table_names_release() {
        let mut out = Vec::new();
        let outcome = InstallOutcome::AlreadyInstalled {
            release: PathBuf::from("/srv/deploy/releases/1"),
        };
        assert!(render_install_outcome(&mut out, &outcome, OutputFormat::Table).is_ok());
        assert_eq!(
            String::from_utf8_lossy(&out),
            "already installed: /srv/deploy/releases/1\n"
        );
    }

    #[test]
    fn install_outcome_json_is_tagged() -> anyhow::Result<()> {
        let mut out = Vec::new();
        let outcome = InstallOutcome::AlreadyInstalled {
            release: PathBuf::from("/srv/deploy/releases/1"),
        };
        render_install_outcome(&mut out, &outcome, OutputFormat::Json)
            .map_err(|err| anyhow::anyhow!(err.display_message()))?;
        let value: serde_json::Value = serde_json::from_slice(&out)?;
        assert_eq!(value["status"], "already_installed");
        assert_eq!(value["release"], "/srv/deploy/releases/1");
        Ok(())
    }

    #[test]
    fn keys_render_one_per_line_or_as_array() -> anyhow::Result<()> {
        let keys = vec!["app/app-1.zip".to_string(), "app/app-2.zip".to_string()];

        let mut table = Vec::new();
        for key in &keys {
            render_key_line(&mut table, key).map_err(|err| anyhow::anyhow!(err.display_message()))?;
        }
        assert_eq!(String::from_utf8(table)?, "app/app-1.zip\napp/app-2.zip\n");

        let mut json = Vec::new();
        render_keys_json(&mut json, &keys).map_err(|err| anyhow::anyhow!(err.display_message()))?;
        let parsed: Vec<String> = serde_json::from_slice(&json)?;
        assert_eq!(parsed, keys);
        Ok(())
    }
}
