//! Argument parsing, process setup and command dispatch.

use std::env;
use std::ffi::OsString;
use std::io;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use s3deploy_config::{
    CONFIG_PATH_ENV, DeployerConfig, LogFormatSetting, load_config, resolve_config_path,
};
use s3deploy_storage::S3Store;
use s3deploy_telemetry::{CommandSpan, LogFormat, LoggingConfig, init_logging};
use tracing::info;
use uuid::Uuid;

use crate::commands::{handle_install, handle_listbucket};
use crate::context::{CliError, CliResult, EXIT_SUCCESS};

/// Parses process arguments, executes the requested command and returns the process
/// exit code.
#[must_use]
pub fn run() -> i32 {
    run_with(env::args_os())
}

/// Same as [`run`] with explicit arguments; the first item is the program name.
#[must_use]
pub fn run_with<I, T>(args: I) -> i32
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            return if err.use_stderr() { 2 } else { EXIT_SUCCESS };
        }
    };

    let config_path = resolve_config_path(
        cli.config.as_deref(),
        env::var(CONFIG_PATH_ENV).ok().as_deref(),
    );
    let config = match load_config(&config_path) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("error: {}", err.detail());
            return CliError::failure(err).exit_code();
        }
    };
    install_logging(&cli, &config);

    let trace_id = Uuid::new_v4().to_string();
    let span = CommandSpan::new(cli.command.label(), &trace_id);
    let result = span.in_scope(|| {
        info!(config = %config_path.display(), "command started");
        dispatch(cli, &config)
    });

    match result {
        Ok(()) => EXIT_SUCCESS,
        Err(err) => {
            eprintln!("error: {}", err.display_message());
            err.exit_code()
        }
    }
}

fn install_logging(cli: &Cli, config: &DeployerConfig) {
    let format = match config.logging.format {
        Some(LogFormatSetting::Json) => LogFormat::Json,
        Some(LogFormatSetting::Pretty) => LogFormat::Pretty,
        None => LogFormat::infer(),
    };
    let logging = LoggingConfig {
        level: cli.log_level.as_deref().unwrap_or(&config.logging.level),
        format,
        ..LoggingConfig::default()
    };
    if let Err(err) = init_logging(&logging) {
        eprintln!("warning: logging unavailable: {err}");
    }
}

fn dispatch(cli: Cli, config: &DeployerConfig) -> CliResult<()> {
    let store = S3Store::new(&config.storage)
        .context("failed to build storage client")
        .map_err(CliError::failure)?;
    let mut stdout = io::stdout().lock();

    match cli.command {
        Command::Install(args) => handle_install(&store, config, &args, cli.output, &mut stdout),
        Command::Listbucket(args) => {
            handle_listbucket(&store, config, &args, cli.output, &mut stdout)
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "s3deploy",
    version,
    about = "Install versioned release archives from S3-compatible storage"
)]
pub(crate) struct Cli {
    #[arg(long, global = true, help = "Path to the configuration file")]
    config: Option<PathBuf>,
    #[arg(
        long = "output",
        alias = "format",
        global = true,
        value_enum,
        default_value_t = OutputFormat::Table,
        help = "Select output format for command results"
    )]
    output: OutputFormat,
    #[arg(long, global = true, env = "S3DEPLOY_LOG", help = "Log level or filter directive")]
    log_level: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch, extract and normalise a release unless it is already installed.
    Install(InstallArgs),
    /// List keys in a bucket, optionally filtered by a regular expression.
    #[command(name = "listbucket")]
    Listbucket(ListBucketArgs),
}

impl Command {
    const fn label(&self) -> &'static str {
        match self {
            Self::Install(_) => "install",
            Self::Listbucket(_) => "listbucket",
        }
    }
}

#[derive(Args, Debug)]
pub(crate) struct InstallArgs {
    #[arg(help = "Application name")]
    pub(crate) application: String,
    #[arg(help = "Version identifier, usually a commit hash")]
    pub(crate) version: String,
    #[arg(long, help = "Comma-separated release-relative scripts to mark executable")]
    pub(crate) scripts: Option<String>,
    #[arg(long = "groupwritable", help = "Make every extracted file group-writable")]
    pub(crate) group_writable: bool,
    #[arg(long = "removeother", help = "Strip all permissions for others")]
    pub(crate) remove_other: bool,
}

#[derive(Args, Debug, Default)]
pub(crate) struct ListBucketArgs {
    #[arg(long, help = "Bucket to list (defaults to the configured bucket)")]
    pub(crate) bucket: Option<String>,
    #[arg(long, help = "Only print keys matching this regular expression")]
    pub(crate) matching: Option<String>,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    #[default]
    Table,
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn parses_install_flags() -> anyhow::Result<()> {
        let cli = Cli::try_parse_from([
            "s3deploy",
            "install",
            "web",
            "3f2c1a",
            "--scripts=bin/run.sh,bin/stop.sh",
            "--groupwritable",
            "--removeother",
        ])?;
        let Command::Install(args) = cli.command else {
            anyhow::bail!("expected install");
        };
        assert_eq!(args.application, "web");
        assert_eq!(args.version, "3f2c1a");
        assert_eq!(args.scripts.as_deref(), Some("bin/run.sh,bin/stop.sh"));
        assert!(args.group_writable);
        assert!(args.remove_other);
        assert_eq!(cli.output, OutputFormat::Table);
        Ok(())
    }

    #[test]
    fn parses_listbucket_with_global_options() -> anyhow::Result<()> {
        let cli = Cli::try_parse_from([
            "s3deploy",
            "listbucket",
            "--bucket=archive",
            "--matching=^web/",
            "--output",
            "json",
            "--config",
            "/tmp/s3deploy.yml",
        ])?;
        assert_eq!(cli.output, OutputFormat::Json);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/s3deploy.yml")));
        assert_eq!(cli.command.label(), "listbucket");
        let Command::Listbucket(args) = cli.command else {
            anyhow::bail!("expected listbucket");
        };
        assert_eq!(args.bucket.as_deref(), Some("archive"));
        assert_eq!(args.matching.as_deref(), Some("^web/"));
        Ok(())
    }

    #[test]
    fn install_requires_application_and_version() {
        assert!(Cli::try_parse_from(["s3deploy", "install", "web"]).is_err());
    }

    #[test]
    fn usage_errors_exit_with_two() {
        assert_eq!(run_with(["s3deploy", "deploy"]), 2);
    }

    #[test]
    fn configuration_failures_exit_with_three() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let missing = dir.path().join("absent.yml");
        let code = run_with([
            "s3deploy".into(),
            "--config".into(),
            missing.into_os_string(),
            "listbucket".into(),
        ]);
        assert_eq!(code, 3);

        let invalid = dir.path().join("invalid.yml");
        fs::write(&invalid, "region: us-east-1\n")?;
        let code = run_with([
            OsString::from("s3deploy"),
            OsString::from("--config"),
            invalid.into_os_string(),
            OsString::from("listbucket"),
        ]);
        assert_eq!(code, 3);
        Ok(())
    }

    #[test]
    fn invalid_version_exits_with_two_before_any_request() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let config = dir.path().join("config.yml");
        fs::write(
            &config,
            format!(
                "access_key_id: AKID\nsecret_access_key: secret\nendpoint: http://127.0.0.1:9\ndeployment_root: {}\n",
                dir.path().display()
            ),
        )?;
        let code = run_with([
            OsString::from("s3deploy"),
            OsString::from("--config"),
            config.into_os_string(),
            OsString::from("install"),
            OsString::from("web"),
            OsString::from("../escape"),
        ]);
        assert_eq!(code, 2);
        Ok(())
    }
}
