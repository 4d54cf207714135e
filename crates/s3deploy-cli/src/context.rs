//! CLI error type and exit-code mapping.

use std::fmt::{self, Display, Formatter};

use s3deploy_app::{DeployError, ErrorKind};

/// Exit code for a successful command, including an already-installed release.
pub(crate) const EXIT_SUCCESS: i32 = 0;

/// Errors surfaced to the user by the CLI.
#[derive(Debug)]
pub(crate) enum CliError {
    Validation(String),
    NotFound(String),
    Failure(anyhow::Error),
}

/// Convenience alias for functions returning a `CliError`.
pub(crate) type CliResult<T> = Result<T, CliError>;

impl CliError {
    pub(crate) fn failure(error: impl Into<anyhow::Error>) -> Self {
        Self::Failure(error.into())
    }

    pub(crate) const fn exit_code(&self) -> i32 {
        match self {
            Self::Validation(_) => 2,
            Self::Failure(_) => 3,
            Self::NotFound(_) => 4,
        }
    }

    pub(crate) fn display_message(&self) -> String {
        match self {
            Self::Validation(message) | Self::NotFound(message) => message.clone(),
            Self::Failure(error) => format!("{error:#}"),
        }
    }
}

impl Display for CliError {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str("cli error")
    }
}

impl std::error::Error for CliError {}

impl From<DeployError> for CliError {
    fn from(error: DeployError) -> Self {
        match error.kind() {
            ErrorKind::Usage => Self::Validation(error.detail()),
            ErrorKind::NotFound => Self::NotFound(error.detail()),
            ErrorKind::Storage | ErrorKind::LocalIo => {
                Self::Failure(anyhow::Error::msg(error.detail()))
            }
        }
    }
}
