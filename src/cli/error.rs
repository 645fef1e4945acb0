//! CLI-level errors (wraps infrastructure errors)

use thiserror::Error;

use crate::exitcode;
use crate::infrastructure::InfraError;

/// CLI errors are the top-level error type.
/// These are what get displayed to the user.
#[derive(Error, Debug)]
pub enum CliError {
    #[error("{0}")]
    Infra(#[from] InfraError),

    /// Structural parse failure or failed option validator.
    #[error("{0}")]
    InvalidArgs(String),
}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

impl CliError {
    /// Get the appropriate exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::InvalidArgs(_) => exitcode::VALIDATION_OR_CLIENT_ERROR,
            CliError::Infra(InfraError::Application(e)) => e.exit_code(),
            CliError::Infra(_) => exitcode::UNEXPECTED,
        }
    }

    /// Correlation id of a classified outbound failure.
    pub fn correlation_id(&self) -> Option<&str> {
        match self {
            CliError::Infra(InfraError::Application(e)) => e.correlation_id(),
            _ => None,
        }
    }
}

impl From<crate::application::ApplicationError> for CliError {
    fn from(e: crate::application::ApplicationError) -> Self {
        CliError::Infra(InfraError::Application(e))
    }
}
