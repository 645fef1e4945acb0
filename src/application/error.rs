//! Application-level errors (wraps domain errors)

use thiserror::Error;

use crate::domain::DomainError;
use crate::exitcode;
use crate::infrastructure::http::HttpError;

/// Application errors wrap domain errors and add application-level context.
#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error("{0}")]
    Domain(#[from] DomainError),

    /// Classified outbound-call failure.
    #[error("{0}")]
    Http(#[from] HttpError),

    /// The provider answered but reported a failure of its own.
    #[error("{message}")]
    Provider { message: String },

    /// A successful response could not be turned into domain values.
    #[error("failed to parse provider response: {message}")]
    Mapping { message: String },

    #[error("failed to render configuration: {0}")]
    Render(#[from] toml::ser::Error),
}

impl ApplicationError {
    pub fn exit_code(&self) -> i32 {
        match self {
            ApplicationError::Http(e) => e.exit_code(),
            ApplicationError::Provider { .. } => exitcode::NETWORK_OR_TIMEOUT,
            ApplicationError::Domain(_)
            | ApplicationError::Mapping { .. }
            | ApplicationError::Render(_) => exitcode::UNEXPECTED,
        }
    }

    pub fn correlation_id(&self) -> Option<&str> {
        match self {
            ApplicationError::Http(e) => Some(e.correlation_id()),
            _ => None,
        }
    }
}

/// Result type for application layer operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;
